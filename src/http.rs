//! HTTP client construction shared by every upstream service.

use crate::error::{PodforgeError, Result};
use std::time::Duration;
use url::Url;

/// Create an HTTP client with a custom timeout.
pub fn create_client_with_timeout(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| PodforgeError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Join a route onto a service base URL, keeping any path prefix on the base.
pub fn endpoint_url(base: &str, route: &str) -> Result<Url> {
    let mut base = Url::parse(base)
        .map_err(|e| PodforgeError::Config(format!("Invalid endpoint '{}': {}", base, e)))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(route.trim_start_matches('/'))
        .map_err(|e| PodforgeError::Config(format!("Invalid route '{}': {}", route, e)))
}

/// Resolve an optional credential, failing fast when it is missing.
pub fn require_key<'a>(key: Option<&'a str>, env_hint: &str) -> Result<&'a str> {
    match key {
        Some(k) if !k.trim().is_empty() => Ok(k),
        _ => Err(PodforgeError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            env_hint, env_hint
        ))),
    }
}
