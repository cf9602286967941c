//! Pre-flight checks before expensive operations.
//!
//! Validates that credentials are configured before starting a run that would
//! otherwise fail after the knowledge service has already been touched.

use crate::config::Settings;
use crate::error::Result;
use crate::http::require_key;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Collection management only talks to the knowledge service.
    Collection,
    /// Producing audio needs both the script and the speech credentials.
    Produce,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Collection => {}
        Operation::Produce => {
            require_key(settings.script.api_key.as_deref(), "GROQ_API_KEY")?;
            require_key(settings.speech.api_key.as_deref(), "OPENAI_API_KEY")?;
        }
    }
    Ok(())
}
