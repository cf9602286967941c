//! CLI command implementations.

mod collection;
mod config;
mod finish;
mod instant;
mod serve;

pub use collection::{run_create, run_upload};
pub use config::run_config;
pub use finish::run_finish;
pub use instant::run_instant;
pub use serve::run_serve;

use anyhow::{Context, Result};
use crate::config::Settings;

/// Read a document file, with `~` expanded.
fn read_document(path: &str) -> Result<String> {
    let path = Settings::expand_path(path);
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read document {}", path.display()))?;
    if text.trim().is_empty() {
        anyhow::bail!("Document {} is empty", path.display());
    }
    Ok(text)
}

/// Write the finished WAV track, creating parent directories.
fn write_track(path: &str, wav: &[u8]) -> Result<()> {
    let path = Settings::expand_path(path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, wav).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
