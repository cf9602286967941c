//! Collection commands: create and upload.

use super::read_document;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use anyhow::Result;
use uuid::Uuid;

/// Run the create command. Prints the collection id to use with `upload` and `finish`.
pub async fn run_create(topic: &str, collection: Option<String>, settings: Settings) -> Result<()> {
    preflight::check(Operation::Collection, &settings)?;

    let collection = collection.unwrap_or_else(|| Uuid::new_v4().to_string());
    let pipeline = Pipeline::new(settings)?;
    pipeline.create_podcast(topic, &collection).await?;

    Output::success(&format!("Created collection for '{}'", topic));
    Output::kv("Collection", &collection);
    Output::info(&format!(
        "Next: podforge upload {} <file>, then podforge finish \"{}\" --collection {}",
        collection, topic, collection
    ));
    Ok(())
}

/// Run the upload command.
pub async fn run_upload(collection: &str, document: &str, settings: Settings) -> Result<()> {
    preflight::check(Operation::Collection, &settings)?;

    let text = read_document(document)?;
    let pipeline = Pipeline::new(settings)?;
    pipeline.upload_document(collection, &text).await?;

    Output::success(&format!(
        "Uploaded {} ({} chars) to {}",
        document,
        text.chars().count(),
        collection
    ));
    Ok(())
}
