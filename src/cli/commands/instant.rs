//! Instant command implementation.

use super::{read_document, write_track};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use anyhow::Result;

/// Run the instant command: ingest, produce and clean up in one go.
pub async fn run_instant(
    topic: &str,
    document: &str,
    output: &str,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Produce, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let text = read_document(document)?;
    let pipeline = Pipeline::new(settings)?;

    let spinner = Output::spinner(&format!("Producing podcast about '{}'...", topic));
    let result = pipeline.instant_podcast(topic, &text).await;
    spinner.finish_and_clear();

    let podcast = result?;
    write_track(output, &podcast.track.wav)?;
    Output::podcast_summary(&podcast, output);
    Output::success(&format!("Wrote {}", output));
    Ok(())
}
