//! Finish command implementation.

use super::write_track;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use anyhow::Result;

/// Run the finish command against an existing collection.
pub async fn run_finish(
    topic: &str,
    collection: &str,
    output: &str,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Produce, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let pipeline = Pipeline::new(settings)?;

    let spinner = Output::spinner(&format!("Producing podcast from collection {}...", collection));
    let result = pipeline.finish_podcast(topic, collection).await;
    spinner.finish_and_clear();

    let podcast = result?;
    write_track(output, &podcast.track.wav)?;
    Output::podcast_summary(&podcast, output);
    Output::success(&format!("Wrote {}", output));
    Ok(())
}
