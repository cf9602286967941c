//! Speech synthesis for dialogue lines.
//!
//! Lines are synthesized concurrently up to a fixed limit. A failed line is logged
//! and skipped; only a run that yields no audio at all is an error.

mod openai;

pub use openai::OpenAiSpeech;

use crate::audio::AudioClip;
use crate::error::{PodforgeError, Result};
use crate::script::Line;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use tokio::time::Instant;
use tracing::{info, instrument, warn};

/// Trait for text-to-speech services.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` with `voice`, returning compressed audio bytes.
    async fn synthesize(&self, voice: &str, text: &str) -> Result<Vec<u8>>;

    /// Fail fast when the synthesizer cannot work at all (e.g. missing credentials).
    fn ensure_ready(&self) -> Result<()> {
        Ok(())
    }
}

/// Why a line produced no clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Nothing to say; no request was made.
    EmptyUtterance,
    /// The synthesis request failed.
    Failed(String),
    /// The run deadline passed before the request settled.
    DeadlineExceeded,
}

/// A line that was not synthesized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    pub index: usize,
    pub reason: SkipReason,
}

/// Clips that were produced, in line order, and the lines that were not.
#[derive(Debug, Default)]
pub struct SynthesisReport {
    pub clips: Vec<AudioClip>,
    pub skipped: Vec<SkippedLine>,
}

impl SynthesisReport {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Outcome of synthesizing a script.
///
/// Losing some lines is tolerated; losing all of them is not.
#[derive(Debug)]
pub enum SynthesisOutcome {
    /// At least one clip exists. Some lines may be missing.
    PartialSuccess(SynthesisReport),
    /// Nothing usable was produced.
    Fatal(PodforgeError),
}

impl SynthesisOutcome {
    /// Collapse into a `Result` for callers that only care about the fatal case.
    pub fn into_result(self) -> Result<SynthesisReport> {
        match self {
            SynthesisOutcome::PartialSuccess(report) => Ok(report),
            SynthesisOutcome::Fatal(err) => Err(err),
        }
    }
}

/// Synthesize every line with at most `max_concurrent` requests in flight.
///
/// When `deadline` passes, in-flight requests are dropped and their lines are
/// reported as skipped. Clips come back sorted by line index.
#[instrument(skip(synth, lines), fields(lines = lines.len()))]
pub async fn synthesize_lines(
    synth: &dyn SpeechSynthesizer,
    lines: &[Line],
    max_concurrent: usize,
    deadline: Option<Instant>,
) -> SynthesisOutcome {
    if let Err(e) = synth.ensure_ready() {
        return SynthesisOutcome::Fatal(e);
    }

    let mut skipped = Vec::new();
    // Owned (index, voice, text) jobs keep the stream future `Send`.
    let mut jobs: Vec<(usize, String, String)> = Vec::new();
    for line in lines {
        if line.utterance.is_empty() {
            skipped.push(SkippedLine {
                index: line.index,
                reason: SkipReason::EmptyUtterance,
            });
        } else {
            jobs.push((line.index, line.voice.clone(), line.utterance.clone()));
        }
    }

    info!(
        "Synthesizing {} lines ({} at a time)",
        jobs.len(),
        max_concurrent
    );

    let indices: Vec<usize> = jobs.iter().map(|(index, _, _)| *index).collect();
    let mut settled = HashSet::new();
    let mut clips = Vec::with_capacity(jobs.len());

    let mut results = stream::iter(jobs)
        .map(|(index, voice, text)| async move {
            let result = synth.synthesize(&voice, &text).await;
            (index, result)
        })
        .buffer_unordered(max_concurrent.max(1));

    loop {
        let next = match deadline {
            Some(at) => match tokio::time::timeout_at(at, results.next()).await {
                Ok(next) => next,
                Err(_) => {
                    warn!(
                        "Deadline reached with {} lines in flight",
                        indices.len() - settled.len()
                    );
                    break;
                }
            },
            None => results.next().await,
        };

        let Some((index, result)) = next else { break };
        settled.insert(index);
        match result {
            Ok(bytes) => clips.push(AudioClip::new(index, bytes)),
            Err(e) => {
                warn!("Skipping line {}: {}", index, e);
                skipped.push(SkippedLine {
                    index,
                    reason: SkipReason::Failed(e.to_string()),
                });
            }
        }
    }
    drop(results);

    skipped.extend(
        indices
            .into_iter()
            .filter(|i| !settled.contains(i))
            .map(|index| SkippedLine {
                index,
                reason: SkipReason::DeadlineExceeded,
            }),
    );

    clips.sort_by_key(|c| c.index);
    skipped.sort_by_key(|s| s.index);

    if clips.is_empty() {
        return SynthesisOutcome::Fatal(PodforgeError::Synthesis {
            attempted: lines.len(),
            skipped: skipped.len(),
        });
    }

    info!("Synthesized {} clips, skipped {}", clips.len(), skipped.len());
    SynthesisOutcome::PartialSuccess(SynthesisReport { clips, skipped })
}
