//! podforge - two-voice podcasts from documents
//!
//! Turns a topic and a collection of documents into a spoken dialogue between
//! a Host and a Guest, delivered as a single WAV file.
//!
//! # Overview
//!
//! A run goes through five stages, strictly one after the other:
//!
//! 1. Context retrieval from a knowledge store, capped to a character budget
//! 2. Script generation through an OpenAI-compatible chat endpoint
//! 3. Parsing into labelled lines with a voice per speaker
//! 4. Speech synthesis per line, concurrently and tolerant of single failures
//! 5. Decoding, ordered concatenation and WAV encoding
//!
//! # Architecture
//!
//! - `config` - Configuration and prompt templates
//! - `knowledge` - Knowledge store abstraction (HTTP service, in-memory)
//! - `context` - Bounded context retrieval
//! - `script` - Script generation, sanitization and parsing
//! - `speech` - Text-to-speech and the concurrent synthesis driver
//! - `audio` - Clip decoding and track assembly
//! - `pipeline` - Stage coordination under one deadline
//!
//! # Example
//!
//! ```rust,no_run
//! use podforge::config::Settings;
//! use podforge::pipeline::Pipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut settings = Settings::load()?;
//!     settings.apply_env();
//!     let pipeline = Pipeline::new(settings)?;
//!
//!     let podcast = pipeline
//!         .instant_podcast("black holes", "Black holes warp spacetime...")
//!         .await?;
//!     std::fs::write("podcast.wav", &podcast.track.wav)?;
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod knowledge;
pub mod pipeline;
pub mod script;
pub mod speech;

#[cfg(test)]
mod test_support;

pub use error::{PodforgeError, Result};
