//! CLI module for podforge.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// podforge - two-voice podcasts from your documents
///
/// Retrieves context for a topic, has a language model write a Host/Guest
/// dialogue, voices every line and stitches the result into one WAV file.
#[derive(Parser, Debug)]
#[command(name = "podforge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Produce a podcast from a single document in one go
    Instant {
        /// Topic of the episode
        topic: String,

        /// Text file with the source document
        #[arg(short, long)]
        document: String,

        /// Where to write the WAV file
        #[arg(short, long, default_value = "podcast.wav")]
        output: String,
    },

    /// Create a collection for a podcast that will be finished later
    Create {
        /// Topic of the episode
        topic: String,

        /// Collection id (a random one is generated if omitted)
        #[arg(long)]
        collection: Option<String>,
    },

    /// Add a document to an existing collection
    Upload {
        /// Collection id
        collection: String,

        /// Text file with the document
        document: String,
    },

    /// Produce the podcast for an existing collection
    Finish {
        /// Topic of the episode
        topic: String,

        /// Collection id
        #[arg(long)]
        collection: String,

        /// Where to write the WAV file
        #[arg(short, long, default_value = "podcast.wav")]
        output: String,
    },

    /// Start HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port, or PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the current configuration to the config file
    Init,

    /// Show configuration file path
    Path,
}
