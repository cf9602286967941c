//! Dialogue scripts: generation, sanitization, and parsing into voiced lines.

mod generator;
mod parser;
mod sanitize;

pub use generator::{retry_after_delay, ChatScriptGenerator, ScriptGenerator};
pub use parser::parse_script;
pub use sanitize::sanitize_script;

use crate::config::SpeechSettings;
use serde::{Deserialize, Serialize};

/// One of the two fixed podcast speakers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Host,
    Guest,
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Speaker::Host => write!(f, "Host"),
            Speaker::Guest => write!(f, "Guest"),
        }
    }
}

/// Static speaker to voice assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceMap {
    pub host: String,
    pub guest: String,
}

impl VoiceMap {
    pub fn new(host: impl Into<String>, guest: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            guest: guest.into(),
        }
    }

    /// Voice identity for a speaker.
    pub fn voice_for(&self, speaker: Speaker) -> &str {
        match speaker {
            Speaker::Host => &self.host,
            Speaker::Guest => &self.guest,
        }
    }
}

impl From<&SpeechSettings> for VoiceMap {
    fn from(settings: &SpeechSettings) -> Self {
        Self::new(settings.host_voice.clone(), settings.guest_voice.clone())
    }
}

/// A recognized dialogue line with its assigned voice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Line {
    /// Position among recognized lines, starting at 0.
    pub index: usize,
    pub speaker: Speaker,
    pub voice: String,
    /// Spoken text. May be empty.
    pub utterance: String,
}

/// Result of parsing a script.
#[derive(Debug, Clone, Default)]
pub struct ParsedScript {
    /// Recognized lines in script order.
    pub lines: Vec<Line>,
    /// Non-blank lines without a speaker label.
    pub discarded: usize,
}

impl ParsedScript {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
