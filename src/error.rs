//! Error types for podforge.

use thiserror::Error;

/// Library-level error type for podforge operations.
#[derive(Error, Debug)]
pub enum PodforgeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Context retrieval failed: {0}")]
    Retrieval(String),

    #[error("Context service returned {status}: {body}")]
    RetrievalStatus { status: u16, body: String },

    #[error("Knowledge service request failed: {0}")]
    Knowledge(String),

    #[error("Knowledge service {route} returned {status}: {body}")]
    KnowledgeStatus {
        route: &'static str,
        status: u16,
        body: String,
    },

    #[error("Script generation failed: {0}")]
    Generation(String),

    #[error("Script service returned {status}: {body}")]
    GenerationStatus { status: u16, body: String },

    #[error("Script service returned no usable script: {0}")]
    EmptyScript(String),

    #[error("Speech synthesis request failed: {0}")]
    Speech(String),

    #[error("Speech service returned {status}: {body}")]
    SpeechStatus { status: u16, body: String },

    #[error("Speech synthesis produced no audio ({skipped} of {attempted} lines skipped)")]
    Synthesis { attempted: usize, skipped: usize },

    #[error("Failed to decode clip {index}: {reason}")]
    Decode { index: usize, reason: String },

    #[error("Audio assembly failed: {0}")]
    Assembly(String),

    #[error("Deadline exceeded during {0}")]
    Timeout(&'static str),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Broad classification of a failure, for callers deciding what to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or rejected credentials, bad endpoints, unreadable config.
    Configuration,
    /// Network errors, rate limiting, upstream 5xx, deadlines.
    Transient,
    /// Empty scripts, zero clips, corrupt audio, rejected requests.
    Data,
}

impl PodforgeError {
    /// Name of the pipeline stage the error belongs to.
    ///
    /// Collection management (create, upload, delete) reports "knowledge".
    pub fn stage(&self) -> &'static str {
        match self {
            PodforgeError::Config(_) | PodforgeError::TomlParse(_) => "config",
            PodforgeError::Retrieval(_) | PodforgeError::RetrievalStatus { .. } => "retrieval",
            PodforgeError::Knowledge(_) | PodforgeError::KnowledgeStatus { .. } => "knowledge",
            PodforgeError::Generation(_)
            | PodforgeError::GenerationStatus { .. }
            | PodforgeError::EmptyScript(_) => "generation",
            PodforgeError::Speech(_)
            | PodforgeError::SpeechStatus { .. }
            | PodforgeError::Synthesis { .. } => "synthesis",
            PodforgeError::Decode { .. } | PodforgeError::Assembly(_) => "assembly",
            PodforgeError::Timeout(stage) => stage,
            PodforgeError::InvalidInput(_) => "input",
            PodforgeError::Io(_) | PodforgeError::Json(_) | PodforgeError::Http(_) => "io",
        }
    }

    /// Classify the error as a configuration, transient, or data problem.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PodforgeError::Config(_) | PodforgeError::TomlParse(_) => ErrorKind::Configuration,
            PodforgeError::RetrievalStatus { status, .. }
            | PodforgeError::KnowledgeStatus { status, .. }
            | PodforgeError::GenerationStatus { status, .. }
            | PodforgeError::SpeechStatus { status, .. } => classify_status(*status),
            PodforgeError::Retrieval(_)
            | PodforgeError::Knowledge(_)
            | PodforgeError::Speech(_)
            | PodforgeError::Generation(_)
            | PodforgeError::Timeout(_)
            | PodforgeError::Http(_)
            | PodforgeError::Io(_) => ErrorKind::Transient,
            PodforgeError::EmptyScript(_)
            | PodforgeError::Synthesis { .. }
            | PodforgeError::Decode { .. }
            | PodforgeError::Assembly(_)
            | PodforgeError::InvalidInput(_)
            | PodforgeError::Json(_) => ErrorKind::Data,
        }
    }

    /// Whether the upstream rejected the request for rate limiting.
    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            PodforgeError::RetrievalStatus { status: 429, .. }
                | PodforgeError::GenerationStatus { status: 429, .. }
        )
    }
}

fn classify_status(status: u16) -> ErrorKind {
    match status {
        401 | 403 => ErrorKind::Configuration,
        429 | 500..=599 => ErrorKind::Transient,
        _ => ErrorKind::Data,
    }
}

/// Result type alias for podforge operations.
pub type Result<T> = std::result::Result<T, PodforgeError>;
