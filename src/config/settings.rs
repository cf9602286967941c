//! Configuration settings for podforge.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub knowledge: KnowledgeSettings,
    pub script: ScriptSettings,
    pub speech: SpeechSettings,
    pub pipeline: PipelineSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Knowledge service (context lookup and collection lifecycle).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeSettings {
    /// Base URL of the knowledge service.
    pub endpoint: String,
    /// Maximum number of context characters handed to the script generator.
    pub max_context_chars: usize,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for KnowledgeSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080".to_string(),
            max_context_chars: 2000,
            timeout_secs: 30,
        }
    }
}

/// Script generation (chat completion) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptSettings {
    /// Chat completions URL (OpenAI-compatible).
    pub endpoint: String,
    /// Model used to write the dialogue.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// API key. Usually supplied through GROQ_API_KEY.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Wait applied on a 429 without a usable Retry-After header.
    pub default_retry_after_secs: u64,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ScriptSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            temperature: 0.7,
            api_key: None,
            default_retry_after_secs: 5,
            timeout_secs: 30,
        }
    }
}

/// Speech synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    /// Speech URL (OpenAI-compatible).
    pub endpoint: String,
    /// TTS model.
    pub model: String,
    /// Voice used for Host lines.
    pub host_voice: String,
    /// Voice used for Guest lines.
    pub guest_voice: String,
    /// API key. Usually supplied through OPENAI_API_KEY.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Maximum synthesis requests in flight.
    pub max_concurrent: usize,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/audio/speech".to_string(),
            model: "gpt-4o-mini-tts".to_string(),
            host_voice: "alloy".to_string(),
            guest_voice: "echo".to_string(),
            api_key: None,
            max_concurrent: 4,
            timeout_secs: 30,
        }
    }
}

/// Whole-run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Overall deadline for one podcast run, in seconds.
    pub deadline_secs: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self { deadline_secs: 300 }
    }
}

/// HTTP API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8100,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Overlay values taken from the process environment.
    ///
    /// Called once at startup; components never read the environment themselves.
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("GROQ_API_KEY") {
            self.script.api_key = Some(key);
        }
        if let Some(key) = non_empty("OPENAI_API_KEY") {
            self.speech.api_key = Some(key);
        }
        // KNOWLEDGE_ENDPOINT wins over the older CHISEL_ENDPOINT name.
        let knowledge_endpoint =
            non_empty("KNOWLEDGE_ENDPOINT").or_else(|| non_empty("CHISEL_ENDPOINT"));
        if let Some(endpoint) = knowledge_endpoint {
            self.knowledge.endpoint = endpoint;
        }
        if let Some(port) = non_empty("PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
    }

    /// Check endpoints and limits before any work starts.
    pub fn validate(&self) -> crate::error::Result<()> {
        for (name, endpoint) in [
            ("knowledge.endpoint", &self.knowledge.endpoint),
            ("script.endpoint", &self.script.endpoint),
            ("speech.endpoint", &self.speech.endpoint),
        ] {
            url::Url::parse(endpoint).map_err(|e| {
                crate::error::PodforgeError::Config(format!("{} '{}': {}", name, endpoint, e))
            })?;
        }
        if self.speech.max_concurrent == 0 {
            return Err(crate::error::PodforgeError::Config(
                "speech.max_concurrent must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::PodforgeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("podforge")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Overall deadline for one run.
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.pipeline.deadline_secs)
    }
}
