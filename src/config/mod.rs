//! Configuration module for podforge.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, ScriptPrompts};
pub use settings::{
    GeneralSettings, KnowledgeSettings, PipelineSettings, PromptSettings, ScriptSettings,
    ServerSettings, Settings, SpeechSettings,
};
