//! OpenAI-compatible speech endpoint.

use super::SpeechSynthesizer;
use crate::config::SpeechSettings;
use crate::error::{PodforgeError, Result};
use crate::http::{create_client_with_timeout, require_key};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
}

/// Speech synthesizer posting `{model, input, voice}` and returning the audio body.
pub struct OpenAiSpeech {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiSpeech {
    /// Create a synthesizer from speech settings.
    pub fn new(settings: &SpeechSettings) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(Duration::from_secs(settings.timeout_secs))?,
            endpoint: settings.endpoint.clone(),
            model: settings.model.clone(),
            api_key: settings.api_key.clone(),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeech {
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    async fn synthesize(&self, voice: &str, text: &str) -> Result<Vec<u8>> {
        let api_key = require_key(self.api_key.as_deref(), "OPENAI_API_KEY")?;

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&SpeechRequest {
                model: &self.model,
                input: text,
                voice,
            })
            .send()
            .await
            .map_err(|e| PodforgeError::Speech(format!("request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PodforgeError::SpeechStatus {
                status: status.as_u16(),
                body,
            });
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| PodforgeError::Speech(format!("response body: {}", e)))?;
        debug!("Received {} bytes of audio", audio.len());
        Ok(audio.to_vec())
    }

    fn ensure_ready(&self) -> Result<()> {
        require_key(self.api_key.as_deref(), "OPENAI_API_KEY").map(|_| ())
    }
}
