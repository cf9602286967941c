//! Script generation through an OpenAI-compatible chat completions endpoint.

use super::sanitize_script;
use crate::config::{Prompts, ScriptSettings};
use crate::error::{PodforgeError, Result};
use crate::http::{create_client_with_timeout, require_key};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Two attempts in total: the first request and one retry after a 429.
const MAX_ATTEMPTS: u32 = 2;

/// Trait for services that write a dialogue script.
#[async_trait]
pub trait ScriptGenerator: Send + Sync {
    /// Produce sanitized script text for `topic` from `context`.
    async fn generate(&self, topic: &str, context: &str) -> Result<String>;
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completion backed script generator.
pub struct ChatScriptGenerator {
    client: reqwest::Client,
    settings: ScriptSettings,
    prompts: Prompts,
}

impl ChatScriptGenerator {
    /// Create a generator from script settings and prompts.
    pub fn new(settings: &ScriptSettings, prompts: Prompts) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(Duration::from_secs(settings.timeout_secs))?,
            settings: settings.clone(),
            prompts,
        })
    }

    fn build_request(&self, topic: &str, context: &str) -> Result<CreateChatCompletionRequest> {
        let mut vars = HashMap::new();
        vars.insert("topic".to_string(), topic.to_string());
        vars.insert("context".to_string(), context.to_string());
        let build_err = |e: async_openai::error::OpenAIError| PodforgeError::Config(e.to_string());

        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.prompts.render_with_custom(&self.prompts.script.system, &vars))
                .build()
                .map_err(build_err)?
                .into(),
        ];

        if !context.is_empty() {
            messages.push(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(self.prompts.render_with_custom(&self.prompts.script.context, &vars))
                    .build()
                    .map_err(build_err)?
                    .into(),
            );
        }

        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(self.prompts.render_with_custom(&self.prompts.script.user, &vars))
                .build()
                .map_err(build_err)?
                .into(),
        );

        CreateChatCompletionRequestArgs::default()
            .model(&self.settings.model)
            .messages(messages)
            .temperature(self.settings.temperature)
            .build()
            .map_err(build_err)
    }

    /// Send the request, retrying once on 429. Returns the last response as-is.
    async fn send(
        &self,
        api_key: &str,
        request: &CreateChatCompletionRequest,
    ) -> Result<reqwest::Response> {
        let default_wait = Duration::from_secs(self.settings.default_retry_after_secs);
        let mut attempt = 1;

        loop {
            info!("Sending script request (attempt {})", attempt);
            let response = self
                .client
                .post(&self.settings.endpoint)
                .bearer_auth(api_key)
                .json(request)
                .send()
                .await
                .map_err(|e| PodforgeError::Generation(format!("request: {}", e)))?;

            if response.status() != StatusCode::TOO_MANY_REQUESTS || attempt >= MAX_ATTEMPTS {
                return Ok(response);
            }

            let hint = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok());
            let wait = retry_after_delay(hint, default_wait);
            warn!("Rate limited (429), retrying after {}s", wait.as_secs());
            tokio::time::sleep(wait).await;
            attempt += 1;
        }
    }
}

#[async_trait]
impl ScriptGenerator for ChatScriptGenerator {
    #[instrument(skip(self, context), fields(context_len = context.len()))]
    async fn generate(&self, topic: &str, context: &str) -> Result<String> {
        let api_key = require_key(self.settings.api_key.as_deref(), "GROQ_API_KEY")?;
        let request = self.build_request(topic, context)?;
        debug!("Script payload has {} messages", request.messages.len());

        let response = self.send(api_key, &request).await?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PodforgeError::Generation(format!("response body: {}", e)))?;

        if !status.is_success() {
            return Err(PodforgeError::GenerationStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            PodforgeError::EmptyScript(format!("unparseable response ({}): {}", e, body))
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                PodforgeError::EmptyScript(format!("no choices in response: {}", body))
            })?;

        Ok(sanitize_script(&content))
    }
}

/// Wait requested by a `Retry-After` header in whole seconds, or `default` when
/// the header is missing or not an integer.
pub fn retry_after_delay(header: Option<&str>, default: Duration) -> Duration {
    header
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_support::serve;
    use axum::{
        extract::State,
        http::{header, HeaderMap, StatusCode},
        response::{IntoResponse, Response},
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    fn completion(content: &str) -> Value {
        json!({ "choices": [ { "message": { "role": "assistant", "content": content } } ] })
    }

    async fn generator_for(router: Router, api_key: Option<&str>) -> ChatScriptGenerator {
        let base = serve(router).await;
        let settings = ScriptSettings {
            endpoint: format!("{}/v1/chat/completions", base),
            api_key: api_key.map(str::to_string),
            default_retry_after_secs: 0,
            ..ScriptSettings::default()
        };
        ChatScriptGenerator::new(&settings, Prompts::default()).unwrap()
    }

    #[test]
    fn test_retry_after_delay() {
        let default = Duration::from_secs(5);
        assert_eq!(retry_after_delay(Some("3"), default), Duration::from_secs(3));
        assert_eq!(retry_after_delay(Some(" 0 "), default), Duration::ZERO);
        assert_eq!(retry_after_delay(None, default), default);
        assert_eq!(
            retry_after_delay(Some("Wed, 21 Oct 2015 07:28:00 GMT"), default),
            default
        );
    }

    #[tokio::test]
    async fn test_generate_sends_prompt_and_sanitizes() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers[header::AUTHORIZATION], "Bearer gsk-test");
                assert_eq!(body["model"], "llama-3.1-8b-instant");
                assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);

                let messages = body["messages"].as_array().unwrap();
                assert_eq!(messages.len(), 3);
                assert_eq!(messages[0]["role"], "system");
                assert!(messages[0]["content"].as_str().unwrap().contains("'Host:'"));
                assert_eq!(messages[1]["content"], "Context: Black holes warp spacetime...");
                assert_eq!(messages[2]["role"], "user");
                assert!(messages[2]["content"].as_str().unwrap().contains("'black holes'"));

                Json(completion("**Host:** Welcome!\n<b>**Guest:**</b> Hi."))
            }),
        );
        let generator = generator_for(router, Some("gsk-test")).await;

        let script = generator
            .generate("black holes", "Black holes warp spacetime...")
            .await
            .unwrap();
        assert_eq!(script, "Host: Welcome!\nGuest: Hi.");
    }

    #[tokio::test]
    async fn test_empty_context_omits_context_message() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["messages"].as_array().unwrap().len(), 2);
                Json(completion("Host: Hi."))
            }),
        );
        let generator = generator_for(router, Some("k")).await;
        assert_eq!(generator.generate("t", "").await.unwrap(), "Host: Hi.");
    }

    async fn rate_limited_then(
        State((calls, limited)): State<(Arc<AtomicUsize>, usize)>,
    ) -> Response {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        if n < limited {
            (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, if limited == 1 { "1" } else { "0" })],
                "rate limit exceeded",
            )
                .into_response()
        } else {
            Json(completion("Host: Second time lucky.")).into_response()
        }
    }

    #[tokio::test]
    async fn test_retries_once_after_retry_after() {
        let calls = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route("/v1/chat/completions", post(rate_limited_then))
            .with_state((calls.clone(), 1));
        let generator = generator_for(router, Some("k")).await;

        let started = Instant::now();
        let script = generator.generate("t", "c").await.unwrap();

        assert_eq!(script, "Host: Second time lucky.");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() >= Duration::from_millis(950));
    }

    #[tokio::test]
    async fn test_second_rate_limit_is_returned_without_third_attempt() {
        let calls = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route("/v1/chat/completions", post(rate_limited_then))
            .with_state((calls.clone(), usize::MAX));
        let generator = generator_for(router, Some("k")).await;

        let err = generator.generate("t", "c").await.unwrap_err();
        match &err {
            PodforgeError::GenerationStatus { status, body } => {
                assert_eq!(*status, 429);
                assert_eq!(body, "rate limit exceeded");
            }
            other => panic!("expected GenerationStatus, got {:?}", other),
        }
        assert!(err.is_rate_limited());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_choices_is_error() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { Json(json!({ "choices": [] })) }),
        );
        let generator = generator_for(router, Some("k")).await;

        let err = generator.generate("t", "c").await.unwrap_err();
        assert!(matches!(err, PodforgeError::EmptyScript(_)));
        assert_eq!(err.stage(), "generation");
    }

    #[tokio::test]
    async fn test_upstream_error_carries_status_and_body() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::UNAUTHORIZED, "invalid api key") }),
        );
        let generator = generator_for(router, Some("k")).await;

        let err = generator.generate("t", "c").await.unwrap_err();
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("invalid api key"));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_request() {
        let calls = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route("/v1/chat/completions", post(rate_limited_then))
            .with_state((calls.clone(), 0));
        let generator = generator_for(router, None).await;

        let err = generator.generate("t", "c").await.unwrap_err();
        assert!(matches!(err, PodforgeError::Config(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transient() {
        // Bind and drop to get a port nothing listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let settings = ScriptSettings {
            endpoint: format!("http://{}/v1/chat/completions", addr),
            api_key: Some("k".to_string()),
            ..ScriptSettings::default()
        };
        let generator = ChatScriptGenerator::new(&settings, Prompts::default()).unwrap();

        let err = generator.generate("t", "c").await.unwrap_err();
        assert!(matches!(err, PodforgeError::Generation(_)));
        assert_eq!(err.kind(), ErrorKind::Transient);
        assert_eq!(err.stage(), "generation");
    }
}
