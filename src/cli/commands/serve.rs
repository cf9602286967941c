//! HTTP API server for integration with other systems.
//!
//! Exposes the collection lifecycle and podcast production as JSON endpoints.
//! Finished podcasts are returned as `audio/wav` bodies.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::PodforgeError;
use crate::pipeline::{PodcastOutput, Pipeline};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use uuid::Uuid;

/// Shared application state.
struct AppState {
    pipeline: Pipeline,
}

/// Run the HTTP API server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    settings: Settings,
) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);

    if settings.script.api_key.is_none() || settings.speech.api_key.is_none() {
        Output::warning("GROQ_API_KEY or OPENAI_API_KEY is not set; podcast endpoints will fail.");
    }

    let pipeline = Pipeline::new(settings)?;
    let app = router(pipeline);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("podforge API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Upload", "POST /upload-document");
    Output::kv("Create", "POST /create-podcast");
    Output::kv("Finish", "POST /finish-podcast");
    Output::kv("Instant", "POST /instant-podcast");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the API router around a pipeline.
fn router(pipeline: Pipeline) -> Router {
    let state = Arc::new(AppState { pipeline });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/upload-document", post(upload_document))
        .route("/create-podcast", post(create_podcast))
        .route("/finish-podcast", post(finish_podcast))
        .route("/instant-podcast", post(instant_podcast))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct UploadRequest {
    collection: String,
    document: String,
}

#[derive(Deserialize)]
struct CreateRequest {
    topic: String,
    /// Generated when omitted.
    #[serde(default)]
    collection: Option<String>,
}

#[derive(Serialize)]
struct CreateResponse {
    collection: String,
}

#[derive(Deserialize)]
struct FinishRequest {
    topic: String,
    collection: String,
}

#[derive(Deserialize)]
struct InstantRequest {
    topic: String,
    document: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    stage: &'static str,
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn upload_document(
    State(state): State<Arc<AppState>>,
    body: JsonBody<UploadRequest>,
) -> Response {
    let req = match parse_body(body) {
        Ok(req) => req,
        Err(response) => return response,
    };
    match state.pipeline.upload_document(&req.collection, &req.document).await {
        Ok(()) => Json(serde_json::json!({ "status": "ok" })).into_response(),
        Err(e) => error_response(e),
    }
}

async fn create_podcast(
    State(state): State<Arc<AppState>>,
    body: JsonBody<CreateRequest>,
) -> Response {
    let req = match parse_body(body) {
        Ok(req) => req,
        Err(response) => return response,
    };
    let collection = req.collection.unwrap_or_else(|| Uuid::new_v4().to_string());
    match state.pipeline.create_podcast(&req.topic, &collection).await {
        Ok(()) => Json(CreateResponse { collection }).into_response(),
        Err(e) => error_response(e),
    }
}

async fn finish_podcast(
    State(state): State<Arc<AppState>>,
    body: JsonBody<FinishRequest>,
) -> Response {
    let req = match parse_body(body) {
        Ok(req) => req,
        Err(response) => return response,
    };
    match state.pipeline.finish_podcast(&req.topic, &req.collection).await {
        Ok(output) => wav_response(output),
        Err(e) => error_response(e),
    }
}

async fn instant_podcast(
    State(state): State<Arc<AppState>>,
    body: JsonBody<InstantRequest>,
) -> Response {
    let req = match parse_body(body) {
        Ok(req) => req,
        Err(response) => return response,
    };
    match state.pipeline.instant_podcast(&req.topic, &req.document).await {
        Ok(output) => wav_response(output),
        Err(e) => error_response(e),
    }
}

/// A JSON body whose rejection is answered with the API's own error format.
type JsonBody<T> = Result<Json<T>, JsonRejection>;

fn parse_body<T>(body: JsonBody<T>) -> Result<T, Response> {
    body.map(|Json(req)| req)
        .map_err(|rejection| error_response(PodforgeError::InvalidInput(rejection.body_text())))
}

fn wav_response(output: PodcastOutput) -> Response {
    info!(
        "Returning {} bytes ({} segments, {} skipped)",
        output.track.wav.len(),
        output.track.segments.len(),
        output.skipped.len()
    );
    (
        [
            (header::CONTENT_TYPE, "audio/wav".to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"podcast.wav\"".to_string(),
            ),
            (
                header::HeaderName::from_static("x-skipped-lines"),
                output.skipped.len().to_string(),
            ),
        ],
        output.track.wav,
    )
        .into_response()
}

fn status_for(err: &PodforgeError) -> StatusCode {
    match err {
        PodforgeError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        PodforgeError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        PodforgeError::Retrieval(_)
        | PodforgeError::RetrievalStatus { .. }
        | PodforgeError::Knowledge(_)
        | PodforgeError::KnowledgeStatus { .. }
        | PodforgeError::Generation(_)
        | PodforgeError::GenerationStatus { .. }
        | PodforgeError::EmptyScript(_)
        | PodforgeError::Speech(_)
        | PodforgeError::SpeechStatus { .. }
        | PodforgeError::Synthesis { .. }
        | PodforgeError::Http(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: PodforgeError) -> Response {
    let status = status_for(&err);
    warn!("Request failed ({}): {}", status, err);
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            stage: err.stage(),
        }),
    )
        .into_response()
}
