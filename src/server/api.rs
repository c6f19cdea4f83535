use axum::{
    Json,
    Router,
    extract::{ ConnectInfo, DefaultBodyLimit, Multipart, State },
    response::IntoResponse,
    routing::{ get, post },
};
use futures::StreamExt;
use log::info;
use serde_json::json;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{ Any, CorsLayer };

use crate::enrich::PromptEnricher;
use crate::jobs::{ BackgroundJob, JobQueue };
use crate::llm::chat::ChatClient;
use crate::models::api::{ TextGenerationRequest, TextGenerationResponse, UploadReceipt };
use crate::rag::text_sibling_path;
use crate::storage::FileStore;
use super::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub chat_client: Arc<dyn ChatClient>,
    pub url_enricher: Arc<dyn PromptEnricher>,
    pub retrieval_enricher: Arc<dyn PromptEnricher>,
    pub files: FileStore,
    pub jobs: JobQueue,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/generate/text", post(generate_text))
        .route("/upload", post(upload_document))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn generate_text(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(body): Json<TextGenerationRequest>
) -> Result<Json<TextGenerationResponse>, ApiError> {
    let response = handle_generate(&state, body, Some(addr.ip().to_string())).await?;
    Ok(Json(response))
}

async fn upload_document(
    State(state): State<AppState>,
    multipart: Multipart
) -> Result<Json<UploadReceipt>, ApiError> {
    let receipt = handle_upload(&state, multipart).await?;
    Ok(Json(receipt))
}

/// The upstream prompt is the raw prompt, one joining space, then both
/// enrichment strings glued on directly, even when they are empty.
pub fn compose_prompt(prompt: &str, urls_content: &str, rag_content: &str) -> String {
    format!("{} {}{}", prompt, urls_content, rag_content)
}

/// Validates, enriches and relays one generation request. For a valid
/// request this only errors if the model id is rejected at the generation
/// seam; upstream failures come back as diagnostic content instead.
pub async fn handle_generate(
    state: &AppState,
    body: TextGenerationRequest,
    ip: Option<String>
) -> Result<TextGenerationResponse, ApiError> {
    body.validate()?;

    let urls_content = state.url_enricher.enrich(&body).await;
    let rag_content = state.retrieval_enricher.enrich(&body).await;
    let prompt = compose_prompt(&body.prompt, &urls_content, &rag_content);

    let content = state.chat_client.generate(body.model.as_str(), &prompt, body.temperature).await?;

    Ok(TextGenerationResponse::new(content, ip))
}

/// Takes the `file` part of the form, stores it, and queues extraction plus
/// indexing. The receipt goes out without waiting on either job.
pub async fn handle_upload(
    state: &AppState,
    mut multipart: Multipart
) -> Result<UploadReceipt, ApiError> {
    while
        let Some(field) = multipart
            .next_field().await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        if field.content_type() != Some("application/pdf") {
            return Err(ApiError::UnsupportedMediaType);
        }

        let filename = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                return Err(ApiError::BadRequest("Uploaded file has no filename".to_string()));
            }
        };

        let source = field.map(|piece| piece.map_err(io::Error::other));
        let stored_path = state.files.save(&filename, source).await?;
        let text_path = text_sibling_path(&stored_path);

        state.jobs.submit(BackgroundJob::ExtractText { input_path: stored_path });
        state.jobs.submit(BackgroundJob::IndexContent { input_path: text_path });
        info!("Stored {} and queued extraction and indexing", filename);

        return Ok(UploadReceipt {
            filename,
            message: "File upload successfully".to_string(),
        });
    }

    Err(ApiError::MissingFile)
}
