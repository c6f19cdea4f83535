use axum::Json;
use axum::http::StatusCode;
use axum::response::{ IntoResponse, Response };
use log::error;
use serde_json::json;
use thiserror::Error;

use crate::llm::GenerationError;
use crate::models::api::ValidationError;

/// Everything a handler can answer with besides a success body. The JSON
/// shape is always `{"detail": <message>}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error("Only uploading PDF documents are supported")]
    UnsupportedMediaType,
    #[error("No file field in the upload")]
    MissingFile,
    #[error("{0}")]
    BadRequest(String),
    #[error("An error occurred while saving file - Error {0}")]
    Storage(#[from] std::io::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::MissingFile => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Generation(GenerationError::UnsupportedModel(_)) =>
                StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Generation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::UnsupportedMediaType | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{}", self);
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
