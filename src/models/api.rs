use chrono::{ DateTime, Utc };
use serde::{ Serialize, Deserialize };
use thiserror::Error;

use crate::llm::SupportedModel;

/// Body of `POST /generate/text`. An unknown model id already fails at
/// deserialization; the remaining field constraints are checked by
/// [`TextGenerationRequest::validate`] before any work happens.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TextGenerationRequest {
    pub prompt: String,
    pub model: SupportedModel,
    #[serde(default)]
    pub temperature: f32,
}

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("prompt must not be empty")]
    EmptyPrompt,
    #[error("temperature must be between 0.0 and 1.0, got {0}")]
    TemperatureOutOfRange(f32),
}

impl TextGenerationRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.prompt.is_empty() {
            return Err(ValidationError::EmptyPrompt);
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(ValidationError::TemperatureOutOfRange(self.temperature));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TextGenerationResponse {
    pub content: String,
    pub ip: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub tokens: u32,
}

impl TextGenerationResponse {
    pub fn new(content: String, ip: Option<String>) -> Self {
        Self {
            content,
            ip,
            created_at: Utc::now(),
            tokens: 0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub filename: String,
    pub message: String,
}
