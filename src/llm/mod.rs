pub mod chat;
pub mod embedding;

use once_cell::sync::Lazy;
use serde::{ Deserialize, Serialize };
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const OPENAI_CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const OPENAI_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an AI assistant";
pub const GENERATION_TIMEOUT_SECS: u64 = 30;

/// Model ids accepted on the request boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum SupportedModel {
    #[serde(rename = "gpt-3.5-turbo")]
    Gpt35Turbo,
    #[serde(rename = "gpt-4o")]
    Gpt4o,
}

impl SupportedModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupportedModel::Gpt35Turbo => "gpt-3.5-turbo",
            SupportedModel::Gpt4o => "gpt-4o",
        }
    }
}

impl fmt::Display for SupportedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseModelError {
    message: String,
}

impl fmt::Display for ParseModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseModelError {}

impl FromStr for SupportedModel {
    type Err = ParseModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gpt-3.5-turbo" => Ok(SupportedModel::Gpt35Turbo),
            "gpt-4o" => Ok(SupportedModel::Gpt4o),
            _ =>
                Err(ParseModelError {
                    message: format!("Unsupported model: '{}'", s),
                }),
        }
    }
}

/// Per-model generation settings. Everything here is compiled in; the only
/// runtime input is the API credential.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub endpoint: &'static str,
    pub system_prompt: &'static str,
}

pub static MODELS: Lazy<HashMap<&'static str, ModelConfig>> = Lazy::new(|| {
    let openai = ModelConfig {
        endpoint: OPENAI_CHAT_COMPLETIONS_URL,
        system_prompt: DEFAULT_SYSTEM_PROMPT,
    };
    let mut models = HashMap::new();
    models.insert("gpt-3.5-turbo", openai.clone());
    models.insert("gpt-4o", openai);
    models
});

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("unsupported model: '{0}'")]
    UnsupportedModel(String),
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
    #[error("upstream response is missing the completion content")]
    MalformedResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_covers_every_supported_model() {
        for model in [SupportedModel::Gpt35Turbo, SupportedModel::Gpt4o] {
            let config = MODELS.get(model.as_str()).unwrap();
            assert_eq!(config.endpoint, OPENAI_CHAT_COMPLETIONS_URL);
            assert_eq!(config.system_prompt, DEFAULT_SYSTEM_PROMPT);
        }
    }

    #[test]
    fn parses_model_ids() {
        assert_eq!("gpt-4o".parse::<SupportedModel>().unwrap(), SupportedModel::Gpt4o);
        assert_eq!(
            "gpt-3.5-turbo".parse::<SupportedModel>().unwrap(),
            SupportedModel::Gpt35Turbo
        );
        assert!("llama3".parse::<SupportedModel>().is_err());
    }

    #[test]
    fn model_id_round_trips_through_display() {
        assert_eq!(SupportedModel::Gpt4o.to_string(), "gpt-4o");
        assert_eq!(SupportedModel::Gpt35Turbo.to_string(), "gpt-3.5-turbo");
    }
}
