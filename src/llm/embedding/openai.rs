use async_trait::async_trait;
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION } };
use serde::{ Deserialize, Serialize };
use std::error::Error as StdError;
use std::time::Duration;

use super::{ EmbeddingClient, EmbeddingResponse };
use crate::llm::{ GENERATION_TIMEOUT_SECS, OPENAI_EMBEDDINGS_URL };

const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

pub struct OpenAIEmbeddingClient {
    http: HttpClient,
    model: String,
    dimensions: u64,
}

#[derive(Serialize)]
struct EmbeddingRequest {
    model: String,
    input: String,
    dimensions: u64,
}

#[derive(Deserialize)]
struct EmbeddingApiResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    embedding: Vec<f32>,
}

impl OpenAIEmbeddingClient {
    pub fn new(api_key: String, dimensions: u64) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e|
                format!("Invalid API key format: {}", e)
            )?
        );

        let http = HttpClient::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(GENERATION_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimensions,
        })
    }
}

#[async_trait]
impl EmbeddingClient for OpenAIEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<EmbeddingResponse, Box<dyn StdError + Send + Sync>> {
        let req = EmbeddingRequest {
            model: self.model.clone(),
            input: text.to_string(),
            dimensions: self.dimensions,
        };

        let resp = self.http
            .post(OPENAI_EMBEDDINGS_URL)
            .json(&req)
            .send().await?
            .error_for_status()?
            .json::<EmbeddingApiResponse>().await?;

        let row = resp.data
            .into_iter()
            .next()
            .ok_or_else(|| "Embedding response contained no rows".to_string())?;

        Ok(EmbeddingResponse { embedding: row.embedding })
    }
}
