pub mod retrieval;
pub mod scraper;

use async_trait::async_trait;

use crate::models::api::TextGenerationRequest;

/// A prompt-augmentation source. Implementations swallow their own failures
/// (logging them) and come back with an empty string, so a valid generation
/// request always proceeds.
#[async_trait]
pub trait PromptEnricher: Send + Sync {
    async fn enrich(&self, request: &TextGenerationRequest) -> String;
}
