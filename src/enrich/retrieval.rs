use async_trait::async_trait;
use log::warn;
use std::sync::Arc;

use super::PromptEnricher;
use crate::models::api::TextGenerationRequest;
use crate::rag::{ ScoredPassage, VectorService, KNOWLEDGEBASE_COLLECTION, RAG_RESULT_LIMIT };

/// Looks the prompt up in the knowledge base and hands back the best
/// matching passages as context text.
pub struct KnowledgeBaseEnricher {
    vector_service: Arc<dyn VectorService>,
}

impl KnowledgeBaseEnricher {
    pub fn new(vector_service: Arc<dyn VectorService>) -> Self {
        Self { vector_service }
    }
}

#[async_trait]
impl PromptEnricher for KnowledgeBaseEnricher {
    async fn enrich(&self, request: &TextGenerationRequest) -> String {
        let found = self.vector_service.search(
            &request.prompt,
            KNOWLEDGEBASE_COLLECTION,
            RAG_RESULT_LIMIT
        ).await;

        match found {
            Ok(passages) => format_passages(&passages),
            Err(err) => {
                warn!("Knowledge base lookup failed: {}", err);
                String::new()
            }
        }
    }
}

fn format_passages(passages: &[ScoredPassage]) -> String {
    passages
        .iter()
        .map(|passage| passage.text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
