use async_trait::async_trait;
use log::info;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CreateCollection,
    Distance,
    PointStruct,
    SearchPoints,
    UpsertPoints,
    VectorParams,
    VectorsConfig,
    Value as QdrantValue,
    with_payload_selector::SelectorOptions as WithPayloadOptions,
    WithPayloadSelector,
};
use std::collections::HashMap;
use std::error::Error as StdError;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use uuid::Uuid;

use crate::llm::embedding::EmbeddingClient;
use super::{ chunk_text, ScoredPassage, VectorService };

pub struct QdrantVectorService {
    client: Qdrant,
    embedding_client: Arc<dyn EmbeddingClient>,
}

impl QdrantVectorService {
    pub fn new(
        url: &str,
        api_key: Option<String>,
        embedding_client: Arc<dyn EmbeddingClient>
    ) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let mut builder = Qdrant::from_url(url);
        if let Some(key) = api_key {
            builder = builder.api_key(key);
        }
        let client = builder.build()?;

        Ok(Self { client, embedding_client })
    }

    async fn ensure_collection_exists(
        &self,
        collection: &str,
        embedding_dim: u64
    ) -> Result<(), Box<dyn StdError + Send + Sync>> {
        if !self.client.collection_exists(collection).await? {
            self.client.create_collection(CreateCollection {
                collection_name: collection.to_string(),
                vectors_config: Some(
                    VectorsConfig::from(VectorParams {
                        size: embedding_dim,
                        distance: Distance::Cosine.into(),
                        ..Default::default()
                    })
                ),
                ..Default::default()
            }).await?;
            info!("Created Qdrant collection: {}", collection);
        }
        Ok(())
    }
}

#[async_trait]
impl VectorService for QdrantVectorService {
    async fn store_file_content(
        &self,
        text_path: &Path,
        chunk_size: usize,
        collection: &str,
        embedding_dim: u64
    ) -> Result<(), Box<dyn StdError + Send + Sync>> {
        self.ensure_collection_exists(collection, embedding_dim).await?;

        let content = fs::read_to_string(text_path).await?;
        let chunks = chunk_text(&content, chunk_size);
        if chunks.is_empty() {
            info!("No indexable content in {}", text_path.display());
            return Ok(());
        }

        let source = text_path.to_string_lossy().to_string();
        let mut points = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let embedding = self.embedding_client.embed(&chunk).await?.embedding;
            if (embedding.len() as u64) != embedding_dim {
                return Err(
                    format!(
                        "Embedding dimension mismatch: expected {}, got {}",
                        embedding_dim,
                        embedding.len()
                    ).into()
                );
            }

            let mut payload: HashMap<String, QdrantValue> = HashMap::new();
            payload.insert("source".to_string(), source.clone().into());
            payload.insert("content".to_string(), chunk.into());

            points.push(PointStruct::new(Uuid::new_v4().to_string(), embedding, payload));
        }

        let indexed = points.len();
        self.client.upsert_points(UpsertPoints {
            collection_name: collection.to_string(),
            wait: Some(true),
            points,
            ordering: None,
            shard_key_selector: None,
            ..Default::default()
        }).await?;
        info!("Indexed {} chunks from {} into {}", indexed, text_path.display(), collection);

        Ok(())
    }

    async fn search(
        &self,
        query: &str,
        collection: &str,
        limit: usize
    ) -> Result<Vec<ScoredPassage>, Box<dyn StdError + Send + Sync>> {
        if !self.client.collection_exists(collection).await? {
            return Ok(Vec::new());
        }

        let embedding = self.embedding_client.embed(query).await?.embedding;
        let response = self.client.search_points(SearchPoints {
            collection_name: collection.to_string(),
            vector: embedding,
            limit: limit as u64,
            with_payload: Some(WithPayloadSelector {
                selector_options: Some(WithPayloadOptions::Enable(true)),
            }),
            ..Default::default()
        }).await?;

        let passages = response.result
            .into_iter()
            .filter_map(|point| {
                let text = point.payload.get("content")?.as_str()?.to_string();
                Some(ScoredPassage { text, score: point.score })
            })
            .collect();

        Ok(passages)
    }
}
