pub mod extractor;
pub mod service;

use async_trait::async_trait;
use std::error::Error as StdError;
use std::path::{ Path, PathBuf };

/// Collection holding indexed upload content.
pub const KNOWLEDGEBASE_COLLECTION: &str = "knowledgebase";
/// Character count per indexed chunk.
pub const INDEX_CHUNK_SIZE: usize = 512;
/// Vector width of the embedding space.
pub const EMBEDDING_DIM: u64 = 768;
/// Passages pulled into a prompt per request.
pub const RAG_RESULT_LIMIT: usize = 5;

/// Converts a stored document into a plain-text sibling file.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, file_path: &Path) -> Result<PathBuf, Box<dyn StdError + Send + Sync>>;
}

#[derive(Debug, Clone)]
pub struct ScoredPassage {
    pub text: String,
    pub score: f32,
}

#[async_trait]
pub trait VectorService: Send + Sync {
    /// Splits the text file at `text_path` into `chunk_size`-character
    /// chunks and indexes each one into `collection`.
    async fn store_file_content(
        &self,
        text_path: &Path,
        chunk_size: usize,
        collection: &str,
        embedding_dim: u64
    ) -> Result<(), Box<dyn StdError + Send + Sync>>;

    async fn search(
        &self,
        query: &str,
        collection: &str,
        limit: usize
    ) -> Result<Vec<ScoredPassage>, Box<dyn StdError + Send + Sync>>;
}

/// Path of the extracted-text companion for a stored document, e.g.
/// `uploads/report.pdf` -> `uploads/report.text`.
pub fn text_sibling_path(path: &Path) -> PathBuf {
    path.with_extension("text")
}

pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<String> {
    assert!(chunk_size > 0);
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(chunk_size)
        .map(|chunk| chunk.iter().collect::<String>())
        .filter(|chunk| !chunk.trim().is_empty())
        .collect()
}
