use async_trait::async_trait;
use log::info;
use std::error::Error as StdError;
use std::path::{ Path, PathBuf };
use tokio::fs;
use tokio::task;

use super::{ text_sibling_path, TextExtractor };

/// Pulls the text out of a stored PDF and writes it next to the original
/// with a `.text` extension.
pub struct PdfTextExtractor;

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract(&self, file_path: &Path) -> Result<PathBuf, Box<dyn StdError + Send + Sync>> {
        let bytes = fs::read(file_path).await?;
        let text = task
            ::spawn_blocking(move || {
                pdf_extract
                    ::extract_text_from_mem(&bytes)
                    .map_err(|e| format!("PDF parse error: {}", e))
            }).await??;

        let output_path = text_sibling_path(file_path);
        fs::write(&output_path, &text).await?;
        info!("Extracted {} characters into {}", text.chars().count(), output_path.display());

        Ok(output_path)
    }
}
