use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;
use tracing::debug;

use crate::Document;

/// Reads plain text produced by an upstream PDF-to-text step.
pub struct FileReader;

impl FileReader {
    pub async fn read_document(path: &Path) -> Result<Document> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        match extension {
            "txt" => {
                let content = fs::read_to_string(path)
                    .await
                    .context(format!("Failed to read file: {:?}", path))?;
                Ok(Document::new(path.to_string_lossy().to_string(), content))
            }
            _ => anyhow::bail!("Unsupported file format: {}", extension),
        }
    }

    /// Read every `.txt` file directly inside `dir`, sorted by path.
    pub async fn read_directory(dir: &Path) -> Result<Vec<Document>> {
        let mut documents = Vec::new();

        let mut entries = fs::read_dir(dir)
            .await
            .context(format!("Failed to list directory: {:?}", dir))?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();

            if path.is_file() && path.extension().is_some_and(|ext| ext == "txt") {
                documents.push(Self::read_document(&path).await?);
            } else {
                debug!(path = %path.display(), "Skipping non-text entry");
            }
        }

        documents.sort_by(|a, b| a.source.cmp(&b.source));
        Ok(documents)
    }
}
