pub mod chunk;
pub mod chunker;
pub mod reader;
pub mod size;

pub use chunk::Chunk;
pub use chunker::{Chunker, ChunkerConfig};
pub use reader::FileReader;
pub use size::estimate_units;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Generate a stable document ID from its source (file path or URL)
pub fn generate_doc_id(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..16])
}

/// Raw text of one cause list, alive for a single extraction call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub doc_id: String,
    pub source: String,
    pub text: String,
}

impl Document {
    pub fn new(source: String, text: String) -> Self {
        Self {
            doc_id: generate_doc_id(&source),
            source,
            text,
        }
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn estimated_units(&self) -> usize {
        estimate_units(&self.text)
    }

    pub fn chunks(&self, chunker: &Chunker) -> Vec<Chunk> {
        chunker.chunk_text(&self.doc_id, &self.text)
    }
}
