use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::size::estimate_units;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub doc_id: String,
    pub chunk_id: String,
    /// Processing order within the document, starting at 0
    pub index: usize,
    pub text: String,
    pub offset: (usize, usize), // [start, end) character positions
    pub estimated_units: usize,
}

impl Chunk {
    pub fn new(doc_id: String, index: usize, text: String, offset: (usize, usize)) -> Self {
        // Generate stable chunk_id from content
        let chunk_id = Self::generate_chunk_id(&doc_id, index, &text);
        let estimated_units = estimate_units(&text);

        Self {
            doc_id,
            chunk_id,
            index,
            text,
            offset,
            estimated_units,
        }
    }

    fn generate_chunk_id(doc_id: &str, index: usize, text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(doc_id.as_bytes());
        hasher.update(index.to_string().as_bytes());
        hasher.update(text.as_bytes());
        let result = hasher.finalize();
        hex::encode(&result[..16]) // Use first 16 bytes (32 hex chars)
    }
}
