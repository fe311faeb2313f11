use crate::chunk::Chunk;

pub const DEFAULT_MAX_CHARS: usize = 24_000;

#[derive(Debug, Clone, Copy)]
pub struct ChunkerConfig {
    /// Character budget per chunk. A single line longer than this still
    /// becomes its own chunk.
    pub max_chars: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
        }
    }
}

/// Splits cause-list text into line-aligned chunks.
///
/// Lines keep their terminators, so concatenating every chunk's text in
/// index order gives back the input unchanged.
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    pub fn with_max_chars(max_chars: usize) -> Self {
        Self::new(ChunkerConfig { max_chars })
    }

    pub fn max_chars(&self) -> usize {
        self.config.max_chars.max(1)
    }

    pub fn chunk_text(&self, doc_id: &str, text: &str) -> Vec<Chunk> {
        let budget = self.max_chars();
        let mut chunks = Vec::new();

        let mut buffer = String::new();
        let mut buffer_chars = 0;
        let mut buffer_start = 0;
        let mut current_offset = 0;

        for line in text.split_inclusive('\n') {
            let line_chars = line.chars().count();

            // Flush before the line would push the buffer over budget
            if buffer_chars + line_chars > budget && !buffer.is_empty() {
                chunks.push(Chunk::new(
                    doc_id.to_string(),
                    chunks.len(),
                    std::mem::take(&mut buffer),
                    (buffer_start, current_offset),
                ));
                buffer_chars = 0;
                buffer_start = current_offset;
            }

            buffer.push_str(line);
            buffer_chars += line_chars;
            current_offset += line_chars;
        }

        if !buffer.is_empty() {
            chunks.push(Chunk::new(
                doc_id.to_string(),
                chunks.len(),
                buffer,
                (buffer_start, current_offset),
            ));
        }

        chunks
    }
}
