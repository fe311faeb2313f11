use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub chunking: ChunkingConfig,
    pub concurrency: ConcurrencyConfig,
    pub retry: RetryConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Above this many units the single-shot attempt is skipped entirely
    pub hard_chunk_units: usize,
    /// Above this many units an empty single-shot answer escalates to chunking
    pub soft_chunk_units: usize,
    pub max_chunk_chars: usize,
    /// Prefix length fed to the simplified retry prompt
    pub simplified_prefix_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    pub max_in_flight: usize,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_entries: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig {
                hard_chunk_units: 12_000,
                soft_chunk_units: 4_000,
                max_chunk_chars: 24_000,
                simplified_prefix_chars: 12_000,
            },
            concurrency: ConcurrencyConfig {
                max_in_flight: 4,
                request_timeout_secs: 120,
            },
            retry: RetryConfig {
                max_retries: 2,
                initial_backoff_ms: 1000,
                max_backoff_ms: 10000,
            },
            cache: CacheConfig {
                enabled: true,
                max_entries: 2000,
            },
        }
    }
}

impl ExtractionConfig {
    /// Bigger chunks and more parallel calls; fewer retries.
    pub fn fast_mode() -> Self {
        Self {
            chunking: ChunkingConfig {
                hard_chunk_units: 16_000,
                soft_chunk_units: 6_000,
                max_chunk_chars: 40_000,
                simplified_prefix_chars: 8_000,
            },
            concurrency: ConcurrencyConfig {
                max_in_flight: 8,
                request_timeout_secs: 60,
            },
            retry: RetryConfig {
                max_retries: 1,
                initial_backoff_ms: 500,
                max_backoff_ms: 5000,
            },
            cache: CacheConfig {
                enabled: true,
                max_entries: 5000,
            },
        }
    }

    /// Small chunks so long lists are never truncated by the service; no cache.
    pub fn accurate_mode() -> Self {
        Self {
            chunking: ChunkingConfig {
                hard_chunk_units: 6_000,
                soft_chunk_units: 2_000,
                max_chunk_chars: 12_000,
                simplified_prefix_chars: 12_000,
            },
            concurrency: ConcurrencyConfig {
                max_in_flight: 2,
                request_timeout_secs: 180,
            },
            retry: RetryConfig {
                max_retries: 4,
                initial_backoff_ms: 2000,
                max_backoff_ms: 20000,
            },
            cache: CacheConfig {
                enabled: false,
                max_entries: 0,
            },
        }
    }

    /// Clamp values that would stall or misorder the pipeline.
    pub fn validate(mut self) -> Self {
        self.concurrency.max_in_flight = self.concurrency.max_in_flight.max(1);
        self.concurrency.request_timeout_secs = self.concurrency.request_timeout_secs.max(1);
        self.chunking.max_chunk_chars = self.chunking.max_chunk_chars.max(1);
        self.chunking.simplified_prefix_chars = self.chunking.simplified_prefix_chars.max(1);
        if self.chunking.soft_chunk_units > self.chunking.hard_chunk_units {
            self.chunking.soft_chunk_units = self.chunking.hard_chunk_units;
        }
        self.retry.max_backoff_ms = self.retry.max_backoff_ms.max(self.retry.initial_backoff_ms);
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.concurrency.request_timeout_secs)
    }
}
