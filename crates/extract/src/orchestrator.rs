use causelist_ingest::{Chunker, Document, estimate_units};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::cache::{CachedClient, ResponseCache};
use crate::config::ExtractionConfig;
use crate::error::{ClientError, ExtractError, Result};
use crate::llm::ExtractionClient;
use crate::merger::merge;
use crate::metrics::{ExtractionMetrics, MetricsSnapshot, TimedOperation};
use crate::prompt::{ExtractionRequest, PromptVariant, build_request};
use crate::retry::RetryPolicy;
use crate::sanitizer::{SanitizePath, sanitize_with_path};
use crate::schema::ExtractionResult;

/// Runs the primary → simplified ladder for one piece of text.
///
/// Cloned into every chunk task; holds nothing mutable besides atomic metrics.
#[derive(Clone)]
struct ChunkWorker {
    client: Arc<dyn ExtractionClient>,
    retry: RetryPolicy,
    metrics: Arc<ExtractionMetrics>,
    request_timeout: Duration,
    simplified_prefix_chars: usize,
}

impl ChunkWorker {
    async fn run_ladder(&self, text: &str) -> ExtractionResult {
        let primary = self.attempt(text, PromptVariant::Primary).await;
        if primary.has_groups() {
            return primary;
        }

        debug!(degraded = primary.degraded, "No benches from primary prompt, retrying simplified");
        let simplified = self.attempt(text, PromptVariant::Simplified).await;
        if simplified.has_groups() {
            return simplified;
        }

        prefer_confirmed(primary, simplified)
    }

    async fn attempt(&self, text: &str, variant: PromptVariant) -> ExtractionResult {
        let request = build_request(text, variant, self.simplified_prefix_chars);
        let request = &request;
        let worker = self;

        let outcome = self
            .retry
            .retry(
                variant.as_str(),
                move || worker.call(request),
                ClientError::is_retryable,
            )
            .await;

        match outcome {
            Ok(raw) => {
                let (result, path) = sanitize_with_path(&raw);
                if path == SanitizePath::Fallback {
                    self.metrics.record_degraded();
                }
                result
            }
            Err(e) => {
                warn!(
                    client = self.client.name(),
                    variant = variant.as_str(),
                    error = %e,
                    "Extraction call failed"
                );
                ExtractionResult::degraded()
            }
        }
    }

    async fn call(&self, request: &ExtractionRequest) -> std::result::Result<String, ClientError> {
        let outcome = match timeout(self.request_timeout, self.client.extract(request)).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout(self.request_timeout)),
        };

        match &outcome {
            Ok(_) => self.metrics.record_request(true, false),
            Err(e) => self.metrics.record_request(false, e.is_retryable()),
        }
        outcome
    }
}

/// Zero benches either way; keep the answer that actually parsed.
fn prefer_confirmed(first: ExtractionResult, second: ExtractionResult) -> ExtractionResult {
    if !first.degraded { first } else { second }
}

/// Chooses between single-shot and chunked extraction for a cause list and
/// drives the external service accordingly.
///
/// Client failures never reach the caller: a failed call turns into a
/// degraded (empty) partial result and the rest of the document carries on.
pub struct ExtractionOrchestrator {
    worker: ChunkWorker,
    config: ExtractionConfig,
}

impl ExtractionOrchestrator {
    pub fn new(client: Arc<dyn ExtractionClient>, config: ExtractionConfig) -> Self {
        let config = config.validate();

        let client: Arc<dyn ExtractionClient> = if config.cache.enabled {
            let cache = Arc::new(ResponseCache::new(config.cache.max_entries));
            Arc::new(CachedClient::new(client, cache))
        } else {
            client
        };

        let worker = ChunkWorker {
            client,
            retry: RetryPolicy::from_config(&config.retry),
            metrics: Arc::new(ExtractionMetrics::new()),
            request_timeout: config.request_timeout(),
            simplified_prefix_chars: config.chunking.simplified_prefix_chars,
        };

        Self { worker, config }
    }

    pub fn with_defaults(client: Arc<dyn ExtractionClient>) -> Self {
        Self::new(client, ExtractionConfig::default())
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.worker.metrics.snapshot()
    }

    pub async fn extract_document(&self, document: &Document) -> Result<ExtractionResult> {
        self.run(&document.doc_id, &document.text).await
    }

    pub async fn extract(&self, text: &str) -> Result<ExtractionResult> {
        self.run("inline", text).await
    }

    async fn run(&self, doc_id: &str, text: &str) -> Result<ExtractionResult> {
        if text.trim().is_empty() {
            return Err(ExtractError::EmptyDocument);
        }

        let run_id = Uuid::new_v4();
        let span = info_span!("extract", %run_id, doc_id);

        async {
            let timer = TimedOperation::start();
            let units = estimate_units(text);
            let chunking = &self.config.chunking;

            let result = if units > chunking.hard_chunk_units {
                info!(units, threshold = chunking.hard_chunk_units, "Document too large for one request, chunking");
                self.extract_chunked(doc_id, text).await
            } else {
                let single = self.worker.run_ladder(text).await;
                if !single.has_groups() && units > chunking.soft_chunk_units {
                    info!(units, threshold = chunking.soft_chunk_units, "Single-shot found no benches, escalating to chunks");
                    let chunked = self.extract_chunked(doc_id, text).await;
                    if chunked.has_groups() {
                        chunked
                    } else {
                        prefer_confirmed(single, chunked)
                    }
                } else {
                    single
                }
            };

            self.worker
                .metrics
                .record_document(timer.elapsed(), result.groups.len(), result.entry_count());
            info!(
                groups = result.groups.len(),
                entries = result.entry_count(),
                degraded = result.degraded,
                elapsed_ms = timer.elapsed().as_millis() as u64,
                "Extraction finished"
            );

            Ok(result)
        }
        .instrument(span)
        .await
    }

    async fn extract_chunked(&self, doc_id: &str, text: &str) -> ExtractionResult {
        let chunker = Chunker::with_max_chars(self.config.chunking.max_chunk_chars);
        let chunks = chunker.chunk_text(doc_id, text);
        self.worker.metrics.record_chunks(chunks.len());
        info!(chunks = chunks.len(), "Extracting chunks");

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max_in_flight));

        let handles: Vec<_> = chunks
            .into_iter()
            .map(|chunk| {
                let worker = self.worker.clone();
                let semaphore = Arc::clone(&semaphore);
                let span = info_span!("chunk", index = chunk.index, chunk_id = %chunk.chunk_id);

                tokio::spawn(
                    async move {
                        let Ok(_permit) = semaphore.acquire_owned().await else {
                            return ExtractionResult::degraded();
                        };
                        worker.run_ladder(&chunk.text).await
                    }
                    .instrument(span),
                )
            })
            .collect();

        // Join in chunk order so the merge is independent of completion order
        let mut partials = Vec::with_capacity(handles.len());
        for (index, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(partial) => {
                    if partial.degraded {
                        warn!(chunk = index, "Chunk produced no usable result");
                    }
                    partials.push(partial);
                }
                Err(e) => {
                    warn!(chunk = index, error = %e, "Chunk task aborted");
                    partials.push(ExtractionResult::degraded());
                }
            }
        }

        merge(&partials)
    }
}
