use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[derive(Default)]
pub struct ExtractionMetrics {
    // Counters
    total_requests: AtomicUsize,
    failed_requests: AtomicUsize,
    rate_limited_requests: AtomicUsize,
    degraded_responses: AtomicUsize,

    // Documents
    documents_processed: AtomicUsize,
    chunked_documents: AtomicUsize,
    total_extract_time_us: AtomicU64,

    // Counts
    total_chunks_processed: AtomicUsize,
    total_groups_extracted: AtomicUsize,
    total_entries_extracted: AtomicUsize,
}

impl ExtractionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self, success: bool, rate_limited: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
        if rate_limited {
            self.rate_limited_requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_degraded(&self) {
        self.degraded_responses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_chunks(&self, chunks: usize) {
        self.chunked_documents.fetch_add(1, Ordering::Relaxed);
        self.total_chunks_processed.fetch_add(chunks, Ordering::Relaxed);
    }

    pub fn record_document(&self, duration: Duration, groups: usize, entries: usize) {
        self.documents_processed.fetch_add(1, Ordering::Relaxed);
        self.total_extract_time_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.total_groups_extracted.fetch_add(groups, Ordering::Relaxed);
        self.total_entries_extracted.fetch_add(entries, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let documents = self.documents_processed.load(Ordering::Relaxed);
        let total_us = self.total_extract_time_us.load(Ordering::Relaxed) as f64;

        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            rate_limited_requests: self.rate_limited_requests.load(Ordering::Relaxed),
            degraded_responses: self.degraded_responses.load(Ordering::Relaxed),
            documents_processed: documents,
            chunked_documents: self.chunked_documents.load(Ordering::Relaxed),
            avg_extract_time_ms: if documents > 0 {
                total_us / documents as f64 / 1000.0 // Convert to ms
            } else {
                0.0
            },
            total_chunks_processed: self.total_chunks_processed.load(Ordering::Relaxed),
            total_groups_extracted: self.total_groups_extracted.load(Ordering::Relaxed),
            total_entries_extracted: self.total_entries_extracted.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: usize,
    pub failed_requests: usize,
    pub rate_limited_requests: usize,
    pub degraded_responses: usize,
    pub documents_processed: usize,
    pub chunked_documents: usize,
    pub avg_extract_time_ms: f64,
    pub total_chunks_processed: usize,
    pub total_groups_extracted: usize,
    pub total_entries_extracted: usize,
}

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_counts() {
        let metrics = ExtractionMetrics::new();
        metrics.record_request(true, false);
        metrics.record_request(false, true);
        metrics.record_degraded();
        metrics.record_chunks(3);
        metrics.record_document(Duration::from_millis(40), 2, 5);
        metrics.record_document(Duration::from_millis(20), 1, 1);

        let snap = metrics.snapshot();
        assert_eq!(snap.total_requests, 2);
        assert_eq!(snap.failed_requests, 1);
        assert_eq!(snap.rate_limited_requests, 1);
        assert_eq!(snap.degraded_responses, 1);
        assert_eq!(snap.chunked_documents, 1);
        assert_eq!(snap.total_chunks_processed, 3);
        assert_eq!(snap.documents_processed, 2);
        assert_eq!(snap.total_groups_extracted, 3);
        assert_eq!(snap.total_entries_extracted, 6);
        assert!((snap.avg_extract_time_ms - 30.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_snapshot_has_zero_average() {
        assert_eq!(ExtractionMetrics::new().snapshot().avg_extract_time_ms, 0.0);
    }
}
