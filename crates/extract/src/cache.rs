use async_trait::async_trait;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::debug;

use crate::error::ClientError;
use crate::llm::ExtractionClient;
use crate::prompt::ExtractionRequest;
use crate::sanitizer::{SanitizePath, sanitize_with_path};

/// Raw service responses keyed by a hash of the request.
pub struct ResponseCache {
    responses: DashMap<String, String>,
    max_entries: usize,
}

impl ResponseCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            responses: DashMap::new(),
            max_entries,
        }
    }

    pub fn set(&self, request: &ExtractionRequest, response: String) {
        if self.max_entries == 0 {
            return;
        }
        if self.responses.len() >= self.max_entries {
            // Simple eviction: clear 25% when full
            let to_remove: Vec<_> = self
                .responses
                .iter()
                .take((self.max_entries / 4).max(1))
                .map(|r| r.key().clone())
                .collect();
            for key in to_remove {
                self.responses.remove(&key);
            }
        }
        self.responses.insert(Self::hash_request(request), response);
    }

    pub fn get(&self, request: &ExtractionRequest) -> Option<String> {
        let key = Self::hash_request(request);
        self.responses.get(&key).map(|r| r.value().clone())
    }

    fn hash_request(request: &ExtractionRequest) -> String {
        let mut hasher = Sha256::new();
        hasher.update(request.variant.as_str().as_bytes());
        hasher.update(request.prompt.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

/// Serves repeated requests from a [`ResponseCache`]. Only responses that
/// sanitize into a usable structure are stored, so an unreadable reply is
/// asked for again next time.
pub struct CachedClient {
    inner: Arc<dyn ExtractionClient>,
    cache: Arc<ResponseCache>,
}

impl CachedClient {
    pub fn new(inner: Arc<dyn ExtractionClient>, cache: Arc<ResponseCache>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl ExtractionClient for CachedClient {
    async fn extract(&self, request: &ExtractionRequest) -> Result<String, ClientError> {
        if let Some(hit) = self.cache.get(request) {
            debug!(client = self.inner.name(), "Response cache hit");
            return Ok(hit);
        }

        let response = self.inner.extract(request).await?;
        let (_, path) = sanitize_with_path(&response);
        if path == SanitizePath::Fallback {
            debug!(client = self.inner.name(), "Unreadable response not cached");
        } else {
            self.cache.set(request, response.clone());
        }
        Ok(response)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{PromptVariant, build_request};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: AtomicUsize,
        fail: bool,
        prose_calls: usize,
    }

    impl Counting {
        fn new(fail: bool, prose_calls: usize) -> Self {
            Self { calls: AtomicUsize::new(0), fail, prose_calls }
        }
    }

    #[async_trait]
    impl ExtractionClient for Counting {
        async fn extract(&self, request: &ExtractionRequest) -> Result<String, ClientError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ClientError::Transport("down".into()));
            }
            if n < self.prose_calls {
                return Ok("Sorry, the document is hard to read.".into());
            }
            Ok(format!(r#"{{"court_name": "{}#{n}", "benches": []}}"#, request.variant.as_str()))
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    #[tokio::test]
    async fn test_second_identical_request_is_served_from_cache() {
        let inner = Arc::new(Counting::new(false, 0));
        let client = CachedClient::new(inner.clone(), Arc::new(ResponseCache::new(10)));
        let req = build_request("COURT NO. 1", PromptVariant::Primary, 100);

        let first = client.extract(&req).await.unwrap();
        assert!(first.contains("primary#0"));
        assert_eq!(client.extract(&req).await.unwrap(), first);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_variant_is_part_of_the_key() {
        let inner = Arc::new(Counting::new(false, 0));
        let client = CachedClient::new(inner.clone(), Arc::new(ResponseCache::new(10)));

        client.extract(&build_request("x", PromptVariant::Primary, 100)).await.unwrap();
        client.extract(&build_request("x", PromptVariant::Simplified, 100)).await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let inner = Arc::new(Counting::new(true, 0));
        let cache = Arc::new(ResponseCache::new(10));
        let client = CachedClient::new(inner.clone(), cache.clone());
        let req = build_request("x", PromptVariant::Primary, 100);

        assert!(client.extract(&req).await.is_err());
        assert!(client.extract(&req).await.is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_responses_are_not_cached() {
        let inner = Arc::new(Counting::new(false, 2));
        let cache = Arc::new(ResponseCache::new(10));
        let client = CachedClient::new(inner.clone(), cache.clone());
        let req = build_request("COURT NO. 1", PromptVariant::Primary, 100);

        assert!(client.extract(&req).await.unwrap().starts_with("Sorry"));
        assert!(client.extract(&req).await.unwrap().starts_with("Sorry"));
        assert!(cache.is_empty());

        let readable = client.extract(&req).await.unwrap();
        assert!(readable.contains("primary#2"));
        assert_eq!(client.extract(&req).await.unwrap(), readable);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_eviction_keeps_cache_bounded() {
        let cache = ResponseCache::new(4);
        for i in 0..20 {
            let req = build_request(&format!("doc {i}"), PromptVariant::Primary, 100);
            cache.set(&req, i.to_string());
        }
        assert!(cache.len() <= 4);
    }

    #[test]
    fn test_zero_capacity_disables_cache() {
        let cache = ResponseCache::new(0);
        cache.set(&build_request("x", PromptVariant::Primary, 100), "y".into());
        assert!(cache.is_empty());
    }
}
