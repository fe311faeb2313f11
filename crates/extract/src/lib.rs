//! Structured extraction of court cause lists through an external
//! text-understanding service.
//!
//! ```text
//! text ─► estimate ─► single-shot ─► prompt ─► client ─► sanitize ─► result
//!                  └► chunks ─► N × (prompt ─► client ─► sanitize) ─► merge ─► result
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod llm;
pub mod merger;
pub mod metrics;
pub mod normalizer;
pub mod orchestrator;
pub mod prompt;
pub mod retry;
pub mod sanitizer;
pub mod schema;

pub use cache::{CachedClient, ResponseCache};
pub use config::ExtractionConfig;
pub use error::{ClientError, ExtractError};
pub use llm::{ExtractionClient, FallbackClient, GeminiClient, OllamaClient};
pub use merger::merge;
pub use metrics::{ExtractionMetrics, MetricsSnapshot};
pub use normalizer::GroupKey;
pub use orchestrator::ExtractionOrchestrator;
pub use prompt::{ExtractionRequest, PromptVariant};
pub use sanitizer::{SanitizePath, sanitize};
pub use schema::{Entry, ExtractionResult, Group};
