use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::error::ClientError;
use crate::prompt::ExtractionRequest;

/// The external text-understanding service.
///
/// Implementations only deal with transport: they hand back whatever text the
/// service produced, valid JSON or not.
#[async_trait]
pub trait ExtractionClient: Send + Sync {
    async fn extract(&self, request: &ExtractionRequest) -> Result<String, ClientError>;

    fn name(&self) -> &str;
}

fn check_status(service: &str, status: StatusCode) -> Result<(), ClientError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ClientError::RateLimited(format!("{service} returned {status}")));
    }
    if !status.is_success() {
        return Err(ClientError::Transport(format!("{service} request failed: {status}")));
    }
    Ok(())
}

#[derive(Clone)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    format: String, // "json" for structured output
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            base_url,
            model,
            client: reqwest::Client::new(),
        }
    }

    pub fn default() -> Self {
        Self::new(
            "http://localhost:11434".to_string(),
            "llama3".to_string(),
        )
    }
}

#[async_trait]
impl ExtractionClient for OllamaClient {
    async fn extract(&self, request: &ExtractionRequest) -> Result<String, ClientError> {
        let url = format!("{}/api/generate", self.base_url);

        let body = OllamaRequest {
            model: self.model.clone(),
            prompt: request.prompt.clone(),
            stream: false,
            format: "json".to_string(), // Force JSON output
            options: OllamaOptions {
                temperature: request.temperature,
            },
        };

        let response = self.client.post(&url).json(&body).send().await?;
        check_status("Ollama", response.status())?;

        let ollama_response: OllamaResponse = response.json().await?;
        Ok(ollama_response.response)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Gemini `generateContent` over HTTPS with an API key.
#[derive(Clone)]
pub struct GeminiClient {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize, Deserialize, Default)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    response_mime_type: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: GeminiContent,
}

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-1.5-flash";

impl GeminiClient {
    pub fn new(base_url: String, model: String, api_key: String) -> Self {
        Self {
            base_url,
            model,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Build from `GEMINI_API_KEY` and optional `GEMINI_MODEL`.
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| anyhow::anyhow!("GEMINI_API_KEY environment variable must be set"))?;
        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| GEMINI_DEFAULT_MODEL.to_string());
        Ok(Self::new(GEMINI_BASE_URL.to_string(), model, api_key))
    }

    fn build_body(request: &ExtractionRequest) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: request.prompt.clone(),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: request.temperature,
                response_mime_type: "application/json".to_string(),
            },
        }
    }

    fn response_text(response: GeminiResponse) -> String {
        response
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl ExtractionClient for GeminiClient {
    async fn extract(&self, request: &ExtractionRequest) -> Result<String, ClientError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&Self::build_body(request))
            .send()
            .await?;
        check_status("Gemini", response.status())?;

        let gemini_response: GeminiResponse = response.json().await?;
        Ok(Self::response_text(gemini_response))
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Tries `primary`, and on any failure repeats the same request against `secondary`.
#[derive(Clone)]
pub struct FallbackClient {
    primary: Arc<dyn ExtractionClient>,
    secondary: Arc<dyn ExtractionClient>,
}

impl FallbackClient {
    pub fn new(primary: Arc<dyn ExtractionClient>, secondary: Arc<dyn ExtractionClient>) -> Self {
        Self { primary, secondary }
    }
}

#[async_trait]
impl ExtractionClient for FallbackClient {
    async fn extract(&self, request: &ExtractionRequest) -> Result<String, ClientError> {
        match self.primary.extract(request).await {
            Ok(text) => Ok(text),
            Err(e) => {
                warn!(
                    primary = self.primary.name(),
                    secondary = self.secondary.name(),
                    error = %e,
                    "Primary backend failed, falling back"
                );
                self.secondary.extract(request).await
            }
        }
    }

    fn name(&self) -> &str {
        self.primary.name()
    }
}
