//! OpenRouter API client.
//!
//! - OpenRouter speaks the OpenAI chat-completions schema
//! - Every call may fail or time out; failures come back as `Err`
//! - Retrying is the dispatcher's call, so each `complete` is one request

use crate::client::{CatalogSource, ChatBackend, ChatReply, ChatRequest, ModelCatalog};
use crate::models::{
    Config, DEFAULT_BASE_URL, OpenRouterError, Result, SecondOpinionError, TokenUsage,
};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::debug;

/// Chat completion response.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
    /// OpenRouter occasionally reports upstream failures with a 200 status
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
}

/// API error response (OpenAI-compatible).
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    code: Option<serde_json::Value>,
}

/// OpenRouter API client.
///
/// One instance is shared by every concurrent target call; it holds no
/// per-call state.
pub struct OpenRouterClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenRouterClient {
    /// Create a new OpenRouter client.
    pub fn new(api_key: String, base_url: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(SecondOpinionError::Network)?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.api_key.clone(), Some(config.base_url.clone()))
    }

    /// Build headers for a request.
    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| SecondOpinionError::InvalidInput(format!("API key is not a valid header: {e}")))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "HTTP-Referer",
            HeaderValue::from_static("https://github.com/second-opinion/second-opinion"),
        );
        headers.insert("X-Title", HeaderValue::from_static("second-opinion"));
        Ok(headers)
    }

    fn map_send_error(e: reqwest::Error, timeout: Duration) -> SecondOpinionError {
        if e.is_timeout() {
            SecondOpinionError::Timeout(timeout)
        } else {
            SecondOpinionError::Network(e)
        }
    }

    /// Turn a non-success status into the matching error.
    async fn status_error(response: reqwest::Response, model: &str) -> SecondOpinionError {
        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);

        let error = match status {
            401 => OpenRouterError::AuthenticationFailed,
            404 => OpenRouterError::ModelNotFound(model.to_string()),
            429 => OpenRouterError::RateLimited(match retry_after {
                Some(hint) => format!("{message} (retry after {hint})"),
                None => message,
            }),
            _ => OpenRouterError::ApiError { status, message },
        };
        SecondOpinionError::OpenRouterApi(error)
    }
}

#[async_trait]
impl ChatBackend for OpenRouterClient {
    async fn complete(&self, request: &ChatRequest, timeout: Duration) -> Result<ChatReply> {
        let start = Instant::now();
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .timeout(timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| Self::map_send_error(e, timeout))?;

        if !response.status().is_success() {
            return Err(Self::status_error(response, request.model.as_str()).await);
        }

        let body: ChatCompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                SecondOpinionError::Timeout(timeout)
            } else {
                SecondOpinionError::ParseError(format!("Failed to parse response: {e}"))
            }
        })?;

        if let Some(error) = body.error.filter(|_| body.choices.is_empty()) {
            let status = error
                .code
                .as_ref()
                .and_then(|c| c.as_u64())
                .and_then(|c| u16::try_from(c).ok())
                .unwrap_or(200);
            return Err(OpenRouterError::ApiError {
                status,
                message: error.message,
            }
            .into());
        }

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content);

        let usage = body
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        debug!(
            model = %request.model,
            elapsed_ms = start.elapsed().as_millis() as u64,
            has_content = content.is_some(),
            "Completion received"
        );

        Ok(ChatReply { content, usage })
    }
}

#[async_trait]
impl CatalogSource for OpenRouterClient {
    async fn fetch_catalog(&self) -> Result<ModelCatalog> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(OpenRouterError::CatalogStatus(status.as_u16()).into());
        }

        let body = response.text().await?;
        let catalog = ModelCatalog::from_json(&body)?;
        debug!(models = catalog.len(), "Fetched model catalog");
        Ok(catalog)
    }
}
