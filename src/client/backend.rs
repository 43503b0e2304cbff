//! The remote chat-completion seam.
//!
//! The dispatcher only needs "send these messages to this model, within this
//! timeout". `OpenRouterClient` is the production implementation; tests
//! substitute scripted backends.

use crate::models::{BackendTarget, Result, TokenUsage};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Message in a chat completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Chat completion request payload.
///
/// Unset sampling options are left out of the JSON entirely so the backend
/// applies its own defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: BackendTarget,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// What a backend returned for one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatReply {
    /// First candidate's content; `None` when the backend sent no content
    pub content: Option<String>,
    /// Token usage, when reported
    pub usage: TokenUsage,
}

impl ChatReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }
}

/// A remote model endpoint that answers chat completions.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Issue one chat completion call, failing with a descriptive error.
    async fn complete(&self, request: &ChatRequest, timeout: Duration) -> Result<ChatReply>;
}
