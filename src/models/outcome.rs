//! Outcome types: what comes back from each backend.
//!
//! An outcome is created once per target per dispatch and never mutated.

use crate::models::BackendTarget;
use serde::{Deserialize, Serialize};

/// What a target produced.
///
/// A response and an error never coexist. `Empty` exists for outcomes
/// assembled outside the dispatcher that carry neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeBody {
    /// Completion text, possibly empty
    Response(String),
    /// Human-readable failure description
    Error(String),
    /// Neither a response nor an error
    Empty,
}

/// Token counts reported by the backend, each independently optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
}

/// Per-target result of one dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendOutcome {
    /// Target this outcome belongs to
    pub target: BackendTarget,

    /// Response or error
    pub body: OutcomeBody,

    /// Wall time from first request to final completion, in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,

    /// Token usage of the completion whose text is final
    #[serde(default)]
    pub usage: TokenUsage,
}

impl BackendOutcome {
    pub fn success(target: impl Into<BackendTarget>, response: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            body: OutcomeBody::Response(response.into()),
            latency_ms: None,
            usage: TokenUsage::default(),
        }
    }

    pub fn failure(target: impl Into<BackendTarget>, error: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            body: OutcomeBody::Error(error.into()),
            latency_ms: None,
            usage: TokenUsage::default(),
        }
    }

    pub fn empty(target: impl Into<BackendTarget>) -> Self {
        Self {
            target: target.into(),
            body: OutcomeBody::Empty,
            latency_ms: None,
            usage: TokenUsage::default(),
        }
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = Some(latency_ms);
        self
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = usage;
        self
    }

    pub fn response(&self) -> Option<&str> {
        match &self.body {
            OutcomeBody::Response(text) => Some(text),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.body {
            OutcomeBody::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Success means no error, so an `Empty` body counts as success.
    pub fn is_success(&self) -> bool {
        self.error().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors_follow_body() {
        let ok = BackendOutcome::success("a", "hello").with_latency(12);
        assert_eq!(ok.response(), Some("hello"));
        assert_eq!(ok.error(), None);
        assert!(ok.is_success());
        assert_eq!(ok.latency_ms, Some(12));

        let failed = BackendOutcome::failure("b", "timeout");
        assert_eq!(failed.response(), None);
        assert_eq!(failed.error(), Some("timeout"));
        assert!(!failed.is_success());

        let empty = BackendOutcome::empty("c");
        assert_eq!(empty.response(), None);
        assert!(empty.is_success());
    }
}
