//! Error types for second-opinion.
//!
//! Taxonomy:
//! - Expected failures: bad configuration, invalid tool input
//! - Infrastructure failures: network, timeout, upstream status codes
//! - Internal invariant violations (bugs)

use thiserror::Error;

/// Top-level error type for second-opinion.
#[derive(Debug, Error)]
pub enum SecondOpinionError {
    // ═══════════════════════════════════════════════════════════════════
    // EXPECTED: caller or operator supplied something unusable
    // ═══════════════════════════════════════════════════════════════════
    #[error("Configuration error: {0}")]
    Config(#[from] super::ConfigError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    // ═══════════════════════════════════════════════════════════════════
    // INFRASTRUCTURE: the remote side or the network let us down
    // ═══════════════════════════════════════════════════════════════════
    #[error("OpenRouter API error: {0}")]
    OpenRouterApi(#[from] OpenRouterError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request timeout after {0:?}")]
    Timeout(std::time::Duration),

    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // ═══════════════════════════════════════════════════════════════════
    // INTERNAL: should not happen
    // ═══════════════════════════════════════════════════════════════════
    #[error("Internal error: {0}")]
    Internal(String),
}

/// OpenRouter API specific errors.
#[derive(Debug, Error)]
pub enum OpenRouterError {
    #[error("Authentication failed: invalid API key")]
    AuthenticationFailed,

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Carries the upstream message, with any retry-after hint folded in
    #[error("Rate limited by OpenRouter: {0}")]
    RateLimited(String),

    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("OpenRouter /models returned {0}")]
    CatalogStatus(u16),
}

impl SecondOpinionError {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Result type alias for second-opinion.
pub type Result<T> = std::result::Result<T, SecondOpinionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_status_names_the_code() {
        let err = SecondOpinionError::from(OpenRouterError::CatalogStatus(503));
        assert!(err.to_string().contains("/models returned 503"));
    }

    #[test]
    fn test_rate_limit_message_is_kept() {
        let err = SecondOpinionError::from(OpenRouterError::RateLimited(
            "slow down (retry after 2s)".to_string(),
        ));
        assert_eq!(
            err.to_string(),
            "OpenRouter API error: Rate limited by OpenRouter: slow down (retry after 2s)"
        );
    }
}
