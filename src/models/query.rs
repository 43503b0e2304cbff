//! Query types: what goes out to the backends.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker placed between prepended context and the query text.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Opaque identifier for a remote model, e.g. `openai/gpt-5.2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackendTarget(String);

impl BackendTarget {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BackendTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BackendTarget {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for BackendTarget {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One logical query, fanned out to every resolved target.
///
/// Built once with the `with_*` methods and then only read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question or prompt
    pub query: String,

    /// Text prepended to the query (code, documents, history)
    #[serde(default)]
    pub context: Option<String>,

    /// Instruction sent as a separate leading system message
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Targets replacing the configured defaults for this request
    #[serde(default)]
    pub models: Option<Vec<BackendTarget>>,

    /// Sampling temperature in [0, 2]
    #[serde(default)]
    pub temperature: Option<f64>,

    /// Max output tokens per target
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: Option<String>) -> Self {
        self.system_prompt = system_prompt;
        self
    }

    pub fn with_models(mut self, models: Option<Vec<BackendTarget>>) -> Self {
        self.models = models;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f64>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// User message content: context first, then the query.
    ///
    /// An empty context is the same as no context.
    pub fn user_content(&self) -> String {
        match self.context.as_deref() {
            Some(context) if !context.is_empty() => {
                format!("{context}{CONTEXT_SEPARATOR}{}", self.query)
            }
            _ => self.query.clone(),
        }
    }

    /// System instruction, if a non-empty one was given.
    pub fn system_instruction(&self) -> Option<&str> {
        self.system_prompt.as_deref().filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_content_without_context() {
        let request = QueryRequest::new("explain recursion");
        assert_eq!(request.user_content(), "explain recursion");
    }

    #[test]
    fn test_user_content_puts_context_first() {
        let request = QueryRequest::new("what does this do?").with_context(Some("fn main() {}".into()));
        assert_eq!(
            request.user_content(),
            "fn main() {}\n\n---\n\nwhat does this do?"
        );
    }

    #[test]
    fn test_empty_context_and_system_prompt_are_ignored() {
        let request = QueryRequest::new("q")
            .with_context(Some(String::new()))
            .with_system_prompt(Some(String::new()));
        assert_eq!(request.user_content(), "q");
        assert_eq!(request.system_instruction(), None);
    }

    #[test]
    fn test_target_serializes_as_plain_string() {
        let targets = vec![BackendTarget::from("a/b"), BackendTarget::new("c")];
        assert_eq!(serde_json::to_string(&targets).unwrap(), r#"["a/b","c"]"#);
        assert_eq!(targets[0].to_string(), "a/b");
    }
}
