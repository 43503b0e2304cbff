//! Human-readable merge of per-target outcomes.

use crate::models::{BackendOutcome, OutcomeBody};
use std::borrow::Cow;

/// Separator between per-target blocks.
pub const BLOCK_SEPARATOR: &str = "\n\n---\n\n";

/// Render one `### target` block per outcome, in input order.
///
/// Failed targets render as a quoted `> Error: ...` line. An empty input
/// renders as an empty string.
pub fn format_results(outcomes: &[BackendOutcome]) -> String {
    outcomes
        .iter()
        .map(format_block)
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

fn format_block(outcome: &BackendOutcome) -> String {
    let body: Cow<'_, str> = match &outcome.body {
        OutcomeBody::Response(text) => Cow::Borrowed(text),
        OutcomeBody::Error(message) => Cow::Owned(format!("> Error: {message}")),
        OutcomeBody::Empty => Cow::Borrowed(""),
    };
    format!("### {}\n\n{body}", outcome.target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_success() {
        let outcomes = [BackendOutcome::success("openai/gpt-4o", "Use a hash map.")];
        assert_eq!(format_results(&outcomes), "### openai/gpt-4o\n\nUse a hash map.");
    }

    #[test]
    fn test_single_error_is_quoted() {
        let outcomes = [BackendOutcome::failure("a", "timeout")];
        assert_eq!(format_results(&outcomes), "### a\n\n> Error: timeout");
    }

    #[test]
    fn test_blocks_joined_with_rule() {
        let outcomes = [
            BackendOutcome::success("a", "Answer A"),
            BackendOutcome::success("b", "Answer B"),
        ];
        assert_eq!(
            format_results(&outcomes),
            "### a\n\nAnswer A\n\n---\n\n### b\n\nAnswer B"
        );
    }

    #[test]
    fn test_mixed_success_and_error() {
        let outcomes = [
            BackendOutcome::success("model-a", "OK"),
            BackendOutcome::failure("model-b", "rate limited"),
        ];
        assert_eq!(
            format_results(&outcomes),
            "### model-a\n\nOK\n\n---\n\n### model-b\n\n> Error: rate limited"
        );
    }

    #[test]
    fn test_empty_input_renders_nothing() {
        assert_eq!(format_results(&[]), "");
    }

    #[test]
    fn test_outcome_without_body_renders_empty() {
        let outcomes = [BackendOutcome::empty("model-a")];
        assert_eq!(format_results(&outcomes), "### model-a\n\n");
    }

    #[test]
    fn test_rendering_is_repeatable() {
        let outcomes = [
            BackendOutcome::success("a", "x").with_latency(5),
            BackendOutcome::failure("b", "y"),
        ];
        assert_eq!(format_results(&outcomes), format_results(&outcomes));
    }
}
