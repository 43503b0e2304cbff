//! Fixed system instructions for the specialised tools.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const SECURITY_REVIEW_PROMPT: &str = "You are a security-focused code reviewer. Identify vulnerabilities, injection risks, auth issues, and insecure patterns. Be specific about the risk and how to fix it.";

pub const PERFORMANCE_REVIEW_PROMPT: &str = "You are a performance-focused code reviewer. Identify bottlenecks, unnecessary allocations, missing caching opportunities, and algorithmic inefficiencies. Suggest concrete fixes.";

pub const STYLE_REVIEW_PROMPT: &str = "You are a code style reviewer. Check for naming conventions, consistency, readability, dead code, and adherence to language idioms. Suggest improvements.";

pub const BUGS_REVIEW_PROMPT: &str = "You are a bug-hunting code reviewer. Look for logic errors, off-by-one mistakes, null/undefined risks, race conditions, and unhandled edge cases. Explain each bug clearly.";

pub const COMPARE_APPROACHES_PROMPT: &str = "You are a technical decision advisor. Compare the given approaches objectively. For each, list pros, cons, and best-fit scenarios. End with a clear recommendation and rationale.";

pub const FACT_CHECK_PROMPT: &str = "You are a fact-checker. Evaluate the given claim for accuracy. Cite sources or reasoning. State whether the claim is true, false, partially true, or unverifiable, and explain why.";

/// What a code review should concentrate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewFocus {
    Security,
    Performance,
    Style,
    Bugs,
}

impl ReviewFocus {
    pub const ALL: [ReviewFocus; 4] = [
        ReviewFocus::Security,
        ReviewFocus::Performance,
        ReviewFocus::Style,
        ReviewFocus::Bugs,
    ];

    pub fn system_prompt(self) -> &'static str {
        match self {
            ReviewFocus::Security => SECURITY_REVIEW_PROMPT,
            ReviewFocus::Performance => PERFORMANCE_REVIEW_PROMPT,
            ReviewFocus::Style => STYLE_REVIEW_PROMPT,
            ReviewFocus::Bugs => BUGS_REVIEW_PROMPT,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReviewFocus::Security => "security",
            ReviewFocus::Performance => "performance",
            ReviewFocus::Style => "style",
            ReviewFocus::Bugs => "bugs",
        }
    }
}

impl fmt::Display for ReviewFocus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
