//! second-opinion - ask several OpenRouter models the same question at once.
//!
//! ## Architecture
//!
//! - **Dispatcher**: fans one query out to every configured model
//!   concurrently, retries suspiciously short answers once, and isolates
//!   failures per model
//! - **Report**: merges the per-model outcomes into Markdown and a
//!   structured summary
//! - **Tools**: code review, approach comparison, fact-checking and friends,
//!   each a thin prompt transform over the dispatcher
//! - **Server**: exposes the tools over MCP on stdio
//!
//! ## Failure model
//!
//! - A missing credential stops the process before anything is served
//! - A failing model becomes an inline `> Error: ...` block, never a failed call
//! - Catalog lookups are best-effort and fail on their own

pub mod client;
pub mod dispatch;
pub mod models;
pub mod report;
pub mod server;
pub mod tools;

// Re-exports for convenience
pub use client::{CatalogCache, ChatBackend, ModelCatalog, ModelInfo, OpenRouterClient};
pub use dispatch::{DispatchSettings, Dispatcher};
pub use models::{
    BackendOutcome, BackendTarget, Config, QueryRequest, Result, SecondOpinionError,
};
pub use report::{AggregateSummary, build_summary, format_results};
pub use server::McpServer;
pub use tools::{ToolOutput, Toolbox};
