//! Server module - MCP over stdio.

mod mcp;
pub mod protocol;
pub mod schema;

pub use mcp::*;
