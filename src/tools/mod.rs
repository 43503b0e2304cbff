//! Tools module - the operations exposed to an assistant.

mod operations;
mod prompts;

pub use operations::*;
pub use prompts::*;
