//! Report module - merge outcomes into Markdown and a structured summary.
//!
//! Both transforms are pure: same outcomes in, same output out.

mod markdown;
mod summary;

pub use markdown::*;
pub use summary::*;
