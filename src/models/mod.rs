//! Core data models for second-opinion.
//!
//! - Configuration resolved from the environment
//! - Error taxonomy
//! - The query going out and the per-target outcomes coming back

mod config;
mod error;
mod outcome;
mod query;

pub use config::*;
pub use error::*;
pub use outcome::*;
pub use query::*;
