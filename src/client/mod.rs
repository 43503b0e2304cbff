//! OpenRouter client module.

mod backend;
mod catalog;
mod openrouter;

pub use backend::*;
pub use catalog::*;
pub use openrouter::*;
