//! Dispatch module - concurrent fan-out to every target.

mod dispatcher;
#[cfg(test)]
pub(crate) mod scripted;

pub use dispatcher::*;
