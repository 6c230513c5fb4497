//! Validation pipeline
//!
//! Applies property schemas to raw input: required-ness, defaults, writer
//! ACLs, data type parsing and custom validators.

mod checks;
mod pipeline;

use chrono::{DateTime, Utc};

pub use checks::{evaluate_all, Check};
pub use pipeline::Validator;
pub(crate) use pipeline::check_declared;

/// Inputs a custom validator may depend on besides the value itself
///
/// Time-dependent rules read `now` from here rather than the wall clock, so
/// validating the same input in the same invocation always gives the same
/// answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationContext {
    pub now: DateTime<Utc>,
}

impl ValidationContext {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}
