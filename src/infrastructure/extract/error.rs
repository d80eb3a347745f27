//! Extraction error types.
//!
//! Note the narrow scope: a field that no selector matches is *not* an
//! error, it is an absent value. Errors here only cover broken selector
//! configuration, which is a deployment problem and not markup drift.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ExtractError {
    #[error("no usable selector in the fallback chain for '{field}'")]
    EmptyStrategy { field: String },
}

impl ExtractError {
    pub fn empty_strategy(field: &str) -> Self {
        Self::EmptyStrategy {
            field: field.to_string(),
        }
    }
}

pub type ExtractResult<T> = Result<T, ExtractError>;
