//! HTML extraction: selector strategies, field resolution and record
//! assembly.
//!
//! Every logical field is located through an ordered fallback chain of CSS
//! selectors ([`selectors::SelectorConfig`]); the generic resolver in
//! [`resolve`] short-circuits on the first non-empty match. Field misses
//! degrade to `None` and never abort extraction of the remaining fields.

pub mod error;
pub mod normalize;
pub mod product;
pub mod resolve;
pub mod review;
pub mod selectors;

pub use error::{ExtractError, ExtractResult};
pub use product::ProductExtractor;
pub use review::ReviewExtractor;
