//! Crawl-level error taxonomy.
//!
//! Field-level misses are not errors at all (the resolver returns `None` and
//! extraction continues); everything here is either recoverable at product
//! granularity by the retry supervisor or fatal to the whole run.

use thiserror::Error;

use super::session::SessionError;

#[derive(Error, Debug)]
pub enum CrawlError {
    /// Unexpected session failure inside a product's crawl. Recoverable:
    /// the supervisor resets the session and retries the product.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The caller handed us a URL the engine cannot resolve against the
    /// storefront base. Fatal for this target, surfaced before any session
    /// work happens.
    #[error("invalid target url '{url}': {reason}")]
    InvalidTarget { url: String, reason: String },

    /// The session could not be brought back up between retry attempts.
    /// Fatal: without a session no further product can be crawled either.
    #[error("session could not be re-established after attempt {attempt}")]
    SessionResetFailed {
        attempt: u32,
        #[source]
        source: SessionError,
    },
}

impl CrawlError {
    pub fn invalid_target(url: &str, reason: impl Into<String>) -> Self {
        Self::InvalidTarget {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this error must abort the enclosing multi-product run
    /// instead of merely abandoning the current product.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            Self::SessionResetFailed { .. } | Self::InvalidTarget { .. }
        )
    }
}
