//! Browser session collaborator contract.
//!
//! The engine never creates or tears down a rendering session itself; the
//! caller supplies an implementation (a WebDriver binding, a headless
//! browser, or a scripted fake in tests) and the engine drives it strictly
//! sequentially. Waits are bounded: `wait_for` polls a readiness predicate
//! until it holds or the timeout elapses, never indefinitely.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by the session collaborator.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("session lost: {0}")]
    Lost(String),

    #[error("could not establish a browser session: {0}")]
    Unavailable(String),
}

impl SessionError {
    pub fn navigation(url: &str, reason: impl Into<String>) -> Self {
        Self::Navigation {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Rendered-page session driven by the crawl engine.
///
/// All methods take `&mut self`: the session holds browser state (current
/// page, click targets) that is not safely shareable, and the engine owns it
/// exclusively for the duration of one supervised crawl.
#[async_trait]
pub trait Session: Send {
    /// Navigate to `url` and wait for the initial render.
    async fn load(&mut self, url: &str) -> SessionResult<()>;

    /// Current rendered markup of the page.
    async fn content(&mut self) -> SessionResult<String>;

    /// Trimmed visible texts of every element matching `selector`,
    /// in document order.
    async fn element_texts(&mut self, selector: &str) -> SessionResult<Vec<String>>;

    /// Scroll the `index`-th element matching `selector` into view and click
    /// it. `Ok(false)` means the element was absent or not interactable;
    /// only session-level failures are errors.
    async fn click_nth(&mut self, selector: &str, index: usize) -> SessionResult<bool>;

    /// Poll until an element matching `selector` is present or `timeout`
    /// elapses. Returns whether the predicate held.
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> SessionResult<bool>;

    /// Tear the underlying browser state down and bring up a fresh session.
    /// Called by the retry supervisor between attempts.
    async fn reset(&mut self) -> SessionResult<()>;
}
