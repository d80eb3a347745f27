//! Resilient product and review extraction engine for JavaScript-rendered
//! storefront pages.
//!
//! The storefront's markup is unstable across deployments (generated class
//! names that change periodically), so every logical field is located through
//! an ordered chain of fallback selectors rather than a single query. The
//! engine drives a caller-supplied [`Session`] through a paginated review
//! list, extracts and normalizes records per page, deduplicates them across
//! pages, and wraps the whole per-product pipeline in a bounded retry with
//! session reset.
//!
//! Session lifecycle (driver bootstrap, headless flags), URL discovery and
//! persistence are the caller's concern; this crate only consumes the
//! [`Session`] trait and hands back record batches.

pub mod domain;
pub mod infrastructure;

pub use domain::identity::identity;
pub use domain::record::{EvaluationEntry, ProductRecord, ReviewRecord};
pub use infrastructure::config::CrawlConfig;
pub use infrastructure::crawler::{ProductCrawlOutcome, ProductCrawler};
pub use infrastructure::error::CrawlError;
pub use infrastructure::pagination::StopReason;
pub use infrastructure::session::{Session, SessionError, SessionResult};
