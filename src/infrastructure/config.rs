//! Crawl configuration.
//!
//! All limits and selector chains live here as plain serde data so a
//! deployment can override them from a JSON file when the storefront ships
//! another round of regenerated class names, without rebuilding the crate.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::extract::selectors::SelectorConfig;

/// Engine configuration for one crawl run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Base URL relative product paths resolve against.
    pub base_url: String,

    /// Hard cap on review pages per product. `None` crawls until another
    /// termination signal fires.
    pub max_pages: Option<u32>,

    /// Pages in a row that may yield zero usable records before pagination
    /// gives up.
    pub consecutive_empty_threshold: u32,

    /// Full-pipeline attempts per product before the product is abandoned.
    pub max_attempts: u32,

    /// Delay before a session reset and retry, in milliseconds.
    pub retry_delay_ms: u64,

    /// Upper bound for every render-readiness wait, in milliseconds.
    pub wait_timeout_ms: u64,

    /// Fallback selector chains for every logical field.
    pub selectors: SelectorConfig,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: "https://brand.naver.com".to_string(),
            max_pages: None,
            consecutive_empty_threshold: 2,
            max_attempts: 3,
            retry_delay_ms: 5_000,
            wait_timeout_ms: 10_000,
            selectors: SelectorConfig::default(),
        }
    }
}

impl CrawlConfig {
    /// Load configuration from a JSON file; missing keys fall back to the
    /// built-in defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_match_observed_crawler_behavior() {
        let config = CrawlConfig::default();
        assert_eq!(config.consecutive_empty_threshold, 2);
        assert_eq!(config.max_attempts, 3);
        assert!(config.max_pages.is_none());
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let config: CrawlConfig = serde_json::from_str(r#"{"max_pages": 5}"#).unwrap();
        assert_eq!(config.max_pages, Some(5));
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.base_url, "https://brand.naver.com");
    }
}
