//! Review pagination state machine.
//!
//! One page per iteration: fetch the rendered markup, extract, decide
//! whether to stop, then advance. Every termination path is an explicit
//! [`StopReason`]; the controller never spins on a page that stopped
//! changing and never trusts the storefront to run out of page links on
//! its own.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::domain::record::ReviewRecord;

use super::config::CrawlConfig;
use super::error::CrawlError;
use super::session::Session;

/// Why a pagination run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The freshly fetched markup was byte-identical to the previous page:
    /// the advance click did not actually move the view.
    DuplicatePage,
    /// Too many consecutive pages yielded zero usable records.
    EmptyPages,
    /// The configured page cap was reached.
    PageCapReached,
    /// Accumulated record count reached the site-reported total.
    TotalReconciled,
    /// No advance scheme could find anything left to click.
    PaginationExhausted,
}

/// Where the controller currently is in its per-page cycle. The raw markup
/// travels inside the `Extracting` arm so parsing stays between awaits.
enum Phase {
    Fetching,
    Extracting(String),
    Deciding,
    Advancing,
    Done(StopReason),
}

/// What one page's markup yielded.
pub struct PageHarvest {
    pub records: Vec<ReviewRecord>,
    /// Site-reported total review count, when the page exposes one.
    pub on_page_total: Option<usize>,
}

/// Result of a full pagination run over one product's review section.
pub struct PaginationOutcome {
    /// All harvested records in visit order, duplicates still included.
    pub records: Vec<ReviewRecord>,
    pub pages_visited: u32,
    pub stop: StopReason,
    pub reported_total: Option<usize>,
}

/// Labels the storefront uses on its explicit next-page control.
const NEXT_LABELS: &[&str] = &["다음", ">", "next"];

/// Drives the fetch/extract/decide/advance cycle for one review section.
pub struct PageIterationController {
    max_pages: Option<u32>,
    empty_threshold: u32,
    containers: Vec<String>,
    next_controls: Vec<String>,
    /// Selector polled after each advance click to let the next page settle.
    settle_hint: String,
    wait_timeout: Duration,
}

impl PageIterationController {
    pub fn new(config: &CrawlConfig) -> Self {
        let navigation = &config.selectors.navigation;
        Self {
            max_pages: config.max_pages,
            empty_threshold: config.consecutive_empty_threshold,
            containers: navigation.pagination_container.clone(),
            next_controls: navigation.next_control.clone(),
            settle_hint: config
                .selectors
                .review
                .block
                .first()
                .cloned()
                .unwrap_or_else(|| "body".to_string()),
            wait_timeout: config.wait_timeout(),
        }
    }

    /// Run the state machine to completion. `extract_page` is called once
    /// per fetched page with the raw markup and must do all of its parsing
    /// synchronously.
    pub async fn run<F>(
        &self,
        session: &mut dyn Session,
        mut extract_page: F,
    ) -> Result<PaginationOutcome, CrawlError>
    where
        F: FnMut(&str) -> PageHarvest + Send,
    {
        // The page counter is monotonic across the storefront's ten-page
        // pagination windows; labels keep counting past each window.
        let mut current_page: u32 = 1;
        let mut last_raw: Option<String> = None;
        let mut consecutive_empty: u32 = 0;
        let mut records: Vec<ReviewRecord> = Vec::new();
        let mut reported_total: Option<usize> = None;

        let mut phase = Phase::Fetching;
        let stop = loop {
            phase = match phase {
                Phase::Fetching => {
                    let raw = session.content().await?;
                    Phase::Extracting(raw)
                }
                Phase::Extracting(raw) => {
                    if last_raw.as_deref() == Some(raw.as_str()) {
                        warn!(page = current_page, "page did not change after advance");
                        Phase::Done(StopReason::DuplicatePage)
                    } else {
                        let harvest = extract_page(&raw);
                        if harvest.on_page_total.is_some() {
                            reported_total = harvest.on_page_total;
                        }
                        if harvest.records.is_empty() {
                            consecutive_empty += 1;
                        } else {
                            consecutive_empty = 0;
                        }
                        debug!(
                            page = current_page,
                            harvested = harvest.records.len(),
                            total = records.len() + harvest.records.len(),
                            "page extracted"
                        );
                        records.extend(harvest.records);
                        last_raw = Some(raw);
                        Phase::Deciding
                    }
                }
                Phase::Deciding => {
                    if consecutive_empty >= self.empty_threshold {
                        Phase::Done(StopReason::EmptyPages)
                    } else if self.max_pages.is_some_and(|cap| current_page >= cap) {
                        Phase::Done(StopReason::PageCapReached)
                    } else if reported_total.is_some_and(|total| records.len() >= total) {
                        // Reconciliation counts raw harvested records; the
                        // cross-page dedup pass runs after pagination ends.
                        Phase::Done(StopReason::TotalReconciled)
                    } else {
                        Phase::Advancing
                    }
                }
                Phase::Advancing => {
                    if self.advance(session, current_page).await? {
                        current_page += 1;
                        Phase::Fetching
                    } else {
                        Phase::Done(StopReason::PaginationExhausted)
                    }
                }
                Phase::Done(reason) => break reason,
            };
        };

        info!(
            pages = current_page,
            records = records.len(),
            ?stop,
            "pagination finished"
        );
        Ok(PaginationOutcome {
            records,
            pages_visited: current_page,
            stop,
            reported_total,
        })
    }

    /// Try the advance schemes in order: exact numeric label, explicit
    /// next-page control, then the link positioned after the current page's
    /// label. Returns whether any click landed.
    async fn advance(&self, session: &mut dyn Session, current: u32) -> Result<bool, CrawlError> {
        if self.click_numeric_label(session, current + 1).await? {
            return self.settle(session).await;
        }
        if self.click_next_control(session).await? {
            return self.settle(session).await;
        }
        if self.click_following_link(session, current).await? {
            return self.settle(session).await;
        }
        debug!(page = current, "no pagination control left to click");
        Ok(false)
    }

    /// Scheme 1: a link whose trimmed text is exactly the next page number.
    async fn click_numeric_label(
        &self,
        session: &mut dyn Session,
        target: u32,
    ) -> Result<bool, CrawlError> {
        let label = target.to_string();
        for container in &self.containers {
            let selector = format!("{container} a");
            let texts = session.element_texts(&selector).await?;
            if let Some(index) = texts.iter().position(|t| t.trim() == label) {
                if session.click_nth(&selector, index).await? {
                    debug!(target, "advanced via numeric page label");
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Scheme 2: controls with explicit next-page semantics, by class name
    /// first and by link label second.
    async fn click_next_control(&self, session: &mut dyn Session) -> Result<bool, CrawlError> {
        for selector in &self.next_controls {
            if session.click_nth(selector, 0).await? {
                debug!(selector = %selector, "advanced via next control");
                return Ok(true);
            }
        }
        for container in &self.containers {
            let selector = format!("{container} a");
            let texts = session.element_texts(&selector).await?;
            let found = texts.iter().position(|t| {
                let t = t.trim();
                NEXT_LABELS.iter().any(|label| t.eq_ignore_ascii_case(label))
            });
            if let Some(index) = found {
                if session.click_nth(&selector, index).await? {
                    debug!("advanced via next-labelled link");
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Scheme 3: whatever link sits right after the current page's label in
    /// a pagination container.
    async fn click_following_link(
        &self,
        session: &mut dyn Session,
        current: u32,
    ) -> Result<bool, CrawlError> {
        let label = current.to_string();
        for container in &self.containers {
            let selector = format!("{container} a");
            let texts = session.element_texts(&selector).await?;
            if let Some(index) = texts.iter().position(|t| t.trim() == label) {
                if index + 1 < texts.len() && session.click_nth(&selector, index + 1).await? {
                    debug!(page = current, "advanced via link after current label");
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Give the freshly requested page a bounded chance to render. A timeout
    /// is not an error here; the duplicate-page guard catches a page that
    /// truly never changed.
    async fn settle(&self, session: &mut dyn Session) -> Result<bool, CrawlError> {
        let ready = session.wait_for(&self.settle_hint, self.wait_timeout).await?;
        if !ready {
            warn!("next page did not render a review block within the wait budget");
        }
        Ok(true)
    }
}
