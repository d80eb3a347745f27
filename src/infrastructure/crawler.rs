//! Per-product crawl orchestration.
//!
//! One product pipeline: resolve the target URL, load the page, extract the
//! product record, click into the review section, sort by newest, paginate
//! the review list and deduplicate the harvest. The whole pipeline is one
//! retry unit under the supervisor; a failed attempt discards its partial
//! results and starts over on a fresh session.

use anyhow::Context;
use async_trait::async_trait;
use scraper::Html;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::domain::identity::identity;
use crate::domain::record::{ProductRecord, ReviewRecord};

use super::config::CrawlConfig;
use super::dedup::dedup_reviews;
use super::error::CrawlError;
use super::extract::{ProductExtractor, ReviewExtractor};
use super::pagination::{PageHarvest, PageIterationController, StopReason};
use super::session::Session;
use super::supervisor::{CrawlAttempt, RetrySupervisor};

/// Everything one product crawl produced.
#[derive(Debug)]
pub struct ProductCrawlOutcome {
    pub url: String,
    pub product_id: String,
    /// `None` when the product was abandoned after exhausting retries.
    pub product: Option<ProductRecord>,
    /// Deduplicated reviews in visit order.
    pub reviews: Vec<ReviewRecord>,
    pub pages_visited: u32,
    /// Why review pagination ended; absent for abandoned products.
    pub stop: Option<StopReason>,
}

impl ProductCrawlOutcome {
    fn abandoned(url: &str) -> Self {
        Self {
            url: url.to_string(),
            product_id: identity(url, ""),
            product: None,
            reviews: Vec::new(),
            pages_visited: 0,
            stop: None,
        }
    }
}

/// Crawl engine for one configured storefront.
pub struct ProductCrawler {
    config: CrawlConfig,
    review: ReviewExtractor,
    product: ProductExtractor,
    pagination: PageIterationController,
    supervisor: RetrySupervisor,
}

impl ProductCrawler {
    pub fn new(config: CrawlConfig) -> anyhow::Result<Self> {
        let review = ReviewExtractor::new(&config.selectors.review)
            .context("review selector configuration is unusable")?;
        let product = ProductExtractor::new(&config.selectors.product)
            .context("product selector configuration is unusable")?;
        let pagination = PageIterationController::new(&config);
        let supervisor = RetrySupervisor::new(config.max_attempts, config.retry_delay());
        Ok(Self {
            config,
            review,
            product,
            pagination,
            supervisor,
        })
    }

    /// Resolve a crawl target against the configured base URL. Absolute
    /// http(s) URLs pass through, absolute paths join the base, anything
    /// else is rejected.
    pub fn resolve_target_url(&self, target: &str) -> Result<String, CrawlError> {
        let target = target.trim();
        if target.starts_with("http://") || target.starts_with("https://") {
            let url = Url::parse(target)
                .map_err(|e| CrawlError::invalid_target(target, e.to_string()))?;
            return Ok(url.to_string());
        }
        if target.starts_with('/') {
            let base = Url::parse(&self.config.base_url)
                .map_err(|e| CrawlError::invalid_target(&self.config.base_url, e.to_string()))?;
            let joined = base
                .join(target)
                .map_err(|e| CrawlError::invalid_target(target, e.to_string()))?;
            return Ok(joined.to_string());
        }
        Err(CrawlError::invalid_target(
            target,
            "neither an absolute http(s) url nor an absolute path",
        ))
    }

    /// Crawl one product under retry supervision. `Ok` with an abandoned
    /// outcome means every attempt failed; `Err` means the run cannot
    /// continue at all.
    pub async fn crawl_product(
        &self,
        session: &mut dyn Session,
        target: &str,
    ) -> Result<ProductCrawlOutcome, CrawlError> {
        let url = self.resolve_target_url(target)?;
        let work = ProductAttempt {
            crawler: self,
            url: &url,
        };
        match self.supervisor.run(session, &work).await? {
            Some(outcome) => Ok(outcome),
            None => {
                warn!(url = %url, "product abandoned after exhausting attempts");
                Ok(ProductCrawlOutcome::abandoned(&url))
            }
        }
    }

    /// Crawl a batch of targets sequentially on one session. A target that
    /// fails or gets abandoned never aborts its siblings; only a session
    /// that cannot be re-established ends the run early.
    pub async fn crawl_all(
        &self,
        session: &mut dyn Session,
        targets: &[String],
    ) -> Result<Vec<ProductCrawlOutcome>, CrawlError> {
        let mut outcomes = Vec::with_capacity(targets.len());
        for target in targets {
            match self.crawl_product(session, target).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e @ CrawlError::SessionResetFailed { .. }) => return Err(e),
                Err(e) => {
                    error!(target = %target, error = %e, "skipping target");
                    outcomes.push(ProductCrawlOutcome::abandoned(target));
                }
            }
        }
        Ok(outcomes)
    }

    /// One unsupervised pass through the whole pipeline.
    async fn crawl_once(
        &self,
        session: &mut dyn Session,
        url: &str,
        attempt: u32,
    ) -> Result<ProductCrawlOutcome, CrawlError> {
        info!(url = %url, attempt, "crawling product");
        session.load(url).await?;
        if let Some(title_hint) = self.config.selectors.product.title.first() {
            if !session
                .wait_for(title_hint, self.config.wait_timeout())
                .await?
            {
                warn!(url = %url, "product title did not render within the wait budget");
            }
        }

        let raw = session.content().await?;
        let page_mentions_reviews = raw.contains("REVIEW") || raw.contains("리뷰");
        // Parsing stays inside this block; the parsed tree never crosses an
        // await point.
        let (product_id, title, product) = {
            let html = Html::parse_document(&raw);
            let root = html.root_element();
            let title = self.product.title(root).unwrap_or_default();
            let product_id = identity(url, &title);
            let product = self.product.extract(root, url, &product_id);
            (product_id, title, product)
        };

        let opened = self.open_review_section(session).await?;
        if !opened && !page_mentions_reviews {
            warn!(url = %url, "page has no review section, keeping product only");
            return Ok(ProductCrawlOutcome {
                url: url.to_string(),
                product_id,
                product: Some(product),
                reviews: Vec::new(),
                pages_visited: 0,
                stop: None,
            });
        }
        if opened {
            self.sort_by_newest(session).await?;
        }
        self.settle_reviews(session).await?;

        let outcome = self
            .pagination
            .run(session, |page| self.harvest_page(page, &product_id, &title))
            .await?;

        let reviews = dedup_reviews(outcome.records);
        if let Some(total) = outcome.reported_total {
            if reviews.len() < total {
                debug!(
                    harvested = reviews.len(),
                    reported = total,
                    "harvest ended short of the site-reported total"
                );
            }
        }

        Ok(ProductCrawlOutcome {
            url: url.to_string(),
            product_id,
            product: Some(product),
            reviews,
            pages_visited: outcome.pages_visited,
            stop: Some(outcome.stop),
        })
    }

    fn harvest_page(&self, raw: &str, product_id: &str, product_title: &str) -> PageHarvest {
        let html = Html::parse_document(raw);
        let root = html.root_element();
        let records = self
            .review
            .blocks(root)
            .into_iter()
            .filter_map(|block| self.review.extract(block, product_id, product_title))
            .collect();
        PageHarvest {
            records,
            on_page_total: self.review.on_page_total(root),
        }
    }

    /// Click into the review tab: configured selectors first, then any link
    /// labelled with the localized or literal word for reviews.
    async fn open_review_section(&self, session: &mut dyn Session) -> Result<bool, CrawlError> {
        for selector in &self.config.selectors.navigation.review_tab {
            if session.click_nth(selector, 0).await? {
                debug!(selector = %selector, "opened review section");
                return Ok(true);
            }
        }
        let texts = session.element_texts("a").await?;
        let labelled = texts.iter().position(|t| {
            let t = t.trim();
            t.contains("리뷰") || t.to_ascii_uppercase().contains("REVIEW")
        });
        if let Some(index) = labelled {
            if session.click_nth("a", index).await? {
                debug!("opened review section via link label");
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Switch the review list to newest-first so pagination walks a stable
    /// order. Best effort: a storefront without the control keeps its
    /// default order.
    async fn sort_by_newest(&self, session: &mut dyn Session) -> Result<(), CrawlError> {
        for selector in &self.config.selectors.navigation.sort_newest {
            if session.click_nth(selector, 0).await? {
                debug!("sorted reviews by newest");
                return Ok(());
            }
        }
        let texts = session.element_texts("a").await?;
        if let Some(index) = texts.iter().position(|t| t.trim().contains("최신순")) {
            if session.click_nth("a", index).await? {
                debug!("sorted reviews by newest via link label");
            }
        }
        Ok(())
    }

    async fn settle_reviews(&self, session: &mut dyn Session) -> Result<(), CrawlError> {
        if let Some(hint) = self.config.selectors.review.block.first() {
            session.wait_for(hint, self.config.wait_timeout()).await?;
        }
        Ok(())
    }
}

struct ProductAttempt<'a> {
    crawler: &'a ProductCrawler,
    url: &'a str,
}

#[async_trait]
impl CrawlAttempt for ProductAttempt<'_> {
    type Output = ProductCrawlOutcome;

    async fn attempt(
        &self,
        session: &mut dyn Session,
        attempt: u32,
    ) -> Result<ProductCrawlOutcome, CrawlError> {
        self.crawler.crawl_once(session, self.url, attempt).await
    }
}
