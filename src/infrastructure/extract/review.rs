//! Review block extraction.
//!
//! Composes the field resolver and normalizers across every field of one
//! review block. The acceptance rule filters decorative blocks: a record is
//! kept iff its normalized body text or its rating is non-empty.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};
use tracing::debug;

use crate::domain::record::ReviewRecord;

use super::error::ExtractResult;
use super::normalize;
use super::resolve;
use super::selectors::ReviewSelectors;

static DT: Lazy<Selector> = Lazy::new(|| Selector::parse("dt").expect("static selector"));
static DD: Lazy<Selector> = Lazy::new(|| Selector::parse("dd").expect("static selector"));

const SIZE_KEYS: &[&str] = &["사이즈", "size", "SIZE", "크기"];
const COLOR_KEYS: &[&str] = &["색상", "컬러", "color", "COLOR"];
const VARIANT_ANCHOR: &str = "제품 선택:";

/// Extractor for review blocks, holding the compiled fallback chains.
pub struct ReviewExtractor {
    block: Vec<Selector>,
    date: Vec<Selector>,
    rating: Vec<Selector>,
    option_block: Vec<Selector>,
    option_list: Vec<Selector>,
    body: Vec<Selector>,
    reviewer: Vec<Selector>,
    images: Vec<Selector>,
    total_count: Vec<Selector>,
}

impl ReviewExtractor {
    pub fn new(selectors: &ReviewSelectors) -> ExtractResult<Self> {
        Ok(Self {
            block: resolve::compile_strategy("review.block", &selectors.block)?,
            date: resolve::compile_strategy("review.date", &selectors.date)?,
            rating: resolve::compile_strategy("review.rating", &selectors.rating)?,
            option_block: resolve::compile_strategy("review.option_block", &selectors.option_block)?,
            option_list: resolve::compile_strategy("review.option_list", &selectors.option_list)?,
            body: resolve::compile_strategy("review.body", &selectors.body)?,
            reviewer: resolve::compile_strategy("review.reviewer", &selectors.reviewer)?,
            images: resolve::compile_strategy("review.images", &selectors.images)?,
            total_count: resolve::compile_strategy("review.total_count", &selectors.total_count)?,
        })
    }

    /// Locate the review blocks of a page: first block selector matching at
    /// least one element wins.
    pub fn blocks<'a>(&self, root: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        resolve::resolve_block_set(root, &self.block)
    }

    /// Site-reported total review count, when the page exposes one.
    pub fn on_page_total(&self, root: ElementRef<'_>) -> Option<usize> {
        resolve::resolve_parsed(root, &self.total_count, |text| {
            normalize::digits_only(text).and_then(|d| d.parse().ok())
        })
    }

    /// Extract one review record from a block.
    ///
    /// Returns `None` when the block fails the acceptance rule (empty body
    /// and empty rating). Individual field misses never abort the record.
    pub fn extract(
        &self,
        block: ElementRef<'_>,
        product_id: &str,
        product_title: &str,
    ) -> Option<ReviewRecord> {
        let written_at = resolve::resolve_parsed(block, &self.date, normalize::normalize_date);
        let rating = resolve::resolve_text(block, &self.rating)
            .and_then(|t| normalize::normalize_rating(&t));
        let body_text = resolve::resolve_text(block, &self.body).unwrap_or_default();
        let reviewer_note = resolve::resolve_text(block, &self.reviewer);
        let image_urls = resolve::resolve_attr_set(block, &self.images, "src");
        let (variant_name, variant_size, variant_color) = self.extract_variant(block);

        if body_text.is_empty() && rating.is_none() {
            debug!(product_id, "dropping review block with no body and no rating");
            return None;
        }

        Some(ReviewRecord {
            product_id: product_id.to_string(),
            written_at,
            rating,
            variant_name,
            variant_size,
            variant_color,
            body_text,
            reviewer_note,
            image_urls,
            product_title: product_title.to_string(),
        })
    }

    /// Pull variant name/size/color out of the purchased-option block.
    ///
    /// Size and color come from the dt/dd pairs of the embedded definition
    /// list; the variant name is whatever text remains outside that list,
    /// anchored at the `제품 선택:` phrase when present.
    fn extract_variant(
        &self,
        block: ElementRef<'_>,
    ) -> (Option<String>, Option<String>, Option<String>) {
        let Some(option_el) = resolve::resolve_element(block, &self.option_block) else {
            return (None, None, None);
        };
        let full_text = normalize::collapse_text(&option_el.text().collect::<String>());

        let mut variant_size = None;
        let mut variant_color = None;
        let mut list_text = String::new();
        if let Some(dl) = resolve::resolve_element(option_el, &self.option_list) {
            for (dt, dd) in dl.select(&DT).zip(dl.select(&DD)) {
                let key = normalize::collapse_text(&dt.text().collect::<String>()).replace(':', "");
                let value = normalize::non_empty_text(&dd.text().collect::<String>());
                if variant_size.is_none() && SIZE_KEYS.contains(&key.as_str()) {
                    variant_size = value;
                } else if variant_color.is_none() && COLOR_KEYS.contains(&key.as_str()) {
                    variant_color = value;
                }
            }
            list_text = normalize::collapse_text(&dl.text().collect::<String>());
        }

        let remainder = if list_text.is_empty() {
            full_text
        } else {
            full_text.replace(&list_text, "")
        };
        let variant_name = match remainder.find(VARIANT_ANCHOR) {
            Some(at) => normalize::non_empty_text(&remainder[at + VARIANT_ANCHOR.len()..]),
            None => normalize::non_empty_text(&remainder),
        };

        (variant_name, variant_size, variant_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn extractor() -> ReviewExtractor {
        ReviewExtractor::new(&ReviewSelectors::default()).unwrap()
    }

    const FULL_REVIEW: &str = r#"
        <li class="BnwL_cs1av">
          <div class="_1_XCKE2RrJ">구매자** 산 지 한달</div>
          <span class="_2L3vDiadT9">24.03.05.</span>
          <em class="_15NU42F3kT">5</em>
          <div class="_2FXNMst_ak">
            제품 선택: 기모 맨투맨
            <dl class="XbGQRlzveO">
              <dt>사이즈:</dt><dd>L</dd>
              <dt>색상:</dt><dd>네이비</dd>
            </dl>
          </div>
          <div class="_1kMfD5ErZ6"><span class="_2L3vDiadT9">
            두껍고   따뜻해요.
            재구매 의사 있어요.
          </span></div>
          <div class="_2389dRohZq">
            <img src="https://img.example.com/r1a.jpg">
            <img src="https://img.example.com/r1b.jpg">
          </div>
        </li>
    "#;

    #[test]
    fn extracts_every_field_from_a_full_block() {
        let html = Html::parse_document(FULL_REVIEW);
        let ex = extractor();
        let blocks = ex.blocks(html.root_element());
        assert_eq!(blocks.len(), 1);

        let record = ex.extract(blocks[0], "cafe0123", "기모 맨투맨").unwrap();
        assert_eq!(record.written_at.as_deref(), Some("20240305"));
        assert_eq!(record.rating.as_deref(), Some("5"));
        assert_eq!(record.variant_size.as_deref(), Some("L"));
        assert_eq!(record.variant_color.as_deref(), Some("네이비"));
        assert_eq!(record.variant_name.as_deref(), Some("기모 맨투맨"));
        assert_eq!(record.body_text, "두껍고 따뜻해요. 재구매 의사 있어요.");
        assert_eq!(record.image_urls.len(), 2);
        assert_eq!(record.product_id, "cafe0123");
    }

    #[test]
    fn block_with_no_body_and_no_rating_is_dropped() {
        let html = Html::parse_document(
            r#"<li class="BnwL_cs1av"><span class="_2L3vDiadT9">24.01.01.</span></li>"#,
        );
        let ex = extractor();
        let blocks = ex.blocks(html.root_element());
        assert!(ex.extract(blocks[0], "id", "t").is_none());
    }

    #[test]
    fn rating_only_block_is_kept() {
        let html = Html::parse_document(
            r#"<li class="BnwL_cs1av"><em class="_15NU42F3kT">4</em></li>"#,
        );
        let ex = extractor();
        let blocks = ex.blocks(html.root_element());
        let record = ex.extract(blocks[0], "id", "t").unwrap();
        assert_eq!(record.rating.as_deref(), Some("4"));
        assert!(record.body_text.is_empty());
    }

    #[test]
    fn drifted_markup_falls_back_to_substring_selectors() {
        let html = Html::parse_document(
            r#"
            <div class="review_item_v2">
              <em class="rating_star">5</em>
              <span class="date_created">2024-02-10</span>
              <p class="content_body">사이즈 딱 맞아요</p>
            </div>
            "#,
        );
        let ex = extractor();
        let blocks = ex.blocks(html.root_element());
        assert_eq!(blocks.len(), 1);
        let record = ex.extract(blocks[0], "id", "t").unwrap();
        assert_eq!(record.written_at.as_deref(), Some("20240210"));
        assert_eq!(record.body_text, "사이즈 딱 맞아요");
    }

    #[test]
    fn unparseable_date_degrades_to_absent_without_losing_the_record() {
        let html = Html::parse_document(
            r#"
            <li class="BnwL_cs1av">
              <span class="_2L3vDiadT9">어제</span>
              <div class="_1kMfD5ErZ6"><span class="_2L3vDiadT9">좋아요</span></div>
            </li>
            "#,
        );
        let ex = extractor();
        let blocks = ex.blocks(html.root_element());
        let record = ex.extract(blocks[0], "id", "t").unwrap();
        assert!(record.written_at.is_none());
        assert_eq!(record.body_text, "좋아요");
    }

    #[test]
    fn on_page_total_strips_thousands_separators() {
        let html = Html::parse_document(
            r#"<div><span class="review_count_total">리뷰 1,814개</span></div>"#,
        );
        let ex = extractor();
        assert_eq!(ex.on_page_total(html.root_element()), Some(1814));
    }
}
