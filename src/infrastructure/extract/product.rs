//! Product page extraction.
//!
//! A product record is assembled from three independent sources in priority
//! order: direct structural lookups, a generic label/value table scan over a
//! fixed vocabulary, and free-text phrase anchors in the description
//! sections. Later sources only fill fields the earlier ones left absent;
//! first writer wins, nothing is overwritten.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};
use tracing::debug;

use crate::domain::record::{EvaluationEntry, ProductRecord};

use super::error::ExtractResult;
use super::normalize;
use super::resolve;
use super::selectors::ProductSelectors;

static TH: Lazy<Selector> = Lazy::new(|| Selector::parse("th").expect("static selector"));
static TD: Lazy<Selector> = Lazy::new(|| Selector::parse("td").expect("static selector"));
static NESTED_VALUE: Lazy<Vec<Selector>> = Lazy::new(|| {
    // Emphasis and button cells carry the clean value; the raw cell text is
    // the last resort.
    ["b", "button", "div"]
        .iter()
        .map(|s| Selector::parse(s).expect("static selector"))
        .collect()
});

/// Localized labels recognized by the table scan. Anything else in a table
/// row is ignored rather than hoovered into the record.
const LABEL_VOCABULARY: &[&str] = &[
    "상품번호",
    "상품상태",
    "제조사",
    "브랜드",
    "모델명",
    "이벤트",
    "사은품",
    "원산지",
    "착용계절",
    "디테일",
    "사용대상",
    "여밈방식",
    "핏",
    "종류",
    "주요소재",
    "소매기장",
    "칼라종류",
    "패턴",
    "총기장",
    "영수증발급",
    "A/S 안내",
    "제품소재",
    "색상",
    "치수",
    "제조자(사)",
    "제조국",
    "세탁방법 및 취급시 주의사항",
    "제조연월",
    "품질보증기준",
    "A/S 책임자와 전화번호",
];

/// Label synonyms folded onto one canonical key.
const LABEL_SYNONYMS: &[(&str, &str)] = &[
    ("제조국", "원산지"),
    ("제조자(사)", "제조사"),
    ("제품소재", "주요소재"),
    ("A/S 책임자와 전화번호", "A/S 안내"),
];

/// Phrase anchors scanned in free-text sections: "<anchor>: <value>".
const PHRASE_ANCHORS: &[&str] = &["선택 항목"];

/// Extractor for the product page, holding the compiled fallback chains.
pub struct ProductExtractor {
    title: Vec<Selector>,
    price: Vec<Selector>,
    discount_price: Vec<Selector>,
    discount_note: Vec<Selector>,
    shipping_note: Vec<Selector>,
    evaluation_item: Vec<Selector>,
    evaluation_attribute: Vec<Selector>,
    evaluation_value: Vec<Selector>,
    evaluation_percentage: Vec<Selector>,
    info_table: Vec<Selector>,
    detail_container: Vec<Selector>,
    text_block: Vec<Selector>,
}

impl ProductExtractor {
    pub fn new(selectors: &ProductSelectors) -> ExtractResult<Self> {
        Ok(Self {
            title: resolve::compile_strategy("product.title", &selectors.title)?,
            price: resolve::compile_strategy("product.price", &selectors.price)?,
            discount_price: resolve::compile_strategy(
                "product.discount_price",
                &selectors.discount_price,
            )?,
            discount_note: resolve::compile_strategy(
                "product.discount_note",
                &selectors.discount_note,
            )?,
            shipping_note: resolve::compile_strategy(
                "product.shipping_note",
                &selectors.shipping_note,
            )?,
            evaluation_item: resolve::compile_strategy(
                "product.evaluation_item",
                &selectors.evaluation_item,
            )?,
            evaluation_attribute: resolve::compile_strategy(
                "product.evaluation_attribute",
                &selectors.evaluation_attribute,
            )?,
            evaluation_value: resolve::compile_strategy(
                "product.evaluation_value",
                &selectors.evaluation_value,
            )?,
            evaluation_percentage: resolve::compile_strategy(
                "product.evaluation_percentage",
                &selectors.evaluation_percentage,
            )?,
            info_table: resolve::compile_strategy("product.info_table", &selectors.info_table)?,
            detail_container: resolve::compile_strategy(
                "product.detail_container",
                &selectors.detail_container,
            )?,
            text_block: resolve::compile_strategy("product.text_block", &selectors.text_block)?,
        })
    }

    /// Product title, resolved on its own because the identity digest needs
    /// it before the full record is assembled.
    pub fn title(&self, root: ElementRef<'_>) -> Option<String> {
        resolve::resolve_text(root, &self.title)
    }

    /// Assemble the product record from all three sources.
    pub fn extract(&self, root: ElementRef<'_>, url: &str, product_id: &str) -> ProductRecord {
        let mut record = ProductRecord::new(product_id.to_string(), url.to_string());
        self.apply_structural(root, &mut record);
        self.apply_label_tables(root, &mut record);
        self.apply_text_sections(root, &mut record);
        debug!(
            product_id,
            fields = record.manufacturing_fields.len(),
            "product extraction finished"
        );
        record
    }

    /// Source (a): direct structural field lookups.
    fn apply_structural(&self, root: ElementRef<'_>, record: &mut ProductRecord) {
        record.title = self.title(root);
        record.price = resolve::resolve_parsed(root, &self.price, normalize::digits_only);
        record.discount_price =
            resolve::resolve_parsed(root, &self.discount_price, normalize::digits_only);
        record.discount_note = resolve::resolve_text(root, &self.discount_note);
        record.shipping_note = resolve::resolve_text(root, &self.shipping_note);

        for item in resolve::resolve_block_set(root, &self.evaluation_item) {
            let attribute = resolve::resolve_text(item, &self.evaluation_attribute);
            let value = resolve::resolve_text(item, &self.evaluation_value);
            let percentage = resolve::resolve_parsed(
                item,
                &self.evaluation_percentage,
                normalize::digits_only,
            );
            if let (Some(attribute), Some(value)) = (attribute, value) {
                record
                    .evaluation_breakdown
                    .entry(attribute)
                    .or_insert(EvaluationEntry { value, percentage });
            }
        }
    }

    /// Source (b): label/value table scan over the fixed vocabulary.
    fn apply_label_tables(&self, root: ElementRef<'_>, record: &mut ProductRecord) {
        let tables = resolve::resolve_block_set(root, &self.info_table);
        // With no recognizable table container, scan the whole document's
        // header cells; the vocabulary filter keeps this safe.
        let scopes = if tables.is_empty() { vec![root] } else { tables };

        for scope in scopes {
            for th in scope.select(&TH) {
                let label = normalize::collapse_text(&th.text().collect::<String>());
                if !LABEL_VOCABULARY.contains(&label.as_str()) {
                    continue;
                }
                // A spanning header cell is a section title, not a label.
                let colspan = th
                    .value()
                    .attr("colspan")
                    .and_then(|c| c.parse::<u32>().ok())
                    .unwrap_or(1);
                if colspan > 1 {
                    continue;
                }
                let Some(value) = Self::adjacent_value_cell(th) else {
                    continue;
                };
                Self::store_labeled_field(record, &label, value);
            }
        }
    }

    /// Read the td paired with this th (nth th → nth td of the same row),
    /// preferring nested emphasis/button/container elements over raw text.
    fn adjacent_value_cell(th: ElementRef<'_>) -> Option<String> {
        let row = th
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "tr")?;
        let th_index = row.select(&TH).position(|el| el.id() == th.id())?;
        let td = row.select(&TD).nth(th_index)?;

        for nested in NESTED_VALUE.iter() {
            if let Some(inner) = td.select(nested).next() {
                if let Some(value) = normalize::non_empty_text(&inner.text().collect::<String>()) {
                    return Some(value);
                }
            }
        }
        normalize::non_empty_text(&td.text().collect::<String>())
    }

    fn store_labeled_field(record: &mut ProductRecord, label: &str, value: String) {
        let canonical = LABEL_SYNONYMS
            .iter()
            .find(|(from, _)| *from == label)
            .map_or(label, |(_, to)| *to);
        record
            .manufacturing_fields
            .entry(canonical.to_string())
            .or_insert(value);
    }

    /// Source (c): free-text description sections and phrase anchors.
    fn apply_text_sections(&self, root: ElementRef<'_>, record: &mut ProductRecord) {
        let Some(container) = resolve::resolve_element(root, &self.detail_container) else {
            return;
        };

        let mut texts = Vec::new();
        for selector in &self.text_block {
            let blocks: Vec<String> = container
                .select(selector)
                .filter_map(|el| normalize::non_empty_text(&el.text().collect::<String>()))
                .collect();
            if !blocks.is_empty() {
                texts = blocks;
                break;
            }
        }
        if texts.is_empty() {
            return;
        }

        for text in &texts {
            for anchor in PHRASE_ANCHORS {
                let marker = format!("{anchor}:");
                if let Some(at) = text.find(&marker) {
                    if let Some(value) = normalize::non_empty_text(&text[at + marker.len()..]) {
                        record
                            .manufacturing_fields
                            .entry((*anchor).to_string())
                            .or_insert(value);
                    }
                }
            }
        }

        if record.description_text.is_none() {
            record.description_text = Some(texts.join(" "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn extractor() -> ProductExtractor {
        ProductExtractor::new(&ProductSelectors::default()).unwrap()
    }

    const PRODUCT_PAGE: &str = r#"
        <div>
          <h3 class="_22kNQuEXmb">기모 맨투맨</h3>
          <div class="_3my-5FC8OB">
            <del class="Xdhdpm0BD9"><span class="_1LY7DqCnwR">39,900원</span></del>
            <strong class="aICRqgP9zw _2oBq11Xp7s"><span class="_1LY7DqCnwR">29,900원</span></strong>
            <div class="_1bJwyyeSAa"><span class="_2LwlYHFpvU">오늘출발 · 무료배송</span></div>
          </div>
          <div class="WrkQhIlUY0"><span class="_1G-IvlyANt"><span class="blind">25% 할인</span></span></div>
          <ul>
            <li class="nm0BTjARAv">
              <em class="_1ehAE1FZXP">사이즈</em>
              <span class="_3TuFT_dyR9">정사이즈예요</span>
              <span class="_1j8ap1C9-S">75%</span>
            </li>
            <li class="nm0BTjARAv">
              <em class="_1ehAE1FZXP">두께</em>
              <span class="_3TuFT_dyR9">도톰해요</span>
              <span class="_1j8ap1C9-S">82%</span>
            </li>
          </ul>
          <div class="_1Hbih69XFT"><table>
            <tr><th colspan="2">상품정보 제공고시</th></tr>
            <tr><th>상품번호</th><td><b>8045986719</b></td></tr>
            <tr><th>제조국</th><td>대한민국</td></tr>
            <tr><th>브랜드</th><td><button>온논 브랜드홈</button></td></tr>
            <tr><th>배송비</th><td>3,000원</td></tr>
          </table></div>
          <div id="INTRODUCE">
            <div class="detail_text">선택 항목: 기모 추가</div>
            <div class="detail_text">도톰한 기모 안감으로 한겨울까지 따뜻하게.</div>
          </div>
        </div>
    "#;

    #[test]
    fn structural_fields_are_extracted_and_normalized() {
        let html = Html::parse_document(PRODUCT_PAGE);
        let record = extractor().extract(html.root_element(), "https://x/p/1", "cafe0123");
        assert_eq!(record.title.as_deref(), Some("기모 맨투맨"));
        assert_eq!(record.price.as_deref(), Some("29900"));
        assert_eq!(record.discount_price.as_deref(), Some("39900"));
        assert_eq!(record.discount_note.as_deref(), Some("25% 할인"));
        assert_eq!(record.shipping_note.as_deref(), Some("오늘출발 · 무료배송"));
    }

    #[test]
    fn evaluation_breakdown_keeps_value_and_percentage() {
        let html = Html::parse_document(PRODUCT_PAGE);
        let record = extractor().extract(html.root_element(), "https://x/p/1", "cafe0123");
        let size = record.evaluation_breakdown.get("사이즈").unwrap();
        assert_eq!(size.value, "정사이즈예요");
        assert_eq!(size.percentage.as_deref(), Some("75"));
        assert_eq!(record.evaluation_breakdown.len(), 2);
    }

    #[test]
    fn table_scan_honors_vocabulary_nesting_and_synonyms() {
        let html = Html::parse_document(PRODUCT_PAGE);
        let record = extractor().extract(html.root_element(), "https://x/p/1", "cafe0123");
        // Nested b/button values win over raw cell text.
        assert_eq!(
            record.manufacturing_fields.get("상품번호").map(String::as_str),
            Some("8045986719")
        );
        assert_eq!(
            record.manufacturing_fields.get("브랜드").map(String::as_str),
            Some("온논 브랜드홈")
        );
        // 제조국 folds onto the canonical 원산지 key.
        assert_eq!(
            record.manufacturing_fields.get("원산지").map(String::as_str),
            Some("대한민국")
        );
        assert!(!record.manufacturing_fields.contains_key("제조국"));
        // Labels outside the vocabulary are ignored, spanning headers too.
        assert!(!record.manufacturing_fields.contains_key("배송비"));
        assert!(!record.manufacturing_fields.contains_key("상품정보 제공고시"));
    }

    #[test]
    fn description_and_phrase_anchor_come_from_detail_sections() {
        let html = Html::parse_document(PRODUCT_PAGE);
        let record = extractor().extract(html.root_element(), "https://x/p/1", "cafe0123");
        assert_eq!(
            record.manufacturing_fields.get("선택 항목").map(String::as_str),
            Some("기모 추가")
        );
        let description = record.description_text.unwrap();
        assert!(description.contains("기모 안감"));
    }

    #[test]
    fn later_sources_never_overwrite_earlier_ones() {
        let html = Html::parse_document(
            r#"
            <div>
              <table><tr><th>원산지</th><td>베트남</td></tr>
                     <tr><th>제조국</th><td>대한민국</td></tr></table>
            </div>
            "#,
        );
        let record = extractor().extract(html.root_element(), "u", "id");
        // First writer wins: the direct 원산지 row beats the synonym row.
        assert_eq!(
            record.manufacturing_fields.get("원산지").map(String::as_str),
            Some("베트남")
        );
    }

    #[test]
    fn absent_everything_still_yields_a_record_skeleton() {
        let html = Html::parse_document("<div><p>placeholder</p></div>");
        let record = extractor().extract(html.root_element(), "https://x/p/2", "beef4567");
        assert_eq!(record.product_id, "beef4567");
        assert!(record.title.is_none());
        assert!(record.manufacturing_fields.is_empty());
        assert!(record.description_text.is_none());
    }
}
