//! Output record types handed to the caller.
//!
//! Records become immutable once the aggregator emits them; field names match
//! the vocabulary any downstream sink serializes (written_at, rating,
//! body_text, ...). Absent fields are `None`, never sentinel strings.

use std::collections::BTreeMap;

use serde::Serialize;

/// One extracted review.
///
/// A review is only materialized when `body_text` is non-empty or `rating`
/// is present; blocks matching a structural selector but carrying neither
/// are decorative noise and get dropped by the extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewRecord {
    /// Stable product identity, shared with [`ProductRecord::product_id`].
    pub product_id: String,
    /// Calendar date in 8-digit `yyyymmdd` form.
    pub written_at: Option<String>,
    /// Numeric rating text as shown on the page, digits only.
    pub rating: Option<String>,
    /// Selected product variant ("제품 선택" value).
    pub variant_name: Option<String>,
    pub variant_size: Option<String>,
    pub variant_color: Option<String>,
    /// Review body with internal whitespace collapsed.
    pub body_text: String,
    /// Reviewer profile line as rendered (nickname, purchase badge, ...).
    pub reviewer_note: Option<String>,
    /// Attached review images in page order.
    pub image_urls: Vec<String>,
    pub product_title: String,
}

impl ReviewRecord {
    /// Composite natural key used for cross-page deduplication.
    pub fn dedup_key(&self) -> (String, String) {
        (
            self.written_at.clone().unwrap_or_default(),
            self.body_text.clone(),
        )
    }
}

/// One value/percentage pair from the on-page evaluation summary
/// (e.g. size → "정사이즈예요" / 75%).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationEntry {
    pub value: String,
    pub percentage: Option<String>,
}

/// Extracted product page information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductRecord {
    /// Stable product identity, shared with [`ReviewRecord::product_id`].
    pub product_id: String,
    pub url: String,
    pub title: Option<String>,
    /// Current price, digits only.
    pub price: Option<String>,
    /// Pre-discount price, digits only.
    pub discount_price: Option<String>,
    pub discount_note: Option<String>,
    pub shipping_note: Option<String>,
    /// Localized label → value pairs from the product information tables.
    pub manufacturing_fields: BTreeMap<String, String>,
    /// Evaluation attribute → dominant answer with percentage.
    pub evaluation_breakdown: BTreeMap<String, EvaluationEntry>,
    pub description_text: Option<String>,
}

impl ProductRecord {
    /// Empty record skeleton for the given identity and URL; extraction
    /// sources fill the remaining fields, first writer wins.
    pub fn new(product_id: String, url: String) -> Self {
        Self {
            product_id,
            url,
            title: None,
            price: None,
            discount_price: None,
            discount_note: None,
            shipping_note: None,
            manufacturing_fields: BTreeMap::new(),
            evaluation_breakdown: BTreeMap::new(),
            description_text: None,
        }
    }
}
