//! Declarative selector strategies.
//!
//! Each field carries an ordered list of CSS query expressions; order encodes
//! priority, the first expression yielding a non-empty value wins. The first
//! entry in every chain is the exact generated class name observed on the
//! storefront at the time of writing; the rest are class-substring and
//! structural fallbacks that survive a redeployment. Strategies are static
//! configuration, never mutated at runtime.

use serde::{Deserialize, Serialize};

fn strings(exprs: &[&str]) -> Vec<String> {
    exprs.iter().map(|s| (*s).to_string()).collect()
}

/// All selector strategies for one storefront.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub review: ReviewSelectors,
    pub product: ProductSelectors,
    pub navigation: NavigationSelectors,
}

/// Strategies for locating review blocks and their fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewSelectors {
    /// Block-set selectors: the first one matching at least one element
    /// defines the review blocks for the page.
    pub block: Vec<String>,
    pub date: Vec<String>,
    pub rating: Vec<String>,
    /// Container holding the purchased-variant description.
    pub option_block: Vec<String>,
    /// Definition list inside the option block (size/color pairs).
    pub option_list: Vec<String>,
    pub body: Vec<String>,
    pub reviewer: Vec<String>,
    pub images: Vec<String>,
    /// On-page total review counter used for completion-by-reconciliation.
    pub total_count: Vec<String>,
}

impl Default for ReviewSelectors {
    fn default() -> Self {
        Self {
            block: strings(&[
                "li.BnwL_cs1av",
                "li[class*=\"review_\"]",
                "div[class*=\"review_item\"]",
                "div._1MMhUGHnc_",
                ".reviewItems_review_item",
            ]),
            date: strings(&[
                "span._2L3vDiadT9",
                "span[class*=\"date\"]",
                "div[class*=\"date\"]",
                "span[class*=\"time\"]",
                "em[class*=\"date\"]",
            ]),
            rating: strings(&[
                "em._15NU42F3kT",
                "em[class*=\"rating\"]",
                "span[class*=\"rating\"]",
                "div[class*=\"star\"] em",
                "em[class*=\"score\"]",
            ]),
            option_block: strings(&[
                "div._2FXNMst_ak",
                "div[class*=\"option\"]",
                "div[class*=\"product_info\"]",
                "dl[class*=\"option\"]",
                "p[class*=\"option\"]",
            ]),
            option_list: strings(&["dl.XbGQRlzveO", "dl[class*=\"option\"]", "dl"]),
            body: strings(&[
                "div._1kMfD5ErZ6 span._2L3vDiadT9",
                "div[class*=\"content\"]",
                "p[class*=\"content\"]",
                "span[class*=\"content\"]",
            ]),
            reviewer: strings(&[
                "div._1_XCKE2RrJ",
                "div[class*=\"profile\"]",
                "span[class*=\"profile\"]",
                "div[class*=\"user_info\"]",
            ]),
            images: strings(&[
                "div._2389dRohZq img",
                "div[class*=\"img\"] img",
                "a[class*=\"img\"] img",
                "ul[class*=\"img\"] img",
            ]),
            total_count: strings(&[
                "span[class*=\"review_count\"]",
                "span[class*=\"review_total\"]",
            ]),
        }
    }
}

/// Strategies for the product page fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductSelectors {
    pub title: Vec<String>,
    pub price: Vec<String>,
    pub discount_price: Vec<String>,
    pub discount_note: Vec<String>,
    pub shipping_note: Vec<String>,
    /// One list item per evaluation attribute (size, thickness, fit, ...).
    pub evaluation_item: Vec<String>,
    pub evaluation_attribute: Vec<String>,
    pub evaluation_value: Vec<String>,
    pub evaluation_percentage: Vec<String>,
    /// Tables scanned for the label/value vocabulary.
    pub info_table: Vec<String>,
    /// Containers holding the free-text product description.
    pub detail_container: Vec<String>,
    /// Text blocks within a detail container.
    pub text_block: Vec<String>,
}

impl Default for ProductSelectors {
    fn default() -> Self {
        Self {
            title: strings(&[
                "h3._22kNQuEXmb",
                "h3[class*=\"product_title\"]",
                "div[class*=\"headingArea\"] h2",
                "h2[class*=\"product_title\"]",
            ]),
            price: strings(&[
                "div._3my-5FC8OB strong.aICRqgP9zw._2oBq11Xp7s span._1LY7DqCnwR",
                "span[class*=\"price_num\"]",
                "div[class*=\"price\"] strong",
                "em[class*=\"price\"]",
            ]),
            discount_price: strings(&[
                "div._3my-5FC8OB del.Xdhdpm0BD9 span._1LY7DqCnwR",
                "del[class*=\"price\"] span",
            ]),
            discount_note: strings(&[
                "div.WrkQhIlUY0 span._1G-IvlyANt span.blind",
                "span[class*=\"discount\"]",
            ]),
            shipping_note: strings(&[
                "div._3my-5FC8OB div._1bJwyyeSAa span._2LwlYHFpvU",
                "div[class*=\"delivery\"] span",
                "span[class*=\"shipping\"]",
            ]),
            evaluation_item: strings(&["li.nm0BTjARAv", "li[class*=\"evaluation\"]"]),
            evaluation_attribute: strings(&["em._1ehAE1FZXP", "em[class*=\"category\"]"]),
            evaluation_value: strings(&["span._3TuFT_dyR9", "span[class*=\"answer\"]"]),
            evaluation_percentage: strings(&["span._1j8ap1C9-S", "span[class*=\"percent\"]"]),
            info_table: strings(&[
                "table.TH_yvPweZa",
                "table[class*=\"_yvPweZa\"]",
                "div._1Hbih69XFT table",
                "div[class*=\"product_info\"] table",
            ]),
            detail_container: strings(&[
                "#INTRODUCE",
                "#DETAIL",
                "div.detail_area",
                "div[class*=\"detail_content\"]",
                "div[class*=\"product_detail\"]",
                "div[class*=\"goods_detail\"]",
            ]),
            text_block: strings(&[
                "div[class*=\"text\"]",
                "p[class*=\"desc\"]",
                "div[class*=\"description\"]",
            ]),
        }
    }
}

/// Selectors consumed through the live session (clicks and scans), not
/// against parsed markup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationSelectors {
    pub review_tab: Vec<String>,
    pub sort_newest: Vec<String>,
    /// Pagination containers whose child links get scanned when neither a
    /// numeric label nor a next-control could be clicked.
    pub pagination_container: Vec<String>,
    /// Controls carrying explicit next-page semantics in class names.
    pub next_control: Vec<String>,
}

impl Default for NavigationSelectors {
    fn default() -> Self {
        Self {
            review_tab: strings(&[
                "a[href=\"#REVIEW\"]",
                "#content ul li:nth-child(2) a",
                "a[aria-selected=\"true\"]",
            ]),
            sort_newest: strings(&["#REVIEW div._2LAwVxx1Sd ul li:nth-child(2) a"]),
            pagination_container: strings(&[
                "div._2g7PKvqCKe",
                "div[class*=\"pagination\"]",
                "div[class*=\"paging\"]",
                "div[class*=\"page_num\"]",
                "ul[class*=\"pagination\"]",
            ]),
            next_control: strings(&["a[class*=\"next\"]", "button[class*=\"next\"]"]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Selector;

    fn assert_all_compile(chains: &[&Vec<String>]) {
        for chain in chains {
            for expr in chain.iter() {
                assert!(
                    Selector::parse(expr).is_ok(),
                    "default selector failed to compile: {expr}"
                );
            }
        }
    }

    #[test]
    fn every_default_selector_compiles() {
        let config = SelectorConfig::default();
        assert_all_compile(&[
            &config.review.block,
            &config.review.date,
            &config.review.rating,
            &config.review.option_block,
            &config.review.option_list,
            &config.review.body,
            &config.review.reviewer,
            &config.review.images,
            &config.review.total_count,
            &config.product.title,
            &config.product.price,
            &config.product.discount_price,
            &config.product.discount_note,
            &config.product.shipping_note,
            &config.product.evaluation_item,
            &config.product.evaluation_attribute,
            &config.product.evaluation_value,
            &config.product.evaluation_percentage,
            &config.product.info_table,
            &config.product.detail_container,
            &config.product.text_block,
            &config.navigation.review_tab,
            &config.navigation.sort_newest,
            &config.navigation.pagination_container,
            &config.navigation.next_control,
        ]);
    }
}
