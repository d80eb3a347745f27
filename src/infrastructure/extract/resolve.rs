//! Generic field resolver.
//!
//! One resolver serves every logical field: iterate the compiled fallback
//! chain in declared order, query the live block, and short-circuit on the
//! first non-empty result. Nothing is cached between blocks; every call
//! re-queries the fragment it is given.

use scraper::{ElementRef, Selector};
use tracing::{debug, warn};

use super::error::{ExtractError, ExtractResult};
use super::normalize;

/// Compile a fallback chain into selectors, skipping (and logging) broken
/// expressions. A chain with no valid expression at all is a configuration
/// error.
pub fn compile_strategy(field: &str, exprs: &[String]) -> ExtractResult<Vec<Selector>> {
    let mut compiled = Vec::with_capacity(exprs.len());
    for expr in exprs {
        match Selector::parse(expr) {
            Ok(selector) => compiled.push(selector),
            Err(e) => warn!(field, selector = %expr, "failed to compile selector: {e}"),
        }
    }
    if compiled.is_empty() && !exprs.is_empty() {
        return Err(ExtractError::empty_strategy(field));
    }
    Ok(compiled)
}

/// Resolve one logical field to its first non-empty text, or absent.
pub fn resolve_text(block: ElementRef<'_>, strategy: &[Selector]) -> Option<String> {
    for selector in strategy {
        if let Some(element) = block.select(selector).next() {
            let text = normalize::collapse_text(&element.text().collect::<String>());
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// Resolve one logical field through a parser: the first candidate whose
/// text both exists and parses wins. A candidate that matches but fails to
/// parse falls through to the next one instead of ending the scan.
pub fn resolve_parsed<T>(
    block: ElementRef<'_>,
    strategy: &[Selector],
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    for selector in strategy {
        if let Some(element) = block.select(selector).next() {
            let text = element.text().collect::<String>();
            if let Some(value) = parse(&text) {
                return Some(value);
            }
        }
    }
    None
}

/// Resolve the first element matching the chain, regardless of its text.
pub fn resolve_element<'a>(
    block: ElementRef<'a>,
    strategy: &[Selector],
) -> Option<ElementRef<'a>> {
    strategy
        .iter()
        .find_map(|selector| block.select(selector).next())
}

/// Resolve a block *set*: the first selector matching at least one element
/// defines the set (same short-circuit rule as single-value resolution).
pub fn resolve_block_set<'a>(
    root: ElementRef<'a>,
    strategy: &[Selector],
) -> Vec<ElementRef<'a>> {
    for (i, selector) in strategy.iter().enumerate() {
        let blocks: Vec<ElementRef<'a>> = root.select(selector).collect();
        if !blocks.is_empty() {
            debug!(selector_rank = i, count = blocks.len(), "matched block set");
            return blocks;
        }
    }
    Vec::new()
}

/// Resolve an attribute from every element of the first matching selector
/// (used for review image `src` lists).
pub fn resolve_attr_set(
    block: ElementRef<'_>,
    strategy: &[Selector],
    attr: &str,
) -> Vec<String> {
    for selector in strategy {
        let values: Vec<String> = block
            .select(selector)
            .filter_map(|el| el.value().attr(attr))
            .map(str::to_string)
            .collect();
        if !values.is_empty() {
            return values;
        }
    }
    Vec::new()
}
