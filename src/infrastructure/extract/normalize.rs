//! Per-field value normalizers.
//!
//! Every function is total on its input domain: unparseable input degrades
//! to `None` for that one field, it never aborts extraction of the record.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static SHORT_DOTTED_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}\.\d{2}\.\d{2}\.?$").expect("static regex"));
static LONG_DOTTED_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}\.\d{2}\.\d{2}$").expect("static regex"));
static DASHED_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("static regex"));

/// Unify the storefront's date spellings into an 8-digit `yyyymmdd` string.
///
/// Accepted forms: `yy.mm.dd` with an optional trailing dot, `yyyy.mm.dd`
/// and `yyyy-mm-dd`. Anything else, including syntactically shaped but
/// non-calendar values, is absent.
pub fn normalize_date(raw: &str) -> Option<String> {
    let text = raw.trim();
    let parsed = if SHORT_DOTTED_DATE.is_match(text) {
        NaiveDate::parse_from_str(text.trim_end_matches('.'), "%y.%m.%d").ok()?
    } else if LONG_DOTTED_DATE.is_match(text) {
        NaiveDate::parse_from_str(text, "%Y.%m.%d").ok()?
    } else if DASHED_DATE.is_match(text) {
        NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?
    } else {
        return None;
    };
    Some(parsed.format("%Y%m%d").to_string())
}

/// Keep the numeric part of a rating ("5", "4.5"); absent when nothing
/// numeric remains.
pub fn normalize_rating(raw: &str) -> Option<String> {
    let numeric: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let trimmed = numeric.trim_matches('.').to_string();
    if trimmed.chars().any(|c| c.is_ascii_digit()) {
        Some(trimmed)
    } else {
        None
    }
}

/// Collapse internal whitespace and newlines to single spaces, trim ends.
pub fn collapse_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `collapse_text` lifted to the absent-on-empty convention.
pub fn non_empty_text(raw: &str) -> Option<String> {
    let collapsed = collapse_text(raw);
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

/// Strip everything but digits from a monetary or count value
/// ("1,814개" → "1814"); absent when no digit survives.
pub fn digits_only(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() { None } else { Some(digits) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("24.03.05.", Some("20240305"))]
    #[case("24.03.05", Some("20240305"))]
    #[case("2024.03.05", Some("20240305"))]
    #[case("2024-03-05", Some("20240305"))]
    #[case("  23.12.31.  ", Some("20231231"))]
    #[case("not-a-date", None)]
    #[case("2024.13.05", None)]
    #[case("99.02.30", None)]
    #[case("", None)]
    fn date_forms(#[case] input: &str, #[case] expected: Option<&str>) {
        assert_eq!(normalize_date(input), expected.map(str::to_string));
    }

    #[rstest]
    #[case("5", Some("5"))]
    #[case("평점 4.5점", Some("4.5"))]
    #[case("★★★★★", None)]
    #[case("", None)]
    #[case(".", None)]
    fn rating_forms(#[case] input: &str, #[case] expected: Option<&str>) {
        assert_eq!(normalize_rating(input), expected.map(str::to_string));
    }

    #[rstest]
    #[case("  소재가   좋아요\n\n재구매  의사 있음 ", "소재가 좋아요 재구매 의사 있음")]
    #[case("tab\tand\u{a0}nbsp", "tab and nbsp")]
    #[case("", "")]
    fn text_collapse(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(collapse_text(input), expected);
    }

    #[rstest]
    #[case("29,900원", Some("29900"))]
    #[case("1,814개", Some("1814"))]
    #[case("무료배송", None)]
    fn money_forms(#[case] input: &str, #[case] expected: Option<&str>) {
        assert_eq!(digits_only(input), expected.map(str::to_string));
    }
}
