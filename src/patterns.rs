//! Compiled regex patterns and keyword tables for record extraction.
//!
//! All patterns are compiled once at first use via `LazyLock`.

#![allow(clippy::expect_used)]

use std::sync::LazyLock;

use regex::Regex;

// =============================================================================
// Date Patterns
// =============================================================================

/// Numeric date inside free text: four-digit year, then month and day
/// separated by `-`, `/` or the 年/月 markers. The trailing 日 is not part
/// of the match.
pub static DATE_IN_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9]{4}[-年/][0-9]{1,2}[-月/][0-9]{1,2}").expect("DATE_IN_TEXT regex")
});

/// Year/month markers replaced by `-` during normalization.
pub static DATE_MARKERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[年月]").expect("DATE_MARKERS regex"));

/// Shapes accepted by the `is_likely_date` oracle before falling back to a
/// generic parse.
pub static LIKELY_DATE: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        // 2024-01-01, 2024/1/1, 2024年01月01日
        Regex::new(r"[0-9]{4}[-/年][0-9]{1,2}[-/月][0-9]{1,2}日?").expect("LIKELY_DATE ymd regex"),
        // 2024.01.01
        Regex::new(r"[0-9]{4}\.[0-9]{1,2}\.[0-9]{1,2}").expect("LIKELY_DATE dotted regex"),
        // 01/01/2024
        Regex::new(r"[0-9]{2}/[0-9]{2}/[0-9]{4}").expect("LIKELY_DATE dmy regex"),
    ]
});

/// Formats tried by the generic date parse, in order.
pub const GENERIC_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%B %d, %Y", // January 15, 2024
    "%b %d, %Y", // Jan 15, 2024
    "%d %B %Y",  // 15 January 2024
    "%d %b %Y",  // 15 Jan 2024
];

/// Formats with a time component tried by the generic date parse.
pub const GENERIC_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

// =============================================================================
// Markup Heuristics
// =============================================================================

/// Case-insensitive keywords marking a node as holding a date.
pub const DATE_HINT_KEYWORDS: &[&str] = &["date", "time", "pub", "时间", "日期"];

/// Attributes inspected for date keywords.
pub const DATE_HINT_ATTRIBUTES: &[&str] = &["class", "id", "itemprop"];

/// Default container selector when a source configures none.
pub const DEFAULT_CONTAINER_SELECTOR: &str = "li, div, article";

/// Number of ancestor levels checked by exclusion rules.
pub const EXCLUSION_ANCESTOR_DEPTH: usize = 5;

/// Link prefixes that never lead to a page.
pub const NON_NAVIGABLE_PREFIXES: &[&str] = &["javascript:", "mailto:", "#"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_in_text_variants() {
        for text in ["2024-01-02", "2024/1/2", "2024年01月02日"] {
            assert!(DATE_IN_TEXT.is_match(text), "{text}");
        }
        assert!(!DATE_IN_TEXT.is_match("24-01-02"));
        assert!(!DATE_IN_TEXT.is_match("2024.01.02"));
    }

    #[test]
    fn test_date_in_text_excludes_day_marker() {
        let found = DATE_IN_TEXT.find("发布 2024年01月02日").map(|m| m.as_str());
        assert_eq!(found, Some("2024年01月02"));
    }

    #[test]
    fn test_likely_date_patterns() {
        assert!(LIKELY_DATE.iter().any(|re| re.is_match("2024.01.01")));
        assert!(LIKELY_DATE.iter().any(|re| re.is_match("01/01/2024")));
        assert!(!LIKELY_DATE.iter().any(|re| re.is_match("hello")));
    }
}
