//! Date detection and normalization.
//!
//! Listing pages rarely mark up dates consistently. The extractor prefers a
//! node whose class, id or itemprop hints at a date and otherwise scans the
//! container text for the first numeric `YYYY-M-D` style date. Either way
//! the text is normalized by turning the 年/月 markers into `-` and dropping
//! 日; it is not zero-padded or validated.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::dom::{self, NodeRef};
use crate::patterns::{
    DATE_HINT_ATTRIBUTES, DATE_HINT_KEYWORDS, DATE_IN_TEXT, DATE_MARKERS, GENERIC_DATETIME_FORMATS,
    GENERIC_DATE_FORMATS, LIKELY_DATE,
};

/// Extract a date from a container.
///
/// `candidate_node_text` is the text of the container's date-hinted node,
/// when it has one, and wins over scanning `container_text`. An empty hint
/// falls back to scanning.
///
/// # Examples
/// ```
/// use feedsift::date::extract_date;
///
/// assert_eq!(extract_date("Notice 2024年01月02日", None).as_deref(), Some("2024-01-02"));
/// assert_eq!(extract_date("no date here", None), None);
/// ```
#[must_use]
pub fn extract_date(container_text: &str, candidate_node_text: Option<&str>) -> Option<String> {
    let source = match candidate_node_text.map(str::trim) {
        Some(hint) if !hint.is_empty() => hint,
        _ => DATE_IN_TEXT.find(container_text)?.as_str(),
    };
    normalize_date_text(source)
}

/// Replace 年/月 with `-`, drop 日 and trim surrounding `-`.
///
/// Returns `None` when nothing is left.
#[must_use]
pub fn normalize_date_text(text: &str) -> Option<String> {
    let replaced = DATE_MARKERS.replace_all(text, "-").replace('日', "");
    let normalized = replaced.trim_matches('-');
    if normalized.is_empty() {
        None
    } else {
        Some(normalized.to_string())
    }
}

/// Whether a node's class, id or itemprop hints at date/time content.
#[must_use]
pub fn is_date_hinted(node: &NodeRef) -> bool {
    DATE_HINT_ATTRIBUTES.iter().any(|attr| {
        dom::get_attribute(node, attr).is_some_and(|value| {
            let value = value.to_lowercase();
            DATE_HINT_KEYWORDS.iter().any(|kw| value.contains(kw))
        })
    })
}

/// First date-hinted descendant of a container, in document order.
#[must_use]
pub fn find_date_node<'a>(container: &NodeRef<'a>) -> Option<NodeRef<'a>> {
    dom::find_descendant(container, is_date_hinted)
}

/// Whether text looks like a date.
///
/// A cheap validity check for callers; extraction does not depend on it.
/// Accepts the common numeric shapes anywhere in the text, or text that a
/// generic date parse accepts as a whole.
#[must_use]
pub fn is_likely_date(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return false;
    }
    if LIKELY_DATE.iter().any(|re| re.is_match(text)) {
        return true;
    }
    parse_generic(text).is_some()
}

/// Generic parse over a fixed list of date and date-time formats.
#[must_use]
pub fn parse_generic(text: &str) -> Option<NaiveDate> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.date_naive());
    }
    for fmt in GENERIC_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.date());
        }
    }
    GENERIC_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

/// Format a Unix epoch value as a UTC `YYYY-MM-DD` date.
///
/// Accepts integers, floats and numeric strings (seconds). Returns `None`
/// for anything else, and for values whose year falls outside 1..=9999
/// (millisecond timestamps, for instance), so the result is always
/// `YYYY-MM-DD`.
///
/// # Examples
/// ```
/// use feedsift::date::format_timestamp;
/// use serde_json::json;
///
/// assert_eq!(format_timestamp(&json!(1_700_000_000)).as_deref(), Some("2023-11-14"));
/// assert_eq!(format_timestamp(&json!("soon")), None);
/// ```
#[must_use]
pub fn format_timestamp(value: &Value) -> Option<String> {
    let seconds = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(float_seconds))?,
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(float_seconds))?
        }
        _ => return None,
    };
    DateTime::from_timestamp(seconds, 0)
        .filter(|dt| (1..=9999).contains(&dt.year()))
        .map(|dt| dt.format("%Y-%m-%d").to_string())
}

#[allow(clippy::cast_possible_truncation)]
fn float_seconds(value: f64) -> Option<i64> {
    // i64::MAX is not exactly representable; stay well inside it.
    if value.is_finite() && value.abs() < 1e17 {
        Some(value.floor() as i64)
    } else {
        None
    }
}
