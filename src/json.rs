//! Record extraction from JSON feeds.
//!
//! The item list is located by walking `json_path` one dot-separated key at
//! a time through nested objects. Each item's title, url and date are read
//! through the source's [`FieldMap`]. Unlike markup extraction, every object
//! item yields a record even when its title or url is missing; use
//! [`Record::is_complete`] downstream to filter.

use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::config::{DateFormat, FieldMap, SourceConfig};
use crate::date;
use crate::error::{Error, Result};
use crate::record::{ErrorKind, Extraction, Record, Severity};
use crate::url_utils;

/// Where a path walk ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Located<'a> {
    /// The value at the end of the path.
    Found(&'a Value),
    /// A key along the path does not exist.
    Missing(&'a str),
}

/// Walk a dot-separated key path through nested objects.
///
/// Empty segments are ignored, so an empty path locates the document
/// itself.
///
/// # Errors
///
/// Returns [`Error::Configuration`] when a segment has to be looked up in
/// something that is not an object.
pub fn walk_path<'a>(document: &'a Value, path: &'a str) -> Result<Located<'a>> {
    let mut cursor = document;
    for segment in path.split('.').map(str::trim).filter(|s| !s.is_empty()) {
        let Value::Object(map) = cursor else {
            return Err(Error::Configuration(format!(
                "json_path segment `{segment}` applied to {}",
                kind_of(cursor)
            )));
        };
        match map.get(segment) {
            Some(next) => cursor = next,
            None => return Ok(Located::Missing(segment)),
        }
    }
    Ok(Located::Found(cursor))
}

/// The item list at a located value.
///
/// An object with exactly one key holding an array is unwrapped to that
/// array.
///
/// # Errors
///
/// Returns [`Error::Configuration`] for any other shape.
pub fn item_list(value: &Value) -> Result<&[Value]> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(map) if map.len() == 1 => match map.values().next() {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(Error::Configuration(
                "single-key object at json_path does not hold a list".to_string(),
            )),
        },
        other => Err(Error::Configuration(format!(
            "expected a list at json_path, found {}",
            kind_of(other)
        ))),
    }
}

/// Extract records from JSON text.
#[must_use]
pub fn extract_str(text: &str, config: &SourceConfig) -> Extraction {
    match serde_json::from_str::<Value>(text) {
        Ok(document) => extract(&document, config),
        Err(err) => {
            error!(source = %config.name, url = %config.url, "invalid JSON: {err}");
            let mut extraction = Extraction::default();
            extraction.fail(ErrorKind::Parse, format!("invalid JSON: {err}"));
            extraction
        }
    }
}

/// Extract records from a parsed JSON document.
///
/// Never fails. A missing key, or a path segment applied to something that
/// is not an object, yields an empty extraction with a warning. A located
/// value that is not a list yields an empty extraction with an error.
#[must_use]
pub fn extract(document: &Value, config: &SourceConfig) -> Extraction {
    let mut extraction = Extraction::default();
    let path = config.json_path.as_deref().unwrap_or("");

    let located = match walk_path(document, path) {
        Ok(Located::Found(value)) => value,
        Ok(Located::Missing(segment)) => {
            warn!(source = %config.name, path, segment, "json_path key not found");
            extraction.push(
                Severity::Warning,
                ErrorKind::NoContent,
                None,
                format!("key `{segment}` of json_path `{path}` not found"),
            );
            return extraction;
        }
        Err(err) => {
            warn!(source = %config.name, path, "{err}");
            extraction.push(Severity::Warning, ErrorKind::Configuration, None, err.to_string());
            return extraction;
        }
    };

    let items = match item_list(located) {
        Ok(items) => items,
        Err(err) => {
            error!(source = %config.name, path, "{err}");
            extraction.fail(ErrorKind::Configuration, err.to_string());
            return extraction;
        }
    };

    for (index, item) in items.iter().enumerate() {
        let Value::Object(fields) = item else {
            warn!(source = %config.name, index, "item is {}, not an object", kind_of(item));
            extraction.push(
                Severity::Warning,
                ErrorKind::Configuration,
                Some(index),
                format!("item is {}, not an object", kind_of(item)),
            );
            continue;
        };
        let record = item_record(fields, &config.field_map, &config.url, index, &mut extraction);
        extraction.records.push(record);
    }

    if extraction.records.is_empty() {
        warn!(source = %config.name, url = %config.url, "no records in JSON list");
        extraction.push(Severity::Warning, ErrorKind::NoContent, None, "JSON list is empty");
    } else {
        info!(
            source = %config.name,
            url = %config.url,
            count = extraction.records.len(),
            "extracted records"
        );
    }

    extraction
}

fn item_record(
    fields: &Map<String, Value>,
    field_map: &FieldMap,
    base_url: &str,
    index: usize,
    extraction: &mut Extraction,
) -> Record {
    let title = fields.get(&field_map.title).map(scalar_text).unwrap_or_default();

    // Relative links are resolved like markup links; anything that does not
    // normalize is kept verbatim rather than blanked.
    let raw_url = fields.get(&field_map.url).map(scalar_text).unwrap_or_default();
    let url = match url_utils::normalize(&raw_url, base_url) {
        normalized if normalized.is_empty() => raw_url,
        normalized => normalized,
    };

    let date = match fields.get(&field_map.date) {
        None | Some(Value::Null) => None,
        Some(value) => {
            let text = match field_map.date_format {
                DateFormat::Timestamp => date::format_timestamp(value).unwrap_or_else(|| {
                    debug!(index, "date is not an epoch timestamp, keeping raw value");
                    extraction.push(
                        Severity::Debug,
                        ErrorKind::Parse,
                        Some(index),
                        format!("date `{}` is not an epoch timestamp", scalar_text(value)),
                    );
                    scalar_text(value)
                }),
                DateFormat::Raw => scalar_text(value),
            };
            Some(text).filter(|d| !d.is_empty())
        }
    };

    Record { title, url, date }
}

/// Text of a JSON value: strings trimmed, null empty, anything else in its
/// JSON form.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(path: &str) -> SourceConfig {
        SourceConfig::new("api", "http://x.com/api/list").with_json_path(path)
    }

    #[test]
    fn test_walk_path_found() {
        let doc = json!({"data": {"list": [1, 2]}});
        assert_eq!(walk_path(&doc, "data.list").ok(), Some(Located::Found(&json!([1, 2]))));
    }

    #[test]
    fn test_walk_path_missing() {
        let doc = json!({"data": {}});
        assert_eq!(walk_path(&doc, "data.list").ok(), Some(Located::Missing("list")));
    }

    #[test]
    fn test_walk_path_through_list_is_error() {
        let doc = json!({"data": [1]});
        assert!(matches!(walk_path(&doc, "data.list"), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_walk_path_empty_is_root() {
        let doc = json!([1]);
        assert_eq!(walk_path(&doc, "").ok(), Some(Located::Found(&doc)));
        assert_eq!(walk_path(&doc, " . ").ok(), Some(Located::Found(&doc)));
    }

    #[test]
    fn test_item_list_single_key_unwrap() {
        let value = json!({"rows": [{"title": "a"}]});
        assert_eq!(item_list(&value).map(<[Value]>::len).ok(), Some(1));
    }

    #[test]
    fn test_item_list_ambiguous() {
        assert!(item_list(&json!({"a": [], "b": []})).is_err());
        assert!(item_list(&json!({"a": 1})).is_err());
        assert!(item_list(&json!("text")).is_err());
    }

    #[test]
    fn test_timestamp_date() {
        let mut cfg = config("data.list");
        cfg.field_map.date_format = DateFormat::Timestamp;
        let doc = json!({"data": {"list": [{"title": "T", "url": "/u", "date": 1_700_000_000}]}});
        let extraction = extract(&doc, &cfg);
        assert_eq!(
            extraction.records,
            vec![Record::new("T", "http://x.com/u", Some("2023-11-14".to_string()))]
        );
    }

    #[test]
    fn test_bad_timestamp_keeps_raw() {
        let mut cfg = config("");
        cfg.field_map.date_format = DateFormat::Timestamp;
        let doc = json!([{"title": "T", "url": "http://y.com/", "date": "yesterday"}]);
        let extraction = extract(&doc, &cfg);
        assert_eq!(extraction.records[0].date.as_deref(), Some("yesterday"));
        assert_eq!(extraction.diagnostics_of(ErrorKind::Parse).count(), 1);
    }

    #[test]
    fn test_field_map() {
        let mut cfg = config("items");
        cfg.field_map.title = "name".to_string();
        cfg.field_map.url = "link".to_string();
        cfg.field_map.date = "published".to_string();
        let doc = json!({"items": [{"name": " N ", "link": "https://y.com/n", "published": "2024-02-02"}]});
        let extraction = extract(&doc, &cfg);
        assert_eq!(
            extraction.records,
            vec![Record::new("N", "https://y.com/n", Some("2024-02-02".to_string()))]
        );
    }

    #[test]
    fn test_incomplete_items_still_emitted() {
        let doc = json!({"list": [{"url": "/a"}, {"title": "only title"}, {}]});
        let extraction = extract(&doc, &config("list"));
        assert_eq!(extraction.records.len(), 3);
        assert_eq!(extraction.records[0].title, "");
        assert_eq!(extraction.records[1].url, "");
        assert!(extraction.records.iter().all(|r| !r.is_complete()));
    }

    #[test]
    fn test_non_object_items_skipped() {
        let doc = json!({"list": [{"title": "a", "url": "/a"}, 42, "x"]});
        let extraction = extract(&doc, &config("list"));
        assert_eq!(extraction.records.len(), 1);
        let units: Vec<Option<usize>> = extraction
            .diagnostics_of(ErrorKind::Configuration)
            .map(|d| d.unit)
            .collect();
        assert_eq!(units, vec![Some(1), Some(2)]);
    }

    #[test]
    fn test_missing_key_is_empty_not_error() {
        let extraction = extract(&json!({"data": {}}), &config("data.list"));
        assert!(extraction.records.is_empty());
        assert_eq!(extraction.status(), crate::Status::Empty);
    }

    #[test]
    fn test_path_through_scalar_is_warning() {
        let extraction = extract(&json!({"data": "x"}), &config("data.list"));
        assert_eq!(extraction.status(), crate::Status::Empty);
        let severities: Vec<Severity> = extraction
            .diagnostics_of(ErrorKind::Configuration)
            .map(|d| d.severity)
            .collect();
        assert_eq!(severities, vec![Severity::Warning]);
    }

    #[test]
    fn test_non_list_at_path_is_error() {
        let extraction = extract(&json!({"data": {"list": "x"}}), &config("data.list"));
        assert_eq!(extraction.status(), crate::Status::Failed);
        let severities: Vec<Severity> = extraction
            .diagnostics_of(ErrorKind::Configuration)
            .map(|d| d.severity)
            .collect();
        assert_eq!(severities, vec![Severity::Error]);
    }

    #[test]
    fn test_unparsable_text() {
        let extraction = extract_str("{not json", &config("data"));
        assert_eq!(extraction.status(), crate::Status::Failed);
        assert_eq!(extraction.diagnostics_of(ErrorKind::Parse).count(), 1);
    }

    #[test]
    fn test_numeric_fields_stringified() {
        let doc = json!([{"title": 7, "url": "/n", "date": 20240101}]);
        let extraction = extract(&doc, &config(""));
        assert_eq!(extraction.records[0].title, "7");
        assert_eq!(extraction.records[0].date.as_deref(), Some("20240101"));
    }
}
