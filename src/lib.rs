//! # feedsift
//!
//! Heuristic extraction of listing records (title, URL, date) from web
//! pages and JSON feeds, and detection of which records are new since the
//! last crawl.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::collections::HashSet;
//! use feedsift::{diff::diff, extract_markup, SourceConfig};
//!
//! let html = r#"<ul class="news">
//!   <li><a href="/n/1.html">First notice</a> <span class="date">2024年01月02日</span></li>
//!   <li><a href="/n/2.html">Second notice</a> 2024-01-03</li>
//! </ul>"#;
//!
//! let source = SourceConfig::new("notices", "http://example.com/n/").with_selector("ul.news li");
//! let extraction = extract_markup(html, &source);
//! assert_eq!(extraction.records.len(), 2);
//! assert_eq!(extraction.records[0].url, "http://example.com/n/1.html");
//! assert_eq!(extraction.records[0].date.as_deref(), Some("2024-01-02"));
//!
//! let seen: HashSet<String> = ["http://example.com/n/1.html".to_string()].into();
//! let new = diff(&seen, &extraction.records);
//! assert_eq!(new.len(), 1);
//! assert_eq!(new[0].title, "Second notice");
//! ```
//!
//! ## Components
//!
//! - **URL normalization** ([`url_utils`]): absolute, navigable links only
//! - **Date extraction** ([`date`]): date-hinted nodes first, then text scan
//! - **Exclusion rules** ([`exclusion`]): class/id/attribute/text, with ancestors
//! - **Markup records** ([`markup`]) and **JSON records** ([`json`])
//! - **Snapshot diff** ([`diff`]): which records were not seen before
//! - **Orchestration** ([`pipeline`]): fetch → extract → diff → persist → notify
//!
//! Extraction never returns an error. Everything that went wrong is listed
//! in [`Extraction::diagnostics`] and logged through `tracing`.

mod error;
mod record;

/// Compiled regex patterns and keyword tables.
pub mod patterns;

/// Per-source configuration and the YAML site list.
pub mod config;

/// DOM operations adapter over `dom_query`.
pub mod dom;

/// URL normalization against the page URL.
pub mod url_utils;

/// Date detection and normalization.
pub mod date;

/// Exclusion rule matching.
pub mod exclusion;

/// Record extraction from HTML listing pages.
pub mod markup;

/// Record extraction from JSON feeds.
pub mod json;

/// New-record detection.
pub mod diff;

/// Character encoding detection and transcoding.
pub mod encoding;

/// Crawl orchestration and collaborator traits.
pub mod pipeline;

// Public API - re-exports
pub use config::{DateFormat, ExclusionRule, FieldMap, Settings, SourceConfig, SourceType};
pub use error::{Error, Result};
pub use record::{Diagnostic, ErrorKind, Extraction, Record, Severity, Status};

/// Extracts records from an HTML page.
///
/// # Example
///
/// ```rust
/// use feedsift::{extract_markup, SourceConfig};
///
/// let html = r#"<div><a href="/x">Title A</a></div><div>no link</div>"#;
/// let source = SourceConfig::new("site", "http://x.com/p/q");
/// let extraction = extract_markup(html, &source);
/// assert_eq!(extraction.records.len(), 1);
/// assert_eq!(extraction.records[0].url, "http://x.com/x");
/// ```
#[must_use]
pub fn extract_markup(html: &str, config: &SourceConfig) -> Extraction {
    let doc = dom::parse(html);
    markup::extract(&doc, config)
}

/// Extracts records from JSON text.
///
/// # Example
///
/// ```rust
/// use feedsift::{extract_json, DateFormat, SourceConfig};
///
/// let mut source = SourceConfig::new("api", "http://x.com/").with_json_path("data.list");
/// source.field_map.date_format = DateFormat::Timestamp;
/// let text = r#"{"data": {"list": [{"title": "T", "url": "/u", "date": 1700000000}]}}"#;
/// let extraction = extract_json(text, &source);
/// assert_eq!(extraction.records[0].date.as_deref(), Some("2023-11-14"));
/// ```
#[must_use]
pub fn extract_json(text: &str, config: &SourceConfig) -> Extraction {
    json::extract_str(text, config)
}

/// Extracts records from page text according to the source type.
#[must_use]
pub fn extract_page(body: &str, config: &SourceConfig) -> Extraction {
    match config.source_type {
        SourceType::Markup => extract_markup(body, config),
        SourceType::Json => extract_json(body, config),
    }
}

/// Extracts records from raw page bytes, decoding them first.
///
/// The charset comes from `content_type` when it names one, then from the
/// page's `<meta>` declarations, and defaults to UTF-8.
///
/// # Example
///
/// ```rust
/// use feedsift::{extract_bytes, SourceConfig};
///
/// let body = b"<meta charset=\"gbk\"><ul><li><a href=\"/a\">\xD0\xC2\xCE\xC5</a></li></ul>";
/// let source = SourceConfig::new("site", "http://x.com/").with_selector("li");
/// let extraction = extract_bytes(body, None, &source);
/// assert_eq!(extraction.records[0].title, "新闻");
/// ```
#[must_use]
pub fn extract_bytes(body: &[u8], content_type: Option<&str>, config: &SourceConfig) -> Extraction {
    let text = encoding::decode_page(body, content_type);
    extract_page(&text, config)
}
