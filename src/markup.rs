//! Record extraction from HTML listing pages.
//!
//! Containers are the nodes matched by the source's selector (every `li`,
//! `div` and `article` by default). Each container that is not excluded and
//! holds a link yields one record: the link text as title, the normalized
//! `href` as url, and whatever date the container shows.
//!
//! Nested containers are processed independently, so a `div` wrapping an
//! `li` can yield the same link twice; deduplication belongs to storage.

use tracing::{debug, info, warn};

use crate::config::SourceConfig;
use crate::date;
use crate::dom::{self, Document, NodeRef};
use crate::exclusion;
use crate::patterns::DEFAULT_CONTAINER_SELECTOR;
use crate::record::{ErrorKind, Extraction, Record, Severity};
use crate::url_utils;

/// Why a container produced no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skip {
    /// Category of the skip.
    pub kind: ErrorKind,
    /// Detail for diagnostics.
    pub message: String,
}

impl Skip {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Extract records from a parsed page.
///
/// Never fails: a bad selector yields an empty extraction with an error
/// diagnostic, and containers that cannot produce a record are skipped with
/// a debug diagnostic so the rest of the page is still processed.
#[must_use]
pub fn extract(doc: &Document, config: &SourceConfig) -> Extraction {
    let mut extraction = Extraction::default();
    let selector = config
        .selector
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_CONTAINER_SELECTOR);

    let containers = match dom::query_selector_all(doc, selector) {
        Ok(containers) => containers,
        Err(err) => {
            warn!(source = %config.name, selector, "container selection failed: {err}");
            extraction.fail(ErrorKind::Selection, err.to_string());
            return extraction;
        }
    };

    if containers.is_empty() {
        warn!(source = %config.name, url = %config.url, selector, "no containers found");
        extraction.push(
            Severity::Warning,
            ErrorKind::NoContent,
            None,
            format!("selector `{selector}` matched nothing"),
        );
        return extraction;
    }

    for (index, container) in containers.iter().enumerate() {
        if let Some((level, rule)) = exclusion::matching_rule(container, &config.exclusion_rules) {
            debug!(source = %config.name, index, level, ?rule, "container excluded");
            continue;
        }

        match extract_container(container, &config.url) {
            Ok(record) => extraction.records.push(record),
            Err(skip) => {
                debug!(source = %config.name, index, kind = ?skip.kind, "{}", skip.message);
                extraction.push(Severity::Debug, skip.kind, Some(index), skip.message);
            }
        }
    }

    if extraction.records.is_empty() {
        warn!(source = %config.name, url = %config.url, "no valid records extracted");
        extraction.push(
            Severity::Warning,
            ErrorKind::NoContent,
            None,
            format!("{} containers yielded no records", containers.len()),
        );
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

/// Build the record for one container.
///
/// # Errors
///
/// Returns a [`Skip`] when the container has no link, the link text is
/// empty, or the href does not normalize to a navigable URL.
pub fn extract_container(container: &NodeRef, base_url: &str) -> Result<Record, Skip> {
    let Some(link) = dom::first_descendant_by_tag(container, "a") else {
        return Err(Skip::new(ErrorKind::MissingLink, "container has no link"));
    };

    let title = dom::stripped_text(&link);
    if title.is_empty() {
        return Err(Skip::new(ErrorKind::EmptyTitle, "link text is empty"));
    }

    let href = dom::get_attribute(&link, "href").unwrap_or_default();
    let url = url_utils::normalize(&href, base_url);
    if url.is_empty() {
        return Err(Skip::new(
            ErrorKind::Normalization,
            format!("unusable href `{}`", href.trim()),
        ));
    }

    let hint = date::find_date_node(container).map(|node| dom::stripped_text(&node));
    let date = date::extract_date(&dom::stripped_text(container), hint.as_deref());

    Ok(Record { title, url, date })
}
