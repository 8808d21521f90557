//! Result types for extraction output.
//!
//! An extraction produces a sequence of [`Record`]s plus the
//! [`Diagnostic`]s collected while producing them. Diagnostics are the
//! explicit replacement for a global logger: every warning or error the
//! engine logs is also recorded here so callers and tests can observe it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One extracted item: a title, its canonical URL and an optional date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    /// Trimmed link or item title.
    pub title: String,

    /// Absolute URL of the item.
    pub url: String,

    /// Publication date, usually `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl Record {
    /// Creates a record from its parts.
    #[must_use]
    pub fn new(title: impl Into<String>, url: impl Into<String>, date: Option<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            date,
        }
    }

    /// Whether both title and url are non-empty.
    ///
    /// Markup extraction only ever emits complete records. JSON extraction
    /// emits one record per item regardless, so callers that want the same
    /// guarantee can filter with this.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.title.is_empty() && !self.url.is_empty()
    }
}

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Expected skips (container without a link, unusable href).
    Debug,
    /// Degraded result that is not a failure (no containers, no records).
    Warning,
    /// A unit or the whole source could not be processed.
    Error,
}

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad selector expression.
    Selection,
    /// Malformed `json_path`/`field_map` or an unexpected JSON shape.
    Configuration,
    /// Link resolved to nothing navigable.
    Normalization,
    /// Container had no link descendant.
    MissingLink,
    /// Link text was empty.
    EmptyTitle,
    /// Nothing to extract from.
    NoContent,
    /// Document text could not be parsed.
    Parse,
}

/// A single observation made during extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Severity of the observation.
    pub severity: Severity,

    /// Category of the observation.
    pub kind: ErrorKind,

    /// Index of the container or item concerned, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<usize>,

    /// Human-readable detail.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit {
            Some(unit) => write!(f, "[{:?}] #{unit}: {}", self.kind, self.message),
            None => write!(f, "[{:?}] {}", self.kind, self.message),
        }
    }
}

/// Coarse outcome of an extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// At least one record was produced.
    Records(usize),
    /// Nothing was produced and nothing failed.
    Empty,
    /// Nothing was produced because of an error.
    Failed,
}

/// Records extracted from one document together with the diagnostics
/// collected on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Records in document (or array) order.
    pub records: Vec<Record>,

    /// Everything worth reporting, in the order it was observed.
    pub diagnostics: Vec<Diagnostic>,
}

impl Extraction {
    /// Summarises the extraction.
    #[must_use]
    pub fn status(&self) -> Status {
        if !self.records.is_empty() {
            Status::Records(self.records.len())
        } else if self.has_errors() {
            Status::Failed
        } else {
            Status::Empty
        }
    }

    /// Whether any error-level diagnostic was recorded.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Diagnostics of the given kind.
    pub fn diagnostics_of(&self, kind: ErrorKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }

    pub(crate) fn push(
        &mut self,
        severity: Severity,
        kind: ErrorKind,
        unit: Option<usize>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(Diagnostic {
            severity,
            kind,
            unit,
            message: message.into(),
        });
    }

    /// Records an error-level diagnostic for the whole document.
    pub(crate) fn fail(&mut self, kind: ErrorKind, message: impl Into<String>) {
        self.push(Severity::Error, kind, None, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_records() {
        let extraction = Extraction {
            records: vec![Record::new("A", "http://x.com/a", None)],
            diagnostics: Vec::new(),
        };
        assert_eq!(extraction.status(), Status::Records(1));
    }

    #[test]
    fn test_status_empty_vs_failed() {
        let mut extraction = Extraction::default();
        extraction.push(Severity::Warning, ErrorKind::NoContent, None, "nothing");
        assert_eq!(extraction.status(), Status::Empty);

        extraction.fail(ErrorKind::Selection, "bad selector");
        assert_eq!(extraction.status(), Status::Failed);
    }

    #[test]
    fn test_is_complete() {
        assert!(Record::new("T", "http://x.com/", None).is_complete());
        assert!(!Record::new("", "http://x.com/", None).is_complete());
        assert!(!Record::new("T", "", None).is_complete());
    }

    #[test]
    fn test_record_serializes_without_absent_date() {
        let json = serde_json::to_string(&Record::new("T", "http://x.com/", None))
            .unwrap_or_default();
        assert_eq!(json, r#"{"title":"T","url":"http://x.com/"}"#);
    }

    #[test]
    fn test_diagnostic_display() {
        let d = Diagnostic {
            severity: Severity::Debug,
            kind: ErrorKind::MissingLink,
            unit: Some(3),
            message: "no link".to_string(),
        };
        assert_eq!(d.to_string(), "[MissingLink] #3: no link");
    }
}
