//! Crawl orchestration around the extraction engine.
//!
//! Fetching, storage and notification are collaborators behind the
//! [`PageFetcher`], [`RecordStore`] and [`Notifier`] traits. For one source
//! the stages run strictly in order: fetch, extract, diff against the
//! stored URLs, persist, notify. Sources are independent; a failing source
//! is reported and skipped without affecting the others.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::SourceConfig;
use crate::diff;
use crate::error::{Error, Result};
use crate::record::{Record, Status};

/// A fetched page, undecoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    /// Raw response body.
    pub body: Vec<u8>,
    /// `Content-Type` of the response, if known. Its charset takes
    /// precedence over `<meta>` declarations when decoding the body.
    pub content_type: Option<String>,
}

impl Page {
    /// Page from a body and an optional `Content-Type`.
    #[must_use]
    pub fn new(body: impl Into<Vec<u8>>, content_type: Option<&str>) -> Self {
        Self {
            body: body.into(),
            content_type: content_type.map(str::to_string),
        }
    }
}

/// Retrieves page content. Timeouts and retries are the fetcher's business.
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` with the source's extra request headers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fetch`] on transport errors and non-success statuses.
    fn fetch(&self, url: &str, headers: &BTreeMap<String, String>) -> Result<Page>;
}

/// Durable record storage keyed by source name, unique on URL.
pub trait RecordStore: Send + Sync {
    /// URLs already stored for the source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persistence`] when the store cannot be read.
    fn existing_urls(&self, source: &str) -> Result<HashSet<String>>;

    /// Insert records, ignoring URLs already present. Returns how many were
    /// actually inserted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persistence`] when the store cannot be written.
    fn save_records(&self, source: &str, records: &[Record]) -> Result<usize>;
}

/// Delivers push notifications. Best effort.
pub trait Notifier: Send + Sync {
    /// Push one notification.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Notification`] when delivery fails.
    fn push(&self, title: &str, body: &str) -> Result<()>;
}

impl<T: PageFetcher + ?Sized> PageFetcher for &T {
    fn fetch(&self, url: &str, headers: &BTreeMap<String, String>) -> Result<Page> {
        (**self).fetch(url, headers)
    }
}

impl<T: RecordStore + ?Sized> RecordStore for &T {
    fn existing_urls(&self, source: &str) -> Result<HashSet<String>> {
        (**self).existing_urls(source)
    }

    fn save_records(&self, source: &str, records: &[Record]) -> Result<usize> {
        (**self).save_records(source, records)
    }
}

impl<T: Notifier + ?Sized> Notifier for &T {
    fn push(&self, title: &str, body: &str) -> Result<()> {
        (**self).push(title, body)
    }
}

/// Outcome of one source in one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    /// Source name.
    pub source: String,
    /// Extraction outcome; `Failed` also covers fetch and storage failures.
    pub status: Status,
    /// Records not seen in earlier cycles.
    pub new_records: Vec<Record>,
    /// Records inserted by storage.
    pub saved: usize,
    /// Notifications that could not be delivered.
    pub notify_failures: usize,
    /// Why the source failed, if it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceReport {
    fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            status: Status::Empty,
            new_records: Vec::new(),
            saved: 0,
            notify_failures: 0,
            error: None,
        }
    }

    fn failed(mut self, err: &Error) -> Self {
        self.status = Status::Failed;
        self.error = Some(err.to_string());
        self
    }
}

/// Notification body for a new record: its date and URL.
#[must_use]
pub fn notification_body(record: &Record) -> String {
    match record.date.as_deref() {
        Some(date) => format!("{date} {}", record.url),
        None => record.url.clone(),
    }
}

/// Runs crawl cycles over configured sources.
pub struct Pipeline<F, S, N> {
    fetcher: F,
    store: S,
    notifier: N,
    max_workers: usize,
}

impl<F, S, N> Pipeline<F, S, N>
where
    F: PageFetcher,
    S: RecordStore,
    N: Notifier,
{
    /// Pipeline processing one source at a time.
    pub fn new(fetcher: F, store: S, notifier: N) -> Self {
        Self {
            fetcher,
            store,
            notifier,
            max_workers: 1,
        }
    }

    /// Process up to `max_workers` sources at once (at least one).
    #[must_use]
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    /// The storage collaborator.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one source through fetch, extract, diff, persist and notify.
    pub fn run_source(&self, source: &SourceConfig) -> SourceReport {
        let report = SourceReport::new(&source.name);

        let page = match self.fetcher.fetch(&source.url, &source.headers) {
            Ok(page) => page,
            Err(err) => {
                error!(source = %source.name, url = %source.url, "fetch failed: {err}");
                return report.failed(&err);
            }
        };

        let extraction = crate::extract_bytes(&page.body, page.content_type.as_deref(), source);
        let mut report = SourceReport {
            status: extraction.status(),
            ..report
        };
        if extraction.records.is_empty() {
            warn!(source = %source.name, status = ?report.status, "source yielded no records");
            return report;
        }

        let previous = self.store.existing_urls(&source.name).unwrap_or_else(|err| {
            warn!(source = %source.name, "stored URLs unavailable, treating all records as new: {err}");
            HashSet::new()
        });
        let new_records = diff::diff(&previous, &extraction.records);

        match self.store.save_records(&source.name, &extraction.records) {
            Ok(saved) => report.saved = saved,
            Err(err) => {
                error!(source = %source.name, "saving records failed: {err}");
                return report.failed(&err);
            }
        }
        info!(
            source = %source.name,
            extracted = extraction.records.len(),
            new = new_records.len(),
            saved = report.saved,
            "source processed"
        );

        for record in &new_records {
            if let Err(err) = self.notifier.push(&record.title, &notification_body(record)) {
                warn!(source = %source.name, url = %record.url, "notification failed: {err}");
                report.notify_failures += 1;
            }
        }

        report.new_records = new_records;
        report
    }

    /// Run every enabled source, `max_workers` at a time. Reports follow the
    /// order of `sources`.
    pub fn run_cycle(&self, sources: &[SourceConfig]) -> Vec<SourceReport> {
        let enabled: Vec<&SourceConfig> = sources
            .iter()
            .filter(|source| {
                if !source.enabled {
                    debug!(source = %source.name, "source disabled, skipping");
                }
                source.enabled
            })
            .collect();
        if enabled.is_empty() {
            return Vec::new();
        }

        let workers = self.max_workers.min(enabled.len());
        let next = AtomicUsize::new(0);
        let slots: Mutex<Vec<Option<SourceReport>>> =
            Mutex::new((0..enabled.len()).map(|_| None).collect());

        std::thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| loop {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    let Some(source) = enabled.get(index) else {
                        break;
                    };
                    let report = self.run_source(source);
                    slots.lock().unwrap_or_else(PoisonError::into_inner)[index] = Some(report);
                });
            }
        });

        let reports: Vec<SourceReport> = slots
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .into_iter()
            .flatten()
            .collect();
        info!(
            sources = reports.len(),
            failed = reports.iter().filter(|r| r.status == Status::Failed).count(),
            new = reports.iter().map(|r| r.new_records.len()).sum::<usize>(),
            "crawl cycle finished"
        );
        reports
    }
}

/// In-memory [`RecordStore`] with unique-URL insert semantics.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, Vec<Record>>>,
}

impl MemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with the given URLs for a source, as if saved by an
    /// earlier cycle.
    #[must_use]
    pub fn with_urls<I, U>(source: &str, urls: I) -> Self
    where
        I: IntoIterator<Item = U>,
        U: Into<String>,
    {
        let records = urls
            .into_iter()
            .map(|url| Record::new("", url, None))
            .collect();
        let mut map = HashMap::new();
        map.insert(source.to_string(), records);
        Self {
            records: Mutex::new(map),
        }
    }

    /// Stored records of a source, in insertion order.
    #[must_use]
    pub fn records(&self, source: &str) -> Vec<Record> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(source)
            .cloned()
            .unwrap_or_default()
    }
}

impl RecordStore for MemoryStore {
    fn existing_urls(&self, source: &str) -> Result<HashSet<String>> {
        let records = self
            .records
            .lock()
            .map_err(|_| Error::Persistence("memory store lock poisoned".to_string()))?;
        Ok(records
            .get(source)
            .map(|stored| diff::url_set(stored))
            .unwrap_or_default())
    }

    fn save_records(&self, source: &str, records: &[Record]) -> Result<usize> {
        let mut all = self
            .records
            .lock()
            .map_err(|_| Error::Persistence("memory store lock poisoned".to_string()))?;
        let stored = all.entry(source.to_string()).or_default();
        let mut known = diff::url_set(stored);
        let mut inserted = 0;
        for record in records {
            if known.insert(record.url.clone()) {
                stored.push(record.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}

/// [`Notifier`] that writes each notification to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn push(&self, title: &str, body: &str) -> Result<()> {
        info!(title, body, "new record");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_unique_urls() {
        let store = MemoryStore::new();
        let records = vec![
            Record::new("a", "u1", None),
            Record::new("a2", "u1", None),
            Record::new("b", "u2", None),
        ];
        assert_eq!(store.save_records("s", &records).ok(), Some(2));
        assert_eq!(store.save_records("s", &records).ok(), Some(0));
        assert_eq!(store.records("s").len(), 2);
        assert_eq!(store.records("other").len(), 0);
    }

    #[test]
    fn test_memory_store_existing_urls() {
        let store = MemoryStore::with_urls("s", ["u1", "u2"]);
        let urls = store.existing_urls("s").unwrap_or_default();
        assert_eq!(urls.len(), 2);
        assert!(urls.contains("u1"));
        assert!(store.existing_urls("t").unwrap_or_default().is_empty());
    }

    #[test]
    fn test_notification_body() {
        assert_eq!(
            notification_body(&Record::new("t", "http://x.com/a", Some("2024-01-02".to_string()))),
            "2024-01-02 http://x.com/a"
        );
        assert_eq!(notification_body(&Record::new("t", "http://x.com/a", None)), "http://x.com/a");
    }
}
