//! New-record detection between two crawls of a source.
//!
//! The previous crawl is represented only by the set of URLs storage
//! already holds. A record is new when its URL is not in that set.

use std::collections::HashSet;

use crate::record::Record;

/// Records of the current crawl whose URL was not seen before.
///
/// Order follows `current`. When `current` repeats a URL, only the first
/// record with that URL is returned, matching the unique-URL semantics of
/// storage. An empty `previous_urls` makes every current record new.
///
/// # Examples
/// ```
/// use std::collections::HashSet;
/// use feedsift::{diff::diff, Record};
///
/// let previous: HashSet<String> = ["u1".to_string()].into_iter().collect();
/// let current = vec![Record::new("a", "u1", None), Record::new("b", "u2", None)];
/// assert_eq!(diff(&previous, &current), vec![Record::new("b", "u2", None)]);
/// ```
#[must_use]
pub fn diff(previous_urls: &HashSet<String>, current: &[Record]) -> Vec<Record> {
    let mut emitted: HashSet<&str> = HashSet::new();
    current
        .iter()
        .filter(|record| !previous_urls.contains(&record.url))
        .filter(|record| emitted.insert(record.url.as_str()))
        .cloned()
        .collect()
}

/// URL set of a record sequence, for building the next snapshot.
#[must_use]
pub fn url_set(records: &[Record]) -> HashSet<String> {
    records.iter().map(|r| r.url.clone()).collect()
}
