//! Error types for feedsift.
//!
//! Extraction itself never fails with an `Error`; problems inside the engine
//! are reported as [`crate::Diagnostic`]s on the returned
//! [`crate::Extraction`]. This enum covers configuration loading and the
//! collaborator seams (fetching, storage, notification).

/// Error type for configuration and collaborator operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A selector expression could not be parsed.
    #[error("invalid selector `{0}`")]
    Selection(String),

    /// The source configuration is malformed or does not fit the document.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// JSON text could not be parsed.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML configuration could not be parsed.
    #[error("YAML parsing failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Reading a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The page fetcher could not retrieve a page.
    #[error("fetch failed for {url}: {reason}")]
    Fetch {
        /// URL that was requested.
        url: String,
        /// HTTP status, when the server answered.
        status: Option<u16>,
        /// Transport error or status description.
        reason: String,
    },

    /// The storage backend rejected a read or write.
    #[error("persistence failed: {0}")]
    Persistence(String),

    /// A push notification could not be delivered.
    #[error("notification failed: {0}")]
    Notification(String),
}

/// Result type alias for feedsift operations.
pub type Result<T> = std::result::Result<T, Error>;
