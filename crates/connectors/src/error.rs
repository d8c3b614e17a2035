use thiserror::Error;

/// Errors raised while talking to the remote query API.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Login was rejected or the login response could not be read.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The connection profile is incomplete or inconsistent.
    #[error("Invalid connection profile: {0}")]
    Config(String),

    /// Transport-level failure (DNS, TLS, timeout, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("{url} returned {status}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    /// The response body is not a page envelope.
    #[error("Undecodable page envelope from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Invalid URL '{0}'")]
    InvalidUrl(String),
}

/// Errors raised by the delimited and embedded table sinks.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A frame arrived whose columns differ from the first frame's.
    #[error("Column mismatch: expected {expected:?}, got {actual:?}")]
    ColumnMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("Sink already finished")]
    Finished,
}

/// Errors raised by the object-store adapter.
#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("Object store error: {0}")]
    Store(#[from] object_store::Error),

    #[error("Invalid object key '{0}'")]
    InvalidKey(String),

    #[error("Invalid store location '{0}'")]
    InvalidLocation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
