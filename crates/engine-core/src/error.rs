use crate::attachments::UnitFailure;
use connectors::error::{ConnectorError, ObjectStoreError, SinkError};
use soql_syntax::error::SoqlError;
use thiserror::Error;

/// Failure of one query export or bulk transfer.
///
/// Nothing here is retried; every variant is surfaced to the caller as-is.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The statement could not be rendered or parsed.
    #[error(transparent)]
    MalformedQuery(#[from] SoqlError),

    /// No session could be opened; nothing was fetched.
    #[error("Authentication failed: {0}")]
    Authentication(#[source] ConnectorError),

    /// A page request failed or returned something that is not a page envelope.
    #[error("Remote query failed on page {page}: {message}")]
    RemoteQuery { page: usize, message: String },

    /// Flattened records do not cover the declared projection.
    #[error("Schema mismatch on page {page}: missing columns {missing:?}")]
    SchemaMismatch { page: usize, missing: Vec<String> },

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    /// Single object upload (query export to a store).
    #[error("Object store error: {0}")]
    Store(#[from] ObjectStoreError),

    /// Aggregate of the failed units of a bulk transfer.
    #[error("{} object transfer(s) failed, {} stored", failures.len(), stored.len())]
    ObjectStore {
        failures: Vec<UnitFailure>,
        stored: Vec<String>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
