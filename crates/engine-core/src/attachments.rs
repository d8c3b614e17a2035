use crate::error::EngineError;
use connectors::{
    error::{ConnectorError, ObjectStoreError},
    salesforce::source::AttachmentSource,
    store::ObjectSink,
};
use futures::{StreamExt, stream};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

pub const KEY_PREFIX: &str = "attachment/salesforce";
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Object key an attachment is stored under.
pub fn attachment_key(id: &str) -> String {
    format!("{KEY_PREFIX}/{id}")
}

/// Splits a comma separated id list, dropping blanks.
pub fn parse_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Error)]
enum UnitError {
    #[error("download failed: {0}")]
    Fetch(#[from] ConnectorError),

    #[error("store failed: {0}")]
    Store(#[from] ObjectStoreError),
}

/// One attachment that could not be transferred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitFailure {
    pub id: String,
    pub key: String,
    pub reason: String,
}

enum Transfer {
    Stored(String),
    Skipped(String),
}

/// Per-unit results of a bulk transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkOutcome {
    /// Keys written by this run.
    pub stored: Vec<String>,
    /// Keys that already existed and were left untouched.
    pub skipped: Vec<String>,
    pub failures: Vec<UnitFailure>,
}

impl BulkOutcome {
    /// The stored keys, or the aggregate error when any unit failed.
    pub fn into_result(self) -> Result<Vec<String>, EngineError> {
        if self.failures.is_empty() {
            Ok(self.stored)
        } else {
            Err(EngineError::ObjectStore {
                failures: self.failures,
                stored: self.stored,
            })
        }
    }
}

/// Copies every attachment in `ids` into `store`, at most `concurrency` at a time.
///
/// Units are independent: one failing never cancels the others, and all units
/// run to completion before the outcome is returned.
pub async fn store_attachments<A, O>(
    source: &A,
    store: &O,
    ids: &[String],
    concurrency: usize,
) -> BulkOutcome
where
    A: AttachmentSource + ?Sized,
    O: ObjectSink + ?Sized,
{
    info!(count = ids.len(), concurrency, "Transferring attachments");

    let results: Vec<(&String, Result<Transfer, UnitError>)> = stream::iter(ids)
        .map(|id| async move { (id, transfer(source, store, id).await) })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut outcome = BulkOutcome::default();
    for (id, result) in results {
        match result {
            Ok(Transfer::Stored(key)) => outcome.stored.push(key),
            Ok(Transfer::Skipped(key)) => outcome.skipped.push(key),
            Err(e) => {
                warn!(id = %id, error = %e, "Attachment transfer failed");
                outcome.failures.push(UnitFailure {
                    id: id.clone(),
                    key: attachment_key(id),
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        stored = outcome.stored.len(),
        skipped = outcome.skipped.len(),
        failed = outcome.failures.len(),
        "Attachment transfer finished"
    );
    outcome
}

async fn transfer<A, O>(source: &A, store: &O, id: &str) -> Result<Transfer, UnitError>
where
    A: AttachmentSource + ?Sized,
    O: ObjectSink + ?Sized,
{
    let key = attachment_key(id);
    if store.exists(&key).await? {
        info!(key = %key, "Object exists, skipping");
        return Ok(Transfer::Skipped(key));
    }

    let body = source.fetch_attachment(id).await?;
    store.put_bytes(body, &key).await?;
    Ok(Transfer::Stored(key))
}
