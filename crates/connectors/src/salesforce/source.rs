use crate::error::ConnectorError;
use async_trait::async_trait;
use bytes::Bytes;
use model::pagination::page::Page;

/// Fetches page envelopes of a query result set.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// First page of `soql`; `include_deleted` selects the soft-delete inclusive endpoint.
    async fn query(&self, soql: &str, include_deleted: bool) -> Result<Page, ConnectorError>;

    /// Follows a continuation reference exactly as the previous page returned it.
    async fn query_more(&self, next_records_url: &str) -> Result<Page, ConnectorError>;
}

/// Fetches the binary body of one attachment record.
#[async_trait]
pub trait AttachmentSource: Send + Sync {
    async fn fetch_attachment(&self, id: &str) -> Result<Bytes, ConnectorError>;
}
