use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reserved key holding server metadata (object type, record url) on every
/// record and every joined sub-object.
pub const METADATA_KEY: &str = "attributes";

/// One record as returned by the remote query API, in server key order.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Error, PartialEq)]
pub enum PageError {
    #[error("Page reports more data but carries no continuation reference")]
    MissingContinuation,
}

/// One page envelope of a query result set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    #[serde(default)]
    pub records: Vec<RawRecord>,
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_records_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_size: Option<u64>,
}

impl Page {
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Reference to the next page, `None` once the server reports `done`.
    ///
    /// The reference is opaque and must be followed verbatim.
    pub fn continuation(&self) -> Result<Option<&str>, PageError> {
        if self.done {
            return Ok(None);
        }

        match self.next_records_url.as_deref() {
            Some(url) if !url.is_empty() => Ok(Some(url)),
            _ => Err(PageError::MissingContinuation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_envelope() {
        let body = br#"{
            "totalSize": 3,
            "done": false,
            "nextRecordsUrl": "/services/data/v38.0/query/01gD0000002HU6KIAW-2000",
            "records": [
                {"attributes": {"type": "Contact"}, "Id": "003A"},
                {"attributes": {"type": "Contact"}, "Id": "003B"}
            ]
        }"#;

        let page = Page::from_slice(body).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page.total_size, Some(3));
        assert_eq!(
            page.continuation().unwrap(),
            Some("/services/data/v38.0/query/01gD0000002HU6KIAW-2000")
        );
    }

    #[test]
    fn test_record_key_order_is_preserved() {
        let body = br#"{"done": true, "records": [{"Zeta": 1, "Alpha": 2, "Mid": 3}]}"#;
        let page = Page::from_slice(body).unwrap();
        let keys: Vec<&str> = page.records[0].keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn test_done_page_has_no_continuation() {
        let page = Page::from_slice(br#"{"done": true, "records": []}"#).unwrap();
        assert!(page.is_empty());
        assert_eq!(page.continuation().unwrap(), None);
    }

    #[test]
    fn test_missing_continuation_is_an_error() {
        let page = Page::from_slice(br#"{"done": false, "records": []}"#).unwrap();
        assert_eq!(page.continuation(), Err(PageError::MissingContinuation));
    }

    #[test]
    fn test_non_envelope_body_fails() {
        assert!(Page::from_slice(br#"[{"message": "Session expired", "errorCode": "INVALID_SESSION_ID"}]"#).is_err());
    }
}
