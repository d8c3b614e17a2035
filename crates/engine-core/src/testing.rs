//! In-process stand-ins for the remote API used across the unit tests.

use async_trait::async_trait;
use bytes::Bytes;
use connectors::{
    error::ConnectorError,
    salesforce::source::{AttachmentSource, PageSource},
};
use model::pagination::page::{Page, RawRecord};
use serde_json::json;
use std::{
    collections::{HashSet, VecDeque},
    sync::Mutex,
};

/// Contact record with an `Account` join, as the query endpoint returns it.
pub fn contact(id: &str, account: Option<&str>) -> RawRecord {
    let account = match account {
        Some(name) => json!({
            "attributes": {"type": "Account", "url": "/services/data/v38.0/sobjects/Account/001"},
            "Name": name,
        }),
        None => serde_json::Value::Null,
    };

    let record = json!({
        "attributes": {"type": "Contact", "url": format!("/services/data/v38.0/sobjects/Contact/{id}")},
        "Id": id,
        "Name": format!("Contact {id}"),
        "Account": account,
    });
    record.as_object().unwrap().clone()
}

/// Page of contacts; `next` of `None` marks the final page.
pub fn page(ids: &[&str], next: Option<&str>) -> Page {
    Page {
        records: ids.iter().map(|id| contact(id, Some("Acme"))).collect(),
        done: next.is_none(),
        next_records_url: next.map(str::to_string),
        total_size: None,
    }
}

/// Serves a fixed sequence of pages and records every request.
pub struct MockSource {
    pages: Mutex<VecDeque<Page>>,
    calls: Mutex<Vec<String>>,
    fail_after: Option<usize>,
}

impl MockSource {
    pub fn new(pages: Vec<Page>) -> Self {
        MockSource {
            pages: Mutex::new(pages.into()),
            calls: Mutex::new(Vec::new()),
            fail_after: None,
        }
    }

    /// Every request after the first `n` answers with a server error.
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn serve(&self, call: String) -> Result<Page, ConnectorError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(call);
        if self.fail_after.is_some_and(|n| calls.len() > n) {
            return Err(ConnectorError::Status {
                status: 500,
                url: "mock".into(),
                body: "boom".into(),
            });
        }
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ConnectorError::Decode {
                url: "mock".into(),
                message: "no more pages".into(),
            })
    }
}

#[async_trait]
impl PageSource for MockSource {
    async fn query(&self, soql: &str, include_deleted: bool) -> Result<Page, ConnectorError> {
        let endpoint = if include_deleted { "queryAll" } else { "query" };
        self.serve(format!("{endpoint}:{soql}"))
    }

    async fn query_more(&self, next_records_url: &str) -> Result<Page, ConnectorError> {
        self.serve(format!("more:{next_records_url}"))
    }
}

/// Attachment bodies keyed by id; ids in `broken` fail to download.
pub struct MockAttachments {
    pub broken: HashSet<String>,
    pub fetched: Mutex<Vec<String>>,
}

impl MockAttachments {
    pub fn new(broken: &[&str]) -> Self {
        MockAttachments {
            broken: broken.iter().map(|id| id.to_string()).collect(),
            fetched: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AttachmentSource for MockAttachments {
    async fn fetch_attachment(&self, id: &str) -> Result<Bytes, ConnectorError> {
        self.fetched.lock().unwrap().push(id.to_string());
        if self.broken.contains(id) {
            return Err(ConnectorError::Status {
                status: 404,
                url: format!("/sobjects/Attachment/{id}/Body"),
                body: "NOT_FOUND".into(),
            });
        }
        Ok(Bytes::from(format!("body of {id}")))
    }
}
