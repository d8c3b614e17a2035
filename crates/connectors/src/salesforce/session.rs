use crate::{
    error::ConnectorError,
    salesforce::source::{AttachmentSource, PageSource},
};
use async_trait::async_trait;
use bytes::Bytes;
use model::pagination::page::Page;
use reqwest::{Response, Url};
use tracing::debug;

/// Maximum number of response body bytes quoted in a status error.
const ERROR_BODY_LIMIT: usize = 512;

/// An authenticated connection to one instance of the remote query API.
#[derive(Debug, Clone)]
pub struct Session {
    client: reqwest::Client,
    instance_url: Url,
    session_id: String,
    api_version: String,
}

impl Session {
    pub fn new(
        client: reqwest::Client,
        instance_url: Url,
        session_id: String,
        api_version: &str,
    ) -> Self {
        Session {
            client,
            instance_url,
            session_id,
            api_version: api_version.to_string(),
        }
    }

    pub fn instance_url(&self) -> &Url {
        &self.instance_url
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Resolves `path` against the instance; absolute URLs are kept as-is.
    pub fn resolve(&self, path: &str) -> Result<Url, ConnectorError> {
        self.instance_url
            .join(path)
            .map_err(|_| ConnectorError::InvalidUrl(path.to_string()))
    }

    pub fn query_url(&self, soql: &str, include_deleted: bool) -> Result<Url, ConnectorError> {
        let endpoint = if include_deleted { "queryAll" } else { "query" };
        let mut url = self.resolve(&format!(
            "/services/data/v{}/{endpoint}/",
            self.api_version
        ))?;
        url.query_pairs_mut().append_pair("q", soql);
        Ok(url)
    }

    pub fn attachment_url(&self, id: &str) -> Result<Url, ConnectorError> {
        self.resolve(&format!(
            "/services/data/v{}/sobjects/Attachment/{id}/Body",
            self.api_version
        ))
    }

    async fn get(&self, url: Url) -> Result<Response, ConnectorError> {
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(url.clone())
            .bearer_auth(&self.session_id)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let mut body = response.text().await.unwrap_or_default();
        if body.len() > ERROR_BODY_LIMIT {
            let mut cut = ERROR_BODY_LIMIT;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        Err(ConnectorError::Status {
            status: status.as_u16(),
            url: url.to_string(),
            body,
        })
    }

    async fn get_page(&self, url: Url) -> Result<Page, ConnectorError> {
        let display = url.to_string();
        let body = self.get(url).await?.bytes().await?;
        Page::from_slice(&body).map_err(|e| ConnectorError::Decode {
            url: display,
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl PageSource for Session {
    async fn query(&self, soql: &str, include_deleted: bool) -> Result<Page, ConnectorError> {
        let url = self.query_url(soql, include_deleted)?;
        self.get_page(url).await
    }

    async fn query_more(&self, next_records_url: &str) -> Result<Page, ConnectorError> {
        let url = self.resolve(next_records_url)?;
        self.get_page(url).await
    }
}

#[async_trait]
impl AttachmentSource for Session {
    async fn fetch_attachment(&self, id: &str) -> Result<Bytes, ConnectorError> {
        let url = self.attachment_url(id)?;
        Ok(self.get(url).await?.bytes().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(
            reqwest::Client::new(),
            Url::parse("https://na1.salesforce.com/").unwrap(),
            "00D!sid".into(),
            "38.0",
        )
    }

    #[test]
    fn test_query_urls() {
        let s = session();
        assert_eq!(
            s.query_url("SELECT Id FROM Lead", false).unwrap().as_str(),
            "https://na1.salesforce.com/services/data/v38.0/query/?q=SELECT+Id+FROM+Lead"
        );
        assert!(
            s.query_url("SELECT Id FROM Lead", true)
                .unwrap()
                .path()
                .ends_with("/queryAll/")
        );
    }

    #[test]
    fn test_continuation_is_followed_verbatim() {
        let s = session();
        let relative = "/services/data/v38.0/query/01gD0000002HU6KIAW-2000";
        assert_eq!(
            s.resolve(relative).unwrap().as_str(),
            format!("https://na1.salesforce.com{relative}")
        );

        let absolute = "https://eu2.salesforce.com/services/data/v38.0/query/01gX-4000";
        assert_eq!(s.resolve(absolute).unwrap().as_str(), absolute);
    }

    #[test]
    fn test_attachment_url() {
        assert_eq!(
            session().attachment_url("00P1").unwrap().as_str(),
            "https://na1.salesforce.com/services/data/v38.0/sobjects/Attachment/00P1/Body"
        );
    }
}
