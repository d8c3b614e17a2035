use crate::{
    error::ConnectorError,
    salesforce::{
        profile::{ConnectionProfile, Credentials},
        session::Session,
    },
};
use reqwest::Url;
use std::time::Duration;
use tracing::{debug, info};

const LOGIN_HOST: &str = "login.salesforce.com";
const SANDBOX_LOGIN_HOST: &str = "test.salesforce.com";

/// Opens an authenticated session for `profile`.
///
/// `Direct` credentials need no round trip; `Password` credentials go through
/// the SOAP partner login.
pub async fn login(profile: &ConnectionProfile) -> Result<Session, ConnectorError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(profile.request_timeout_secs))
        .build()?;

    match &profile.credentials {
        Credentials::Direct {
            instance_url,
            session_id,
        } => {
            let instance = instance_base(instance_url)?;
            info!(instance = %instance, "Using direct session");
            Ok(Session::new(
                client,
                instance,
                session_id.clone(),
                profile.version(),
            ))
        }
        Credentials::Password {
            login,
            password,
            security_token,
            sandbox,
            host,
        } => {
            if login.trim().is_empty() || password.is_empty() {
                return Err(ConnectorError::Config(
                    "password login needs both login and password".into(),
                ));
            }

            let domain = match host {
                Some(h) if !h.trim().is_empty() => h.trim().to_string(),
                _ if *sandbox => SANDBOX_LOGIN_HOST.to_string(),
                _ => LOGIN_HOST.to_string(),
            };
            info!(login = %login, sandbox, "Signing in");

            let secret = format!("{password}{}", security_token.as_deref().unwrap_or(""));
            let (session_id, server_url) =
                soap_login(&client, &domain, profile.version(), login, &secret).await?;

            let instance = instance_base(&server_url)?;
            debug!(instance = %instance, "Login succeeded");
            Ok(Session::new(client, instance, session_id, profile.version()))
        }
    }
}

async fn soap_login(
    client: &reqwest::Client,
    domain: &str,
    version: &str,
    username: &str,
    secret: &str,
) -> Result<(String, String), ConnectorError> {
    let url = format!(
        "{}/services/Soap/u/{version}",
        instance_base(domain)?.as_str().trim_end_matches('/')
    );
    let body = login_envelope(username, secret);

    let response = client
        .post(&url)
        .header("Content-Type", "text/xml; charset=UTF-8")
        .header("SOAPAction", "login")
        .body(body)
        .send()
        .await
        .map_err(|e| ConnectorError::Authentication(format!("login request failed: {e}")))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ConnectorError::Authentication(format!("unreadable login response: {e}")))?;

    if !status.is_success() {
        let reason = extract_tag(&text, "faultstring").unwrap_or_else(|| status.to_string());
        return Err(ConnectorError::Authentication(reason));
    }

    match (
        extract_tag(&text, "sessionId"),
        extract_tag(&text, "serverUrl"),
    ) {
        (Some(session_id), Some(server_url)) => Ok((session_id, server_url)),
        _ => Err(ConnectorError::Authentication(
            "login response carries no session".to_string(),
        )),
    }
}

fn login_envelope(username: &str, secret: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8" ?>"#,
            r#"<env:Envelope xmlns:xsd="http://www.w3.org/2001/XMLSchema" "#,
            r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" "#,
            r#"xmlns:env="http://schemas.xmlsoap.org/soap/envelope/" "#,
            r#"xmlns:urn="urn:partner.soap.sforce.com">"#,
            "<env:Body><urn:login>",
            "<urn:username>{}</urn:username>",
            "<urn:password>{}</urn:password>",
            "</urn:login></env:Body></env:Envelope>"
        ),
        xml_escape(username),
        xml_escape(secret)
    )
}

fn xml_escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Text of the first `<tag>` element, namespace prefixes ignored.
fn extract_tag(xml: &str, tag: &str) -> Option<String> {
    let mut rest = xml;
    while let Some(idx) = rest.find('<') {
        let after = &rest[idx + 1..];
        let close = after.find('>')?;
        let name = after[..close].split_whitespace().next().unwrap_or_default();
        let local = name.rsplit(':').next().unwrap_or(name);

        if !name.starts_with('/') && local == tag {
            let body = &after[close + 1..];
            let end = body.find("</")?;
            return Some(body[..end].trim().to_string());
        }
        rest = &after[close + 1..];
    }
    None
}

/// Scheme and host of `raw`; bare hosts are taken as https.
pub fn instance_base(raw: &str) -> Result<Url, ConnectorError> {
    let raw = raw.trim();
    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };

    let url = Url::parse(&with_scheme).map_err(|_| ConnectorError::InvalidUrl(raw.to_string()))?;
    let host = url
        .host_str()
        .ok_or_else(|| ConnectorError::InvalidUrl(raw.to_string()))?;

    let base = match url.port() {
        Some(port) => format!("{}://{host}:{port}/", url.scheme()),
        None => format!("{}://{host}/", url.scheme()),
    };
    Url::parse(&base).map_err(|_| ConnectorError::InvalidUrl(raw.to_string()))
}
