//! HTTP side of extraction: fetch the right representation for a page URL
//! and hand back redacted text.

use jiraprompt_core::{
    config::{JiraConfig, JiraCredentials},
    error::JiraPromptError,
    redact::redact,
};
use reqwest::header::CACHE_CONTROL;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::locator::{classify, IssueLocator};
use crate::rest::flatten_issue;
use crate::xml::flatten_xml;

/// Flattened, redacted content of one page.
#[derive(Debug, Clone)]
pub struct Extracted {
    /// Set when the page was recognised as a Jira issue.
    pub locator: Option<IssueLocator>,
    pub text: String,
}

/// Fetches issue pages with the configured Jira credentials.
pub struct JiraClient {
    client: reqwest::Client,
    credentials: JiraCredentials,
    hosts: Vec<String>,
}

impl JiraClient {
    pub fn new(config: &JiraConfig) -> Result<Self, JiraPromptError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| JiraPromptError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            credentials: config.credentials(),
            hosts: config.hosts.clone(),
        })
    }

    /// Credentials to attach for `url`: https only, and only to the
    /// configured hosts when any are listed.
    fn credentials_for(&self, url: &str) -> Option<&JiraCredentials> {
        let url = Url::parse(url).ok()?;
        if url.scheme() != "https" {
            return None;
        }
        if !self.hosts.is_empty() {
            let host = url.host_str()?;
            let authority = match url.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            };
            if !self.hosts.iter().any(|h| h.eq_ignore_ascii_case(&authority)) {
                return None;
            }
        }
        Some(&self.credentials)
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let req = self.client.get(url);
        match self.credentials_for(url) {
            None | Some(JiraCredentials::Anonymous) => req,
            Some(JiraCredentials::Basic { user, token }) => req.basic_auth(user, Some(token)),
            Some(JiraCredentials::Bearer(token)) => req.bearer_auth(token),
        }
    }

    /// Classify `page_url`, fetch, flatten, and redact.
    pub async fn extract(&self, page_url: &str) -> Result<Extracted, JiraPromptError> {
        let locator = classify(page_url);
        let raw = match &locator {
            Some(loc) => self.fetch_issue(&loc.rest_url(), page_url).await?,
            None => self.fetch_xml(page_url).await?,
        };

        let result = redact(&raw);
        debug!(
            "jira: redacted {} uuid(s), {} secret(s), {} link(s)",
            result.uuids, result.secrets, result.links
        );
        Ok(Extracted {
            locator,
            text: result.text,
        })
    }

    /// Fetch the REST issue document at `api_url` and flatten it.
    /// `source_url` is the page the user was looking at.
    pub async fn fetch_issue(&self, api_url: &str, source_url: &str) -> Result<String, JiraPromptError> {
        debug!("jira: GET {api_url}");
        let resp = self
            .get(api_url)
            .send()
            .await
            .map_err(|e| JiraPromptError::Network(format!("Jira request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(JiraPromptError::http_status("Jira API", resp.status().as_u16()));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| JiraPromptError::Network(format!("Jira response unreadable: {e}")))?;
        let data: Value = serde_json::from_str(&body)?;
        Ok(flatten_issue(&data, source_url))
    }

    /// Fetch `url` as-is, bypassing caches, and flatten it as XML.
    pub async fn fetch_xml(&self, url: &str) -> Result<String, JiraPromptError> {
        debug!("jira: GET {url} (xml)");
        let resp = self
            .get(url)
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| JiraPromptError::Network(format!("request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(JiraPromptError::http_status("Page", resp.status().as_u16()));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| JiraPromptError::Network(format!("response unreadable: {e}")))?;
        Ok(flatten_xml(&body))
    }
}
