//! Session credentials for the upscale service.
//!
//! The service embeds a bearer token in an inline `ilovepdfConfig = {...};`
//! script and a CSRF value in a `<meta name="csrf-token">` tag. Both are
//! scraped fresh for every upscale request.

use std::fmt;

use async_trait::async_trait;
use scraper::{Html, Selector};
use serde::Deserialize;
use thiserror::Error;

use crate::upstream::error::UpstreamError;

const CONFIG_MARKER: &str = "ilovepdfConfig =";

/// Bearer token and CSRF value for one upload/upscale round trip.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken {
    pub token: String,
    pub csrf: String,
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionToken")
            .field("token", &"<redacted>")
            .field("csrf", &"<redacted>")
            .finish()
    }
}

/// Source of session credentials.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn session_token(&self) -> Result<SessionToken, UpstreamError>;
}

/// Why a page did not yield credentials.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Failed to get config script")]
    ConfigScriptMissing,

    #[error("Malformed config script: {0}")]
    MalformedConfig(#[from] serde_json::Error),

    #[error("Failed to get token or csrf")]
    MissingCredentials,

    #[error("Invalid selector: {0}")]
    Selector(String),
}

impl From<ScrapeError> for UpstreamError {
    fn from(e: ScrapeError) -> Self {
        UpstreamError::Local(e.to_string())
    }
}

#[derive(Deserialize)]
struct PageConfig {
    #[serde(default)]
    token: Option<String>,
}

/// Extract credentials from the informational page's HTML.
pub fn scrape_session_token(html: &str) -> Result<SessionToken, ScrapeError> {
    let document = Html::parse_document(html);
    let scripts = selector("script")?;
    let csrf_meta = selector("meta[name='csrf-token']")?;

    let script = document
        .select(&scripts)
        .map(|el| el.text().collect::<String>())
        .find(|text| text.contains(CONFIG_MARKER))
        .ok_or(ScrapeError::ConfigScriptMissing)?;

    let config = config_literal(&script).ok_or(ScrapeError::ConfigScriptMissing)?;
    let config: PageConfig = serde_json::from_str(config)?;

    let csrf = document
        .select(&csrf_meta)
        .next()
        .and_then(|el| el.value().attr("content"))
        .filter(|v| !v.is_empty());

    match (config.token.filter(|t| !t.is_empty()), csrf) {
        (Some(token), Some(csrf)) => Ok(SessionToken {
            token,
            csrf: csrf.to_string(),
        }),
        _ => Err(ScrapeError::MissingCredentials),
    }
}

/// The object literal between the marker and the first `;`.
fn config_literal(script: &str) -> Option<&str> {
    let start = script.find(CONFIG_MARKER)? + CONFIG_MARKER.len();
    let rest = &script[start..];
    let end = rest.find(';')?;
    Some(rest[..end].trim())
}

fn selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|e| ScrapeError::Selector(e.to_string()))
}

/// Fetches the informational page and scrapes it.
pub struct PageScraper {
    client: reqwest::Client,
    page_url: String,
}

impl PageScraper {
    pub fn new(client: reqwest::Client, page_url: impl Into<String>) -> Self {
        Self {
            client,
            page_url: page_url.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for PageScraper {
    async fn session_token(&self) -> Result<SessionToken, UpstreamError> {
        let html = self
            .client
            .get(&self.page_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(scrape_session_token(&html)?)
    }
}

/// Fixed credentials, for callers that obtain them elsewhere.
pub struct StaticToken(pub SessionToken);

#[async_trait]
impl TokenProvider for StaticToken {
    async fn session_token(&self) -> Result<SessionToken, UpstreamError> {
        Ok(self.0.clone())
    }
}
