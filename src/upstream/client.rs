//! Upload/upscale pipeline against the processing nodes.
//!
//! # Steps
//! ```text
//! TokenProvider::session_token   (bearer token + CSRF)
//!     → NodePool::pick           (random node)
//!     → POST {node}/v1/upload    (multipart, returns server_filename)
//!     → POST {node}/v1/upscale   (multipart, returns image bytes)
//! ```
//!
//! Steps run strictly in sequence; each needs the previous one's output.
//! There are no retries.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, COOKIE, ORIGIN};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use thiserror::Error;

use crate::config::{RelayConfig, UpstreamConfig};
use crate::upstream::error::UpstreamError;
use crate::upstream::nodes::NodePool;
use crate::upstream::scale::Scale;
use crate::upstream::token::{PageScraper, SessionToken, TokenProvider};

const UPLOAD_FILE_NAME: &str = "image.jpg";

/// Pipeline step, used for error context and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Token,
    NodeSelection,
    Upload,
    Upscale,
}

impl Stage {
    pub fn context(self) -> &'static str {
        match self {
            Stage::Token => "Failed to get authentication token",
            Stage::NodeSelection => "No processing node available",
            Stage::Upload => "Failed to upload image to processing server",
            Stage::Upscale => "Failed to process upscale",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Token => "token",
            Stage::NodeSelection => "node_selection",
            Stage::Upload => "upload",
            Stage::Upscale => "upscale",
        }
    }
}

/// A failed pipeline step.
#[derive(Debug, Error)]
#[error("{}: {cause}", .stage.context())]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub cause: UpstreamError,
}

impl PipelineError {
    fn at(stage: Stage) -> impl FnOnce(UpstreamError) -> Self {
        move |cause| Self { stage, cause }
    }
}

/// Upload response from a processing node.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadReceipt {
    #[serde(default)]
    pub server_filename: Option<String>,
}

/// Drives one image through the processing service.
pub struct Upscaler {
    client: reqwest::Client,
    tokens: Arc<dyn TokenProvider>,
    nodes: NodePool,
    upstream: UpstreamConfig,
    upscale_timeout: Duration,
}

impl Upscaler {
    pub fn new(client: reqwest::Client, tokens: Arc<dyn TokenProvider>, config: &RelayConfig) -> Self {
        Self {
            client,
            tokens,
            nodes: NodePool::new(config.upstream.nodes.clone()),
            upstream: config.upstream.clone(),
            upscale_timeout: config.timeouts.upscale(),
        }
    }

    /// Upscaler that scrapes credentials from the configured page.
    pub fn from_config(client: reqwest::Client, config: &RelayConfig) -> Self {
        let scraper = PageScraper::new(client.clone(), config.upstream.token_page_url.clone());
        Self::new(client, Arc::new(scraper), config)
    }

    /// Run the full pipeline and return the processed image.
    pub async fn upscale(&self, image: Vec<u8>, scale: Scale) -> Result<Bytes, PipelineError> {
        let session = self
            .tokens
            .session_token()
            .await
            .map_err(PipelineError::at(Stage::Token))?;

        let node = self.nodes.pick().ok_or_else(|| PipelineError {
            stage: Stage::NodeSelection,
            cause: UpstreamError::local("No processing nodes configured"),
        })?;
        let base = self.upstream.node_url(node);

        let headers = self
            .session_headers(&session)
            .map_err(PipelineError::at(Stage::Upload))?;

        tracing::info!(node = %node, bytes = image.len(), "Uploading to node");
        let server_filename = self
            .upload(&base, &headers, image)
            .await
            .map_err(PipelineError::at(Stage::Upload))?;

        tracing::info!(node = %node, scale = %scale, "Processing upscale");
        let output = self
            .process(&base, &headers, &server_filename, scale)
            .await
            .map_err(PipelineError::at(Stage::Upscale))?;

        tracing::info!(node = %node, bytes = output.len(), "Upscale successful");
        Ok(output)
    }

    fn session_headers(&self, session: &SessionToken) -> Result<HeaderMap, UpstreamError> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", session.token))?);
        headers.insert(ORIGIN, header_value(&self.upstream.origin)?);
        headers.insert(COOKIE, header_value(&format!("_csrf={}", session.csrf))?);
        Ok(headers)
    }

    async fn upload(&self, base: &str, headers: &HeaderMap, image: Vec<u8>) -> Result<String, UpstreamError> {
        let file = Part::bytes(image)
            .file_name(UPLOAD_FILE_NAME)
            .mime_str("image/jpeg")?;

        let form = Form::new()
            .text("name", UPLOAD_FILE_NAME)
            .text("chunk", "0")
            .text("chunks", "1")
            .text("task", self.upstream.task_id.clone())
            .text("preview", "1")
            .part("file", file);

        let receipt: UploadReceipt = self
            .client
            .post(format!("{}/v1/upload", base))
            .headers(headers.clone())
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        receipt
            .server_filename
            .filter(|name| !name.is_empty())
            .ok_or_else(|| UpstreamError::local("Upload response has no server_filename"))
    }

    async fn process(
        &self,
        base: &str,
        headers: &HeaderMap,
        server_filename: &str,
        scale: Scale,
    ) -> Result<Bytes, UpstreamError> {
        let form = Form::new()
            .text("task", self.upstream.task_id.clone())
            .text("server_filename", server_filename.to_string())
            .text("scale", scale.to_string());

        let output = self
            .client
            .post(format!("{}/v1/upscale", base))
            .headers(headers.clone())
            .multipart(form)
            .timeout(self.upscale_timeout)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        if output.is_empty() {
            return Err(UpstreamError::local("No data received from upscale server"));
        }
        Ok(output)
    }
}

fn header_value(value: &str) -> Result<HeaderValue, UpstreamError> {
    HeaderValue::from_str(value).map_err(|e| UpstreamError::local(format!("Invalid header value: {}", e)))
}
