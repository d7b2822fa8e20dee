//! Download relay: fetch a remote file server-side so the browser can save
//! it without tripping over cross-origin rules.

use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::http::error::ApiError;
use crate::http::request::RequestIdExt;
use crate::http::response::{content_type_or_default, download_response};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::upstream::UpstreamError;

const RELAY: &str = "download";
const FAILED: &str = "Failed to download image";
const ALLOWED_PREFIXES: [&str; 3] = ["http://", "https://", "blob:"];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DownloadRequest {
    #[serde(default)]
    pub url: Option<String>,
}

/// Check the target URL before any network call.
pub fn validate_url(url: Option<&str>) -> Result<&str, ApiError> {
    let url = match url {
        Some(url) if !url.is_empty() => url,
        _ => {
            return Err(ApiError::bad_request(
                "URL is required",
                "Please provide a URL to download",
            ))
        }
    };

    if !ALLOWED_PREFIXES.iter().any(|prefix| url.starts_with(prefix)) {
        return Err(ApiError::bad_request(
            "Invalid URL",
            "URL must start with http://, https://, or blob:",
        ));
    }
    Ok(url)
}

pub async fn download_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<DownloadRequest>, JsonRejection>,
) -> Response {
    let start = Instant::now();
    let request_id = headers.request_id();

    let response = match relay_download(&state, request_id, payload).await {
        Ok(response) => response,
        Err(e) => {
            if e.status().is_server_error() {
                tracing::error!(request_id = %request_id, error = %e, "Download relay failed");
            } else {
                tracing::warn!(request_id = %request_id, error = %e, "Download rejected");
            }
            e.into_response()
        }
    };

    metrics::record_request(RELAY, response.status().as_u16(), start);
    response
}

async fn relay_download(
    state: &AppState,
    request_id: &str,
    payload: Result<Json<DownloadRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(JsonRejection::MissingJsonContentType(_)) => DownloadRequest::default(),
        Err(rejection) => {
            return Err(ApiError::bad_request("Invalid request body", rejection.body_text()))
        }
    };
    let url = validate_url(request.url.as_deref())?;

    tracing::info!(request_id = %request_id, url = %url, "Downloading file");

    let (content_type, body) = fetch(state, url)
        .await
        .map_err(|cause| ApiError::from_upstream(FAILED, cause))?;

    tracing::info!(request_id = %request_id, bytes = body.len(), "Download successful");
    Ok(download_response(content_type, body))
}

async fn fetch(state: &AppState, url: &str) -> Result<(HeaderValue, axum::body::Bytes), UpstreamError> {
    let response = state
        .client
        .get(url)
        .header(header::ACCEPT, "image/*")
        .timeout(state.config.timeouts.download())
        .send()
        .await?
        .error_for_status()?;

    let content_type = content_type_or_default(response.headers().get(header::CONTENT_TYPE));
    let body = response.bytes().await?;
    Ok((content_type, body))
}
