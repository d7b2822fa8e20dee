//! Response headers for relayed files.

use axum::body::Bytes;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE,
};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::upstream::Scale;

/// Content type used when the upstream does not send one.
pub const DEFAULT_CONTENT_TYPE: &str = "image/png";

/// Upstream content type, or the default when absent.
pub fn content_type_or_default(upstream: Option<&HeaderValue>) -> HeaderValue {
    upstream
        .filter(|v| !v.is_empty())
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE))
}

/// Downloaded file as an anonymous, uncached attachment.
pub fn download_response(content_type: HeaderValue, body: Bytes) -> Response {
    (
        [
            (CONTENT_TYPE, content_type),
            (
                CONTENT_DISPOSITION,
                HeaderValue::from_static("attachment; filename=upscaled_image.png"),
            ),
            (ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*")),
            (CACHE_CONTROL, HeaderValue::from_static("no-cache")),
        ],
        body,
    )
        .into_response()
}

/// Upscaled PNG as an attachment named after the scale.
pub fn upscale_response(scale: Scale, body: Bytes) -> Response {
    let disposition = match scale {
        Scale::X2 => "attachment; filename=\"upscaled_2x.png\"",
        Scale::X4 => "attachment; filename=\"upscaled_4x.png\"",
    };
    (
        [
            (CONTENT_TYPE, HeaderValue::from_static(DEFAULT_CONTENT_TYPE)),
            (CONTENT_DISPOSITION, HeaderValue::from_static(disposition)),
            (CACHE_CONTROL, HeaderValue::from_static("no-cache")),
        ],
        body,
    )
        .into_response()
}

/// CORS preflight answer for the relay endpoints.
pub fn preflight_response() -> Response {
    (
        StatusCode::NO_CONTENT,
        [
            (ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*")),
            (ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("POST, OPTIONS")),
            (ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("Content-Type")),
        ],
    )
        .into_response()
}
