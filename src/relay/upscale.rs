//! Upscale relay: push an uploaded image through the third-party upscaler
//! and return the processed PNG.

use std::path::Path;
use std::time::Instant;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use crate::http::error::ApiError;
use crate::http::request::RequestIdExt;
use crate::http::response::upscale_response;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::relay::spool::{SpoolError, SpooledImage};
use crate::upstream::Scale;

const RELAY: &str = "upscale";
const FAILED: &str = "Failed to upscale image";

/// Parsed `multipart/form-data` body.
#[derive(Debug, Default)]
pub struct UpscaleForm {
    pub scale: Option<String>,
    pub image: Option<SpooledImage>,
}

impl UpscaleForm {
    /// Read every field; the `image` file goes to a temp file under `spool_dir`.
    pub async fn read(mut multipart: Multipart, spool_dir: &Path) -> Result<Self, ApiError> {
        let mut form = UpscaleForm::default();

        while let Some(field) = multipart.next_field().await.map_err(form_error)? {
            let name = field.name().map(str::to_owned);
            match name.as_deref() {
                Some("scale") if form.scale.is_none() => {
                    form.scale = Some(field.text().await.map_err(form_error)?);
                }
                Some("image") if form.image.is_none() => {
                    let image = SpooledImage::from_field(field, spool_dir)
                        .await
                        .map_err(spool_error)?;
                    form.image = Some(image);
                }
                _ => {}
            }
        }
        Ok(form)
    }
}

fn form_error(e: axum::extract::multipart::MultipartError) -> ApiError {
    match e.status() {
        StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge(e.body_text()),
        _ => ApiError::bad_request("Invalid form data", e.body_text()),
    }
}

fn spool_error(e: SpoolError) -> ApiError {
    match e {
        SpoolError::Form(e) => form_error(e),
        SpoolError::Io(e) => ApiError::internal(FAILED, format!("Failed to store upload: {}", e)),
    }
}

pub async fn upscale_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let start = Instant::now();
    let request_id = headers.request_id();

    let response = match relay_upscale(&state, request_id, multipart).await {
        Ok(response) => response,
        Err(e) => {
            if e.status().is_server_error() {
                tracing::error!(request_id = %request_id, error = %e, "Upscale relay failed");
            } else {
                tracing::warn!(request_id = %request_id, error = %e, "Upscale rejected");
            }
            e.into_response()
        }
    };

    metrics::record_request(RELAY, response.status().as_u16(), start);
    response
}

async fn relay_upscale(
    state: &AppState,
    request_id: &str,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let multipart =
        multipart.map_err(|rejection| ApiError::bad_request("Invalid form data", rejection.body_text()))?;

    let UpscaleForm { scale, image } =
        UpscaleForm::read(multipart, &state.config.upload.spool_dir()).await?;

    let result = process(state, request_id, scale.as_deref(), image.as_ref()).await;

    if let Some(image) = image {
        image.discard();
    }
    result
}

async fn process(
    state: &AppState,
    request_id: &str,
    scale: Option<&str>,
    image: Option<&SpooledImage>,
) -> Result<Response, ApiError> {
    let scale = Scale::from_field(scale)
        .map_err(|e| ApiError::bad_request("Invalid scale", e.to_string()))?;

    let image = match image {
        Some(image) if !image.is_empty() => image,
        _ => {
            return Err(ApiError::bad_request(
                "No image provided",
                "Please upload an image file",
            ))
        }
    };

    let buffer = image
        .read()
        .await
        .map_err(|e| ApiError::internal(FAILED, format!("Failed to read upload: {}", e)))?;

    tracing::info!(request_id = %request_id, scale = %scale, bytes = buffer.len(), "Processing image");

    let output = state.upscaler.upscale(buffer, scale).await.map_err(|e| {
        metrics::record_upstream_failure(e.stage.as_str());
        ApiError::internal(FAILED, e.to_string())
    })?;

    Ok(upscale_response(scale, output))
}
