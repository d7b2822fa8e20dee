//! Configuration validation.
//!
//! Serde handles syntax; this module checks values. All failures are
//! collected so an operator sees every problem in one pass.

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{RelayConfig, NODE_PLACEHOLDER};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    let timeouts = [
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("timeouts.download_secs", config.timeouts.download_secs),
        ("timeouts.upscale_secs", config.timeouts.upscale_secs),
    ];
    for (field, secs) in timeouts {
        if secs == 0 {
            errors.push(ValidationError::new(field, "must be greater than zero"));
        }
    }

    if config.upload.max_bytes == 0 {
        errors.push(ValidationError::new("upload.max_bytes", "must be greater than zero"));
    }

    let upstream = &config.upstream;
    if upstream.nodes.is_empty() {
        errors.push(ValidationError::new("upstream.nodes", "at least one node is required"));
    } else if upstream.nodes.iter().any(|n| n.trim().is_empty()) {
        errors.push(ValidationError::new("upstream.nodes", "node names must not be blank"));
    }

    if upstream.task_id.trim().is_empty() {
        errors.push(ValidationError::new("upstream.task_id", "must not be empty"));
    }

    check_http_url(&mut errors, "upstream.token_page_url", &upstream.token_page_url);
    check_http_url(&mut errors, "upstream.origin", &upstream.origin);

    if !upstream.node_url_template.contains(NODE_PLACEHOLDER) {
        errors.push(ValidationError::new(
            "upstream.node_url_template",
            format!("must contain the {} placeholder", NODE_PLACEHOLDER),
        ));
    } else {
        check_http_url(
            &mut errors,
            "upstream.node_url_template",
            &upstream.node_url("node"),
        );
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "'{}' is not a socket address",
                config.observability.metrics_address
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_http_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL: {}", e))),
    }
}
