//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Browser user agent sent to every upstream.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Task identifier observed on the upscale service. Shared by every request.
pub const DEFAULT_TASK_ID: &str = "r68zl88mq72xq94j2d5p66bn2z9lrbx20njsbw2qsAvgmzr11lvfhAx9kl87pp6yqgx7c8vg7sfbqnrr42qb16v0gj8jl5s0kq1kgp26mdyjjspd8c5A2wk8b4Adbm6vf5tpwbqlqdr8A9tfn7vbqvy28ylphlxdl379psxpd8r70nzs3sk1";

/// Placeholder replaced by the node name in [`UpstreamConfig::node_url_template`].
pub const NODE_PLACEHOLDER: &str = "{node}";

const DEFAULT_NODES: [&str; 20] = [
    "api1g", "api2g", "api3g", "api8g", "api9g", "api10g", "api11g", "api12g", "api13g",
    "api14g", "api15g", "api16g", "api17g", "api18g", "api19g", "api20g", "api21g", "api22g",
    "api24g", "api25g",
];

/// Root configuration for the relay service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Inbound upload handling.
    pub upload: UploadConfig,

    /// Third-party endpoints and credentials scraping.
    pub upstream: UpstreamConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed for one inbound request, in seconds.
    pub request_secs: u64,

    /// Timeout of the download relay's upstream fetch, in seconds.
    pub download_secs: u64,

    /// Timeout of the upscale processing call, in seconds.
    pub upscale_secs: u64,
}

impl TimeoutConfig {
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    pub fn download(&self) -> Duration {
        Duration::from_secs(self.download_secs)
    }

    pub fn upscale(&self) -> Duration {
        Duration::from_secs(self.upscale_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 120,
            download_secs: 30,
            upscale_secs: 60,
        }
    }
}

/// Upload handling for the upscale relay.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Maximum accepted multipart body in bytes.
    pub max_bytes: usize,

    /// Directory for spooled uploads. System temp dir when unset.
    pub spool_dir: Option<PathBuf>,
}

impl UploadConfig {
    pub fn spool_dir(&self) -> PathBuf {
        self.spool_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: 25 * 1024 * 1024, // 25MB
            spool_dir: None,
        }
    }
}

/// Third-party service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// User agent presented to upstreams.
    pub user_agent: String,

    /// Honour HTTP(S)_PROXY environment variables for outbound calls.
    pub use_system_proxy: bool,

    /// Page scraped for the bearer token and CSRF value.
    pub token_page_url: String,

    /// Origin header sent to processing nodes.
    pub origin: String,

    /// Base URL of a processing node, with a `{node}` placeholder.
    pub node_url_template: String,

    /// Processing node names. One is picked at random per request.
    pub nodes: Vec<String>,

    /// Task identifier correlating upload and upscale calls.
    pub task_id: String,
}

impl UpstreamConfig {
    /// Base URL for the given node, without a trailing slash.
    pub fn node_url(&self, node: &str) -> String {
        self.node_url_template
            .replace(NODE_PLACEHOLDER, node)
            .trim_end_matches('/')
            .to_string()
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            user_agent: BROWSER_USER_AGENT.to_string(),
            use_system_proxy: true,
            token_page_url: "https://www.iloveimg.com/upscale-image".to_string(),
            origin: "https://www.iloveimg.com/".to_string(),
            node_url_template: "https://{node}.iloveimg.com".to_string(),
            nodes: DEFAULT_NODES.iter().map(|n| n.to_string()).collect(),
            task_id: DEFAULT_TASK_ID.to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
