//! Third-party upscale service adapter.
//!
//! # Data Flow
//! ```text
//! relay::upscale
//!     → client.rs (Upscaler: sequential pipeline)
//!         → token.rs (TokenProvider, HTML scrape)
//!         → nodes.rs (random node)
//!         → upload + upscale calls
//!     → error.rs (status / no response / local fault)
//! ```
//!
//! # Design Decisions
//! - Credential scraping sits behind `TokenProvider` so the rest of the
//!   pipeline can run against a fixed token
//! - Node list, task ID and endpoints come from configuration
//! - Credentials are scraped per request, never cached

pub mod client;
pub mod error;
pub mod nodes;
pub mod scale;
pub mod token;

pub use client::{PipelineError, Stage, Upscaler};
pub use error::UpstreamError;
pub use nodes::NodePool;
pub use scale::{InvalidScale, Scale};
pub use token::{PageScraper, SessionToken, StaticToken, TokenProvider};

/// Shared outbound HTTP client.
pub fn build_client(config: &crate::config::UpstreamConfig) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
    if !config.use_system_proxy {
        builder = builder.no_proxy();
    }
    builder.build()
}
