//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Relays and middleware produce:
//!     → logging.rs (structured log events, request ID in every line)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
