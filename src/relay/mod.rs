//! Relay handlers.
//!
//! # Data Flow
//! ```text
//! POST /download → download.rs → remote URL → bytes + CORS headers
//! POST /upscale  → upscale.rs  → spool.rs (temp file)
//!                              → upstream::Upscaler → PNG bytes
//! ```
//!
//! Input is validated before any outbound call. Failures are rendered as
//! the `{error, message}` JSON envelope.

pub mod download;
pub mod spool;
pub mod upscale;

pub use download::{download_handler, DownloadRequest};
pub use spool::SpooledImage;
pub use upscale::{upscale_handler, UpscaleForm};
