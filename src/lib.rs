//! Image relay service library.
//!
//! Two relays behind one axum router: a download relay that fetches remote
//! files server-side, and an upscale relay that pushes uploads through a
//! third-party upscaler.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod relay;
pub mod upstream;

pub use config::schema::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
