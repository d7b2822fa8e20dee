//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the relay handlers
//! - Wire up middleware (tracing, timeouts, request ID)
//! - Cap `/upscale` bodies at `upload.max_bytes`; overruns surface from the
//!   multipart extractor as a JSON 413
//! - Serve on a listener until shutdown

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::RelayConfig;
use crate::http::error::ApiError;
use crate::http::request::UuidRequestId;
use crate::http::response::preflight_response;
use crate::lifecycle::shutdown;
use crate::relay::{download_handler, upscale_handler};
use crate::upstream::{self, Upscaler};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: reqwest::Client,
    pub upscaler: Arc<Upscaler>,
    pub config: Arc<RelayConfig>,
}

/// HTTP server for the relays.
pub struct HttpServer {
    router: Router,
    config: Arc<RelayConfig>,
}

impl HttpServer {
    /// Create a server whose upscaler scrapes credentials from the configured page.
    pub fn new(config: RelayConfig) -> Result<Self, reqwest::Error> {
        let client = upstream::build_client(&config.upstream)?;
        let upscaler = Upscaler::from_config(client.clone(), &config);
        Ok(Self::with_upscaler(config, client, upscaler))
    }

    /// Create a server around an existing client and upscaler.
    pub fn with_upscaler(config: RelayConfig, client: reqwest::Client, upscaler: Upscaler) -> Self {
        let config = Arc::new(config);
        let state = AppState {
            client,
            upscaler: Arc::new(upscaler),
            config: config.clone(),
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        Router::new()
            .route(
                "/download",
                post(download_handler)
                    .options(preflight)
                    .fallback(method_not_allowed),
            )
            .route(
                "/upscale",
                post(upscale_handler)
                    .options(preflight)
                    .fallback(method_not_allowed)
                    .layer(DefaultBodyLimit::max(config.upload.max_bytes)),
            )
            .route("/health", get(health))
            .fallback(not_found)
            .with_state(state)
            .layer(TimeoutLayer::new(config.timeouts.request()))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// The router, for driving the service without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown_rx` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            nodes = self.config.upstream.nodes.len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown_rx))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn preflight() -> Response {
    preflight_response()
}

async fn method_not_allowed() -> Response {
    ApiError::MethodNotAllowed.into_response()
}

async fn not_found() -> Response {
    ApiError::NotFound.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::error::ErrorBody;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn server() -> HttpServer {
        server_with(RelayConfig::default())
    }

    fn server_with(mut config: RelayConfig) -> HttpServer {
        config.upstream.use_system_proxy = false;
        HttpServer::new(config).unwrap()
    }

    async fn error_body(response: Response) -> ErrorBody {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_has_request_id() {
        let response = server()
            .router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let response = server()
            .router()
            .oneshot(Request::get("/nothing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(error_body(response).await.error, "Not found");
    }

    #[tokio::test]
    async fn test_wrong_method() {
        let response = server()
            .router()
            .oneshot(Request::put("/upscale").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(error_body(response).await.error, "Method not allowed");
    }

    #[tokio::test]
    async fn test_preflight() {
        let response = server()
            .router()
            .oneshot(
                Request::options("/upscale")
                    .header("origin", "https://app.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers()["access-control-allow-methods"], "POST, OPTIONS");
    }

    #[tokio::test]
    async fn test_upload_over_limit_is_json() {
        let mut config = RelayConfig::default();
        config.upload.max_bytes = 16;
        let body = "--b\r\nContent-Disposition: form-data; name=\"image\"; filename=\"a.jpg\"\r\n\r\n\
                    0123456789abcdef0123456789abcdef\r\n--b--\r\n";
        let request = Request::post("/upscale")
            .header("content-type", "multipart/form-data; boundary=b")
            .header("content-length", body.len())
            .body(Body::from(body))
            .unwrap();

        let response = server_with(config).router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(response.headers()["content-type"], "application/json");
        assert_eq!(error_body(response).await.error, "Payload too large");
    }
}
