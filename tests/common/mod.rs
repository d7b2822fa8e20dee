//! Shared harness for the relay integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;

use image_relay::config::RelayConfig;
use image_relay::http::HttpServer;
use image_relay::lifecycle::Shutdown;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "tok-123";
pub const CSRF: &str = "csrf-abc";
pub const NODE: &str = "api1g";

/// A relay running on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub spool: TempDir,
    shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Number of files left in the spool directory.
    pub fn spooled_files(&self) -> usize {
        std::fs::read_dir(self.spool.path()).unwrap().count()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Config pointing every third-party endpoint at `upstream`.
pub fn test_config(upstream: &MockServer, spool: &Path) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.observability.metrics_enabled = false;
    config.upload.spool_dir = Some(spool.to_path_buf());
    config.upstream.use_system_proxy = false;
    config.upstream.token_page_url = format!("{}/upscale-image", upstream.uri());
    config.upstream.node_url_template = format!("{}/{{node}}", upstream.uri());
    config.upstream.nodes = vec![NODE.into()];
    config.upstream.task_id = "task-xyz".into();
    config
}

pub async fn start_relay(upstream: &MockServer) -> TestServer {
    start_relay_with(upstream, |_| {}).await
}

pub async fn start_relay_with<F>(upstream: &MockServer, tweak: F) -> TestServer
where
    F: FnOnce(&mut RelayConfig),
{
    let spool = tempfile::tempdir().unwrap();
    let mut config = test_config(upstream, spool.path());
    tweak(&mut config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestServer {
        addr,
        spool,
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

pub fn token_page() -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="csrf-token" content="{CSRF}">
  <script src="/static/app.js"></script>
  <script type="text/javascript">
    var ilovepdfConfig = {{"token":"{TOKEN}","locale":"en","version":"4"}};
    window.dataLayer = [];
  </script>
</head>
<body><h1>Upscale Image</h1></body>
</html>"#
    )
}

/// Serve the token page and count how often it is fetched.
pub async fn mount_token_page(upstream: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/upscale-image"))
        .respond_with(ResponseTemplate::new(200).set_body_string(token_page()))
        .expect(expected_calls)
        .mount(upstream)
        .await;
}

pub fn upscale_form(scale: Option<&str>, image: &[u8]) -> reqwest::multipart::Form {
    let mut form = reqwest::multipart::Form::new();
    if let Some(scale) = scale {
        form = form.text("scale", scale.to_string());
    }
    form.part(
        "image",
        reqwest::multipart::Part::bytes(image.to_vec()).file_name("photo.jpg"),
    )
}
