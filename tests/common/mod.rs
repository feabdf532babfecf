//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{DefaultBodyLimit, Multipart},
    response::Response,
    routing::post,
    Router,
};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tryon_relay::config::{Mode, RelayConfig};
use tryon_relay::http::HttpServer;
use tryon_relay::lifecycle::Shutdown;

/// One multipart part as seen by the model double.
#[derive(Debug, Clone)]
pub struct RecordedPart {
    pub name: String,
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

/// A stand-in model service that records every call it receives.
pub struct ModelDouble {
    pub addr: SocketAddr,
    calls: Arc<Mutex<Vec<Vec<RecordedPart>>>>,
}

impl ModelDouble {
    pub fn url(&self) -> String {
        format!("http://{}/infer", self.addr)
    }

    pub fn calls(&self) -> Vec<Vec<RecordedPart>> {
        self.calls.lock().unwrap().clone()
    }
}

/// Start a programmable model double. `respond` builds the reply to each call
/// after the multipart body has been recorded.
pub async fn start_model_double<F, Fut>(respond: F) -> ModelDouble
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    let calls: Arc<Mutex<Vec<Vec<RecordedPart>>>> = Arc::default();
    let recorded = calls.clone();
    let respond = Arc::new(respond);

    let app = Router::new()
        .route(
            "/infer",
            post(move |mut multipart: Multipart| {
                let recorded = recorded.clone();
                let respond = respond.clone();
                async move {
                    let mut parts = Vec::new();
                    while let Ok(Some(field)) = multipart.next_field().await {
                        let name = field.name().unwrap_or_default().to_string();
                        let file_name = field.file_name().map(str::to_string);
                        let bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
                        parts.push(RecordedPart { name, file_name, bytes });
                    }
                    recorded.lock().unwrap().push(parts);
                    respond().await
                }
            }),
        )
        .layer(DefaultBodyLimit::disable());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    ModelDouble { addr, calls }
}

/// A relay running on an ephemeral port with its own upload directory.
pub struct TestRelay {
    pub addr: SocketAddr,
    pub upload_dir: TempDir,
    shutdown: Shutdown,
}

impl TestRelay {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Files currently present in the upload directory.
    pub fn upload_count(&self) -> usize {
        std::fs::read_dir(self.upload_dir.path()).unwrap().count()
    }
}

impl Drop for TestRelay {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the relay with `config`, overriding its upload directory.
pub async fn start_relay(mut config: RelayConfig) -> TestRelay {
    let upload_dir = tempfile::tempdir().unwrap();
    config.uploads.dir = upload_dir.path().to_path_buf();

    let server = HttpServer::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestRelay {
        addr,
        upload_dir,
        shutdown,
    }
}

/// MOCK config serving `image` from `dir`.
pub fn mock_config(dir: &Path, image: &str) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.mode = Mode::Mock;
    config.mock.image_path = PathBuf::from(image);
    config.mock.base_dir = Some(dir.to_path_buf());
    config
}

/// LIVE config forwarding to `model_url`.
pub fn live_config(model_url: Option<String>) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.mode = Mode::Live;
    config.live.model_url = model_url;
    config
}

/// A PNG-signed blob of exactly `len` bytes.
pub fn fake_png(len: usize) -> Vec<u8> {
    let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
    bytes.extend((0..len.saturating_sub(8)).map(|i| (i % 251) as u8));
    bytes.truncate(len);
    bytes
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Multipart form with the given `(field, filename, bytes)` parts.
pub fn upload_form(parts: &[(&str, &str, &[u8])]) -> reqwest::multipart::Form {
    parts.iter().fold(reqwest::multipart::Form::new(), |form, (field, file_name, bytes)| {
        form.part(
            field.to_string(),
            reqwest::multipart::Part::bytes(bytes.to_vec()).file_name(file_name.to_string()),
        )
    })
}
