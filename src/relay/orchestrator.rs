//! Request lifecycle for `/api/generate`.
//!
//! ```text
//! MOCK: read sample image ─────────────────────────────────────▶ image
//! LIVE: model URL? ─▶ collect uploads ─▶ both present? ─▶ model ─▶ image
//!                          └──────────── cleanup on every exit ─────┘
//! ```
//!
//! The whole exchange runs under `live.request_ceiling()`. When it expires
//! the in-flight future is dropped, and the upload guards it owns delete
//! their files.

use std::sync::Arc;

use axum::extract::Request;
use bytes::Bytes;

use crate::config::{Mode, RelayConfig};
use crate::relay::downstream::DownstreamClient;
use crate::relay::error::{DownstreamError, RelayError};
use crate::relay::intake::{self, Uploads};

/// Content type for the sample image and for model replies without one.
pub const DEFAULT_IMAGE_TYPE: &str = "image/png";

/// A finished image ready to send to the client.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub content_type: String,
    pub body: Bytes,
}

/// Drives a single generate request through MOCK or LIVE handling.
pub struct RelayOrchestrator {
    config: Arc<RelayConfig>,
    downstream: DownstreamClient,
}

impl RelayOrchestrator {
    pub fn new(config: Arc<RelayConfig>) -> Result<Self, DownstreamError> {
        let downstream = DownstreamClient::new(&config.live)?;
        Ok(Self { config, downstream })
    }

    pub fn mode(&self) -> Mode {
        self.config.mode
    }

    /// Produce the try-on image for `request`.
    pub async fn generate(&self, request: Request) -> Result<GeneratedImage, RelayError> {
        let ceiling = self.config.live.request_ceiling();
        match tokio::time::timeout(ceiling, self.dispatch(request)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(RelayError::RequestTimeout {
                secs: ceiling.as_secs(),
            }),
        }
    }

    async fn dispatch(&self, request: Request) -> Result<GeneratedImage, RelayError> {
        match self.config.mode {
            Mode::Mock => self.load_mock_image().await,
            Mode::Live => self.relay_live(request).await,
        }
    }

    /// Read the configured sample image. The request body is never touched.
    pub async fn load_mock_image(&self) -> Result<GeneratedImage, RelayError> {
        let path = self.config.mock.resolved_image_path();
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(GeneratedImage {
                content_type: DEFAULT_IMAGE_TYPE.to_string(),
                body: Bytes::from(bytes),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(RelayError::MockImageNotFound(path)),
            Err(e) => Err(RelayError::MockImageRead(e)),
        }
    }

    async fn relay_live(&self, request: Request) -> Result<GeneratedImage, RelayError> {
        let endpoint = self
            .config
            .live
            .model_url
            .as_deref()
            .ok_or(RelayError::ModelUrlNotConfigured)?;

        let uploads = intake::collect_uploads(request, self.config.uploads.dir()).await?;
        let outcome = self.forward(endpoint, &uploads).await;
        uploads.cleanup();
        outcome
    }

    async fn forward(&self, endpoint: &str, uploads: &Uploads) -> Result<GeneratedImage, RelayError> {
        let (person, cloth) = uploads.pair().ok_or(RelayError::MissingUploads)?;

        tracing::info!(
            person_bytes = person.size(),
            cloth_bytes = cloth.size(),
            "Forwarding uploads to model service"
        );

        let reply = self.downstream.generate(endpoint, person, cloth).await?;
        Ok(GeneratedImage {
            content_type: reply
                .content_type
                .unwrap_or_else(|| DEFAULT_IMAGE_TYPE.to_string()),
            body: reply.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use std::path::PathBuf;

    fn empty_request() -> Request {
        axum::http::Request::builder()
            .method("POST")
            .uri("/api/generate")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_mock_mode_ignores_body() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sample.png"), b"\x89PNG fake").unwrap();

        let mut config = RelayConfig::default();
        config.mock.image_path = PathBuf::from("sample.png");
        config.mock.base_dir = Some(dir.path().to_path_buf());

        let relay = RelayOrchestrator::new(Arc::new(config)).unwrap();
        let image = relay.generate(empty_request()).await.unwrap();
        assert_eq!(image.content_type, "image/png");
        assert_eq!(&image.body[..], b"\x89PNG fake");
    }

    #[tokio::test]
    async fn test_mock_mode_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = RelayConfig::default();
        config.mock.base_dir = Some(dir.path().to_path_buf());

        let relay = RelayOrchestrator::new(Arc::new(config)).unwrap();
        let err = relay.generate(empty_request()).await.unwrap_err();
        assert!(matches!(err, RelayError::MockImageNotFound(_)));
    }

    #[tokio::test]
    async fn test_live_mode_requires_model_url() {
        let mut config = RelayConfig::default();
        config.mode = Mode::Live;

        let relay = RelayOrchestrator::new(Arc::new(config)).unwrap();
        let err = relay.generate(empty_request()).await.unwrap_err();
        assert!(matches!(err, RelayError::ModelUrlNotConfigured));
    }

    #[tokio::test]
    async fn test_live_mode_without_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = RelayConfig::default();
        config.mode = Mode::Live;
        config.live.model_url = Some("http://127.0.0.1:9/infer".into());
        config.uploads.dir = dir.path().to_path_buf();

        let relay = RelayOrchestrator::new(Arc::new(config)).unwrap();
        let err = relay.generate(empty_request()).await.unwrap_err();
        assert!(matches!(err, RelayError::MissingUploads));
    }

    #[tokio::test]
    async fn test_stalled_upload_hits_request_ceiling() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = RelayConfig::default();
        config.mode = Mode::Live;
        config.live.model_url = Some("http://127.0.0.1:9/infer".into());
        config.live.request_timeout_secs = 1;
        config.live.request_slack_secs = 1;
        config.uploads.dir = dir.path().to_path_buf();

        // A multipart body that opens the person part and never finishes.
        let (mut tx, rx) = tokio::io::duplex(1024);
        let head = "--stall\r\nContent-Disposition: form-data; name=\"person\"; filename=\"p.png\"\r\n\r\nfirst-chunk";
        tokio::io::AsyncWriteExt::write_all(&mut tx, head.as_bytes()).await.unwrap();
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/api/generate")
            .header("content-type", "multipart/form-data; boundary=stall")
            .body(Body::from_stream(tokio_util::io::ReaderStream::new(rx)))
            .unwrap();

        let relay = RelayOrchestrator::new(Arc::new(config)).unwrap();
        let err = relay.generate(request).await.unwrap_err();
        assert!(matches!(err, RelayError::RequestTimeout { secs: 2 }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        drop(tx);
    }
}
