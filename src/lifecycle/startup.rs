//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the relay from a validated configuration
//! - Bind the listener and begin accepting traffic
//! - Wire OS signals to graceful shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{Mode, RelayConfig};
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::relay::DownstreamError;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build model client: {0}")]
    Client(#[from] DownstreamError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Serve `config` until a shutdown signal arrives.
pub async fn start(config: RelayConfig) -> Result<(), StartupError> {
    let address = config.listener.bind_address();

    tracing::info!(
        mode = %config.mode,
        model_url = ?config.live.model_url,
        mock_image = ?config.mock.resolved_image_path(),
        request_timeout_secs = config.live.request_timeout_secs,
        max_response_bytes = config.live.max_response_bytes,
        "Configuration loaded"
    );
    if config.mode == Mode::Live && config.live.model_url.is_none() {
        tracing::warn!("MODE=LIVE but MODEL_URL is not set; generate requests will fail");
    }

    let server = HttpServer::new(config)?;
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    let local_addr = listener.local_addr().map_err(StartupError::Serve)?;
    tracing::info!(
        address = %local_addr,
        mode = %server.config().mode,
        "Listening on {} MODE={}",
        local_addr.port(),
        server.config().mode
    );

    let shutdown = Shutdown::new();
    let signals = shutdown.trigger_on_signal();
    let result = server.run(listener, shutdown.subscribe()).await;
    signals.abort();

    result.map_err(StartupError::Serve)
}
