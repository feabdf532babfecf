use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::config::Mode;
use crate::http::request::request_id;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::relay::RelayError;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    pub ok: bool,
    pub mode: Mode,
}

pub async fn healthz(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        ok: true,
        mode: state.config.mode,
    })
}

/// Serve the sample image regardless of mode.
pub async fn mock_image(State(state): State<AppState>) -> Response {
    match state.relay.load_mock_image().await {
        Ok(image) => image.into_response(),
        Err(RelayError::MockImageNotFound(path)) => {
            tracing::warn!(path = ?path, "Mock image not found");
            ApiError::new(StatusCode::NOT_FOUND, "Mock image not found").into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to serve mock image");
            e.into_response()
        }
    }
}

/// Main try-on endpoint.
pub async fn generate(State(state): State<AppState>, request: Request) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers());
    let mode = state.relay.mode();

    tracing::debug!(request_id = %request_id, mode = %mode, "Generate request received");

    match state.relay.generate(request).await {
        Ok(image) => {
            tracing::info!(
                request_id = %request_id,
                mode = %mode,
                bytes = image.body.len(),
                content_type = %image.content_type,
                elapsed_ms = start_time.elapsed().as_millis() as u64,
                "Generated image"
            );
            metrics::record_generate(mode, "success", start_time);
            image.into_response()
        }
        Err(e) => {
            if e.is_client_error() {
                tracing::warn!(request_id = %request_id, mode = %mode, error = %e, "Rejected generate request");
            } else {
                tracing::error!(request_id = %request_id, mode = %mode, error = %e, "Error in /api/generate");
            }
            metrics::record_generate(mode, e.outcome(), start_time);
            e.into_response()
        }
    }
}
