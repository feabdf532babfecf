//! Relay error definitions.

use std::path::PathBuf;

use axum::http::StatusCode;
use thiserror::Error;

/// Errors from the outbound call to the model service.
#[derive(Debug, Error)]
pub enum DownstreamError {
    /// Model URL could not be parsed.
    #[error("invalid model URL '{url}': {message}")]
    InvalidEndpoint { url: String, message: String },

    /// A stored upload could not be reopened for forwarding.
    #[error("failed to read stored '{field}' upload: {source}")]
    Upload {
        field: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Connection, protocol or body transfer failure.
    #[error("model service request failed: {0}")]
    Request(String),

    /// The exchange exceeded the configured ceiling.
    #[error("model service did not respond within {secs} seconds")]
    Timeout { secs: u64 },

    /// Non-success status; `detail` is the service's own error text.
    #[error("model service returned {status}: {detail}")]
    Status { status: StatusCode, detail: String },

    #[error("model service response exceeds {limit} bytes")]
    ResponseTooLarge { limit: u64 },
}

impl DownstreamError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            DownstreamError::InvalidEndpoint { .. } => "invalid_endpoint",
            DownstreamError::Upload { .. } => "upload",
            DownstreamError::Request(_) => "request",
            DownstreamError::Timeout { .. } => "timeout",
            DownstreamError::Status { .. } => "status",
            DownstreamError::ResponseTooLarge { .. } => "too_large",
        }
    }
}

/// Errors surfaced at the request boundary of `/api/generate`.
#[derive(Debug, Error)]
pub enum RelayError {
    /// `person` or `cloth` missing from a LIVE request.
    #[error("person and cloth files required")]
    MissingUploads,

    /// The multipart body could not be read.
    #[error("{message}")]
    InvalidMultipart { status: StatusCode, message: String },

    /// Writing an upload to temporary storage failed.
    #[error("failed to store upload: {0}")]
    TempStorage(#[source] std::io::Error),

    #[error("MODEL_URL not configured")]
    ModelUrlNotConfigured,

    #[error("Mock image not found")]
    MockImageNotFound(PathBuf),

    #[error("failed to read mock image: {0}")]
    MockImageRead(#[source] std::io::Error),

    /// The whole request, upload intake included, outlived its ceiling.
    #[error("request timed out after {secs} seconds")]
    RequestTimeout { secs: u64 },

    #[error(transparent)]
    Downstream(#[from] DownstreamError),
}

impl RelayError {
    /// HTTP status reported to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MissingUploads => StatusCode::BAD_REQUEST,
            RelayError::InvalidMultipart { status, .. } => *status,
            RelayError::TempStorage(_)
            | RelayError::ModelUrlNotConfigured
            | RelayError::MockImageNotFound(_)
            | RelayError::MockImageRead(_)
            | RelayError::RequestTimeout { .. }
            | RelayError::Downstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }

    /// Outcome label for metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            RelayError::MissingUploads | RelayError::InvalidMultipart { .. } => "client_error",
            RelayError::ModelUrlNotConfigured
            | RelayError::MockImageNotFound(_)
            | RelayError::MockImageRead(_) => "config_error",
            RelayError::TempStorage(_) => "internal_error",
            RelayError::RequestTimeout { .. } => "timeout",
            RelayError::Downstream(_) => "downstream_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(RelayError::MissingUploads.status(), StatusCode::BAD_REQUEST);
        assert_eq!(RelayError::ModelUrlNotConfigured.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            RelayError::InvalidMultipart {
                status: StatusCode::PAYLOAD_TOO_LARGE,
                message: "too big".into(),
            }
            .status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        let downstream = RelayError::from(DownstreamError::Timeout { secs: 300 });
        assert_eq!(downstream.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(downstream.outcome(), "downstream_error");

        let ceiling = RelayError::RequestTimeout { secs: 330 };
        assert_eq!(ceiling.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ceiling.to_string(), "request timed out after 330 seconds");
    }

    #[test]
    fn test_downstream_message_carries_detail() {
        let err = RelayError::from(DownstreamError::Status {
            status: StatusCode::BAD_GATEWAY,
            detail: "model overloaded".into(),
        });
        assert_eq!(err.to_string(), "model service returned 502 Bad Gateway: model overloaded");
    }

    #[test]
    fn test_missing_uploads_message() {
        assert_eq!(RelayError::MissingUploads.to_string(), "person and cloth files required");
    }
}
