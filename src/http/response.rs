//! Response construction.
//!
//! # Responsibilities
//! - Render images with `Content-Type` and exact `Content-Length`
//! - Render every error as `{ "ok": false, "error": "..." }`
//! - Map relay errors to HTTP status codes

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::relay::{GeneratedImage, RelayError};

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub ok: bool,
    pub error: String,
}

/// An error status with its client-facing message.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            ok: false,
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<&RelayError> for ApiError {
    fn from(err: &RelayError) -> Self {
        ApiError::new(err.status(), err.to_string())
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        ApiError::from(&self).into_response()
    }
}

impl IntoResponse for GeneratedImage {
    fn into_response(self) -> Response {
        let length = self.body.len();
        (
            [
                (header::CONTENT_TYPE, self.content_type),
                (header::CONTENT_LENGTH, length.to_string()),
            ],
            self.body,
        )
            .into_response()
    }
}
