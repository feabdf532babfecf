//! Model service client.
//!
//! # Responsibilities
//! - Build the outbound `person` + `cloth` multipart body from stored uploads
//! - Enforce the total time ceiling on the exchange
//! - Enforce the response size ceiling while reading the body
//! - Turn non-success replies into errors carrying the service's own detail
//!
//! # Design Decisions
//! - One shared `reqwest::Client` (connection pool) per process
//! - Uploads are streamed from disk, never buffered whole in memory
//! - No retries: inference calls are expensive and not idempotent

use std::error::Error as _;
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use bytes::{Bytes, BytesMut};
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use url::Url;

use crate::config::LiveConfig;
use crate::observability::metrics;
use crate::relay::error::DownstreamError;
use crate::relay::intake::{UploadedPart, CLOTH_FIELD, PERSON_FIELD};

/// Most of a failed response body read for error reporting.
pub const ERROR_BODY_LIMIT: u64 = 64 * 1024;

/// Image returned by the model service.
#[derive(Debug, Clone)]
pub struct DownstreamReply {
    /// Declared `Content-Type`, if any.
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// HTTP client for the model service.
#[derive(Debug, Clone)]
pub struct DownstreamClient {
    http: reqwest::Client,
    timeout: Duration,
    max_response_bytes: u64,
}

impl DownstreamClient {
    /// Create a client enforcing the ceilings from `config`.
    pub fn new(config: &LiveConfig) -> Result<Self, DownstreamError> {
        let timeout = config.request_timeout();
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DownstreamError::Request(describe(&e)))?;

        Ok(Self {
            http,
            timeout,
            max_response_bytes: config.max_response_bytes,
        })
    }

    /// POST both uploads to `endpoint` and return the generated image.
    pub async fn generate(
        &self,
        endpoint: &str,
        person: &UploadedPart,
        cloth: &UploadedPart,
    ) -> Result<DownstreamReply, DownstreamError> {
        let url = Url::parse(endpoint).map_err(|e| DownstreamError::InvalidEndpoint {
            url: endpoint.to_string(),
            message: e.to_string(),
        })?;

        let form = Form::new()
            .part(PERSON_FIELD, file_part(PERSON_FIELD, person).await?)
            .part(CLOTH_FIELD, file_part(CLOTH_FIELD, cloth).await?);

        let started = Instant::now();
        let result = self.exchange(url, form).await;
        match &result {
            Ok(reply) => {
                tracing::debug!(
                    bytes = reply.body.len(),
                    content_type = ?reply.content_type,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Model service replied"
                );
                metrics::record_downstream("success", started);
            }
            Err(e) => metrics::record_downstream(e.kind(), started),
        }
        result
    }

    async fn exchange(&self, url: Url, form: Form) -> Result<DownstreamReply, DownstreamError> {
        let mut response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = read_error_detail(&mut response, status).await;
            return Err(DownstreamError::Status { status, detail });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if let Some(declared) = response.content_length() {
            if declared > self.max_response_bytes {
                return Err(DownstreamError::ResponseTooLarge {
                    limit: self.max_response_bytes,
                });
            }
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.classify(e))? {
            if (body.len() + chunk.len()) as u64 > self.max_response_bytes {
                return Err(DownstreamError::ResponseTooLarge {
                    limit: self.max_response_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(DownstreamReply {
            content_type,
            body: body.freeze(),
        })
    }

    fn classify(&self, e: reqwest::Error) -> DownstreamError {
        if e.is_timeout() {
            DownstreamError::Timeout {
                secs: self.timeout.as_secs(),
            }
        } else {
            DownstreamError::Request(describe(&e))
        }
    }
}

async fn file_part(field: &'static str, upload: &UploadedPart) -> Result<Part, DownstreamError> {
    let content_type = upload.content_type().and_then(|ct| {
        let parsed = forwarded_mime(ct);
        if parsed.is_none() {
            tracing::debug!(field, content_type = ct, "Dropping unparseable part content type");
        }
        parsed
    });

    let part = Part::stream_with_length(open_upload(field, upload).await?, upload.size())
        .file_name(upload.file_name().to_string());
    match content_type {
        // Already parsed, so this cannot fail.
        Some(mime) => part
            .mime_str(mime.as_ref())
            .map_err(|e| DownstreamError::Request(describe(&e))),
        None => Ok(part),
    }
}

/// Client part content type to forward, if it is a valid MIME type.
fn forwarded_mime(content_type: &str) -> Option<mime::Mime> {
    content_type.trim().parse().ok()
}

async fn open_upload(field: &'static str, upload: &UploadedPart) -> Result<reqwest::Body, DownstreamError> {
    let file = tokio::fs::File::open(upload.path())
        .await
        .map_err(|source| DownstreamError::Upload { field, source })?;
    Ok(reqwest::Body::from(file))
}

/// Read at most [`ERROR_BODY_LIMIT`] bytes of a failed response and pull out
/// the most useful message.
async fn read_error_detail(response: &mut reqwest::Response, status: StatusCode) -> String {
    let mut body = BytesMut::new();
    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let room = ERROR_BODY_LIMIT as usize - body.len();
                body.extend_from_slice(&chunk[..chunk.len().min(room)]);
                if body.len() as u64 >= ERROR_BODY_LIMIT {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(error = %e, "Failed to read model service error body");
                break;
            }
        }
    }
    extract_error_detail(&body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string())
}

/// Message from an error body: a JSON `error` / `detail` / `message` field,
/// otherwise the trimmed text. `None` for an empty body.
pub fn extract_error_detail(body: &[u8]) -> Option<String> {
    if let Ok(json) = serde_json::from_slice::<serde_json::Value>(body) {
        let found = ["error", "detail", "message"].iter().find_map(|key| match json.get(*key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(obj) => obj.get("message").and_then(|m| m.as_str()).map(str::to_string),
            _ => None,
        });
        if found.is_some() {
            return found;
        }
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Error text including its source chain, which is where reqwest keeps the
/// actual cause (connection refused, DNS failure, ...).
fn describe(e: &reqwest::Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
