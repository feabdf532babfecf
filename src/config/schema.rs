//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits so a TOML file can supply any subset of
//! fields; environment overrides are applied on top by the loader.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Operating mode, fixed for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    /// Serve the static sample image.
    #[default]
    Mock,
    /// Forward uploads to the model service.
    Live,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Mock => "MOCK",
            Mode::Live => "LIVE",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MOCK" => Ok(Mode::Mock),
            "LIVE" => Ok(Mode::Live),
            other => Err(format!("unknown mode '{}', expected MOCK or LIVE", other)),
        }
    }
}

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// MOCK or LIVE.
    pub mode: Mode,

    /// Listener configuration (host, port).
    pub listener: ListenerConfig,

    /// Model service settings, used in LIVE mode.
    pub live: LiveConfig,

    /// Sample image settings, used in MOCK mode and by `/mock-image`.
    pub mock: MockConfig,

    /// Temporary upload storage.
    pub uploads: UploadConfig,

    pub cors: CorsConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    pub lifecycle: LifecycleConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// TCP port to listen on.
    pub port: u16,
}

impl ListenerConfig {
    /// Combined `host:port` bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Downstream model service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LiveConfig {
    /// Model endpoint receiving the multipart POST. Required in LIVE mode.
    pub model_url: Option<String>,

    /// Ceiling on the whole downstream exchange, in seconds.
    pub request_timeout_secs: u64,

    /// Largest response body accepted from the model service.
    pub max_response_bytes: u64,

    /// Extra time a whole `/api/generate` request may take on top of
    /// `request_timeout_secs`, covering upload intake.
    pub request_slack_secs: u64,
}

impl LiveConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Ceiling on an entire generate request, intake included.
    pub fn request_ceiling(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.saturating_add(self.request_slack_secs))
    }
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            model_url: None,
            request_timeout_secs: 5 * 60,
            max_response_bytes: 200 * 1024 * 1024,
            request_slack_secs: 30,
        }
    }
}

/// Sample image configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MockConfig {
    /// Path of the sample PNG, absolute or relative to `base_dir`.
    pub image_path: PathBuf,

    /// Directory relative paths resolve against. Filled with the working
    /// directory at load time when left unset.
    pub base_dir: Option<PathBuf>,
}

impl MockConfig {
    /// Absolute location of the sample image.
    pub fn resolved_image_path(&self) -> PathBuf {
        if self.image_path.is_absolute() {
            return self.image_path.clone();
        }
        match &self.base_dir {
            Some(base) => base.join(&self.image_path),
            None => self.image_path.clone(),
        }
    }
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            image_path: PathBuf::from("mock-samples/sample1.png"),
            base_dir: None,
        }
    }
}

/// Temporary upload storage.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Directory receiving per-request temporary files.
    pub dir: PathBuf,

    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
}

impl UploadConfig {
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: std::env::temp_dir().join("tryon-relay-uploads"),
            max_body_bytes: 50 * 1024 * 1024, // 50MB
        }
    }
}

/// Cross-origin settings for browser clients.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins; `"*"` allows any.
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn allows_any(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}', expected pretty or json", other)),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Prometheus scrape address; metrics export is off when unset.
    pub metrics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_address: None,
        }
    }
}

/// Process lifecycle settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Delay between a fatal error and process exit, in milliseconds.
    pub fatal_grace_ms: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self { fatal_grace_ms: 1000 }
    }
}
