//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional TOML file (CONFIG_PATH)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (MODE, MODEL_URL, PORT, ...)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → shared via Arc with the request handlers
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup and never mutated
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_from_env, load_with, ConfigError};
pub use schema::{
    CorsConfig, LifecycleConfig, ListenerConfig, LiveConfig, LogFormat, MockConfig, Mode,
    ObservabilityConfig, RelayConfig, UploadConfig,
};
