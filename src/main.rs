//! Try-on Relay
//!
//! A thin HTTP relay in front of an image-generation model service.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │                 TRY-ON RELAY                  │
//!   POST /api/generate   │  ┌────────┐    ┌────────────┐                 │
//!   ─────────────────────┼─▶│  http  │───▶│   relay    │                 │
//!   (person, cloth)      │  │ server │    │orchestrator│                 │
//!                        │  └────────┘    └─────┬──────┘                 │
//!                        │                 MOCK │ LIVE                    │
//!                        │            ┌─────────┴──────────┐             │
//!                        │            ▼                    ▼             │
//!                        │     ┌────────────┐      ┌──────────────┐      │
//!                        │     │ sample PNG │      │ intake (tmp) │      │
//!                        │     │  on disk   │      │ + downstream │──────┼──▶ Model
//!                        │     └────────────┘      └──────────────┘      │    Service
//!                        │                                               │
//!                        │  config · observability · lifecycle           │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::process::ExitCode;
use std::time::Duration;

use tryon_relay::config::{self, LifecycleConfig, ObservabilityConfig};
use tryon_relay::lifecycle;
use tryon_relay::observability::{logging, metrics};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match config::load_from_env() {
        Ok(config) => config,
        Err(e) => {
            logging::init_logging(&ObservabilityConfig::default());
            let grace = Duration::from_millis(LifecycleConfig::default().fatal_grace_ms);
            return lifecycle::fatal(&format!("configuration error: {}", e), grace).await;
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!("tryon-relay v{} starting", env!("CARGO_PKG_VERSION"));

    if let Some(addr) = &config.observability.metrics_address {
        match addr.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(metrics_address = %addr, "Failed to parse metrics address"),
        }
    }

    let grace = Duration::from_millis(config.lifecycle.fatal_grace_ms);
    let code = lifecycle::supervise(lifecycle::start(config), grace).await;
    if code == ExitCode::SUCCESS {
        tracing::info!("Shutdown complete");
    }
    code
}
