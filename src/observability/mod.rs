//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers, intake and the model client produce:
//!     → logging.rs (structured log events, request ID fields)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```

pub mod logging;
pub mod metrics;
