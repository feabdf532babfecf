//! Try-on image relay.
//!
//! Accepts a `person` and a `cloth` image, and returns a composited try-on
//! image: either a static sample (MOCK) or whatever the external model
//! service generates from the two uploads (LIVE).

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod relay;

pub use config::{Mode, RelayConfig};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use relay::{RelayError, RelayOrchestrator};
