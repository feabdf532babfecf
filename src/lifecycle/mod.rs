//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Build relay → Bind listener → Serve
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGTERM/SIGINT → Stop accepting → Drain in-flight requests → Exit
//!
//! Supervision (supervisor.rs):
//!     Server error or panic → Log → Grace delay → Exit non-zero
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod supervisor;

pub use shutdown::Shutdown;
pub use startup::{start, StartupError};
pub use supervisor::{fatal, supervise};
