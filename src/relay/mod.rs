//! Upload relay subsystem.
//!
//! # Data Flow
//! ```text
//! POST /api/generate
//!     → orchestrator.rs (mode branch)
//!     → intake.rs (multipart → temporary files)       [LIVE]
//!     → downstream.rs (multipart POST to model)       [LIVE]
//!     → GeneratedImage → http handler → client
//! ```
//!
//! # Design Decisions
//! - No state survives a request; config is read-only
//! - Temporary files are owned by the request that wrote them and removed
//!   on every exit path, including cancellation (drop guard)
//! - Missing model URL is checked before the body is read

pub mod downstream;
pub mod error;
pub mod intake;
pub mod orchestrator;

pub use downstream::{DownstreamClient, DownstreamReply};
pub use error::{DownstreamError, RelayError};
pub use intake::{PartKind, UploadedPart, Uploads, CLOTH_FIELD, PERSON_FIELD};
pub use orchestrator::{GeneratedImage, RelayOrchestrator, DEFAULT_IMAGE_TYPE};
