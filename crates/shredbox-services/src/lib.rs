//! Shredbox Services Layer
//!
//! This crate is the service facade consumed by the routing collaborator:
//! session lifecycle (`SessionService`), the ingestion pipeline
//! (`UploadService`), the retrieval path (`RetrievalService`), the expiry
//! sweeper (`CleanupService`), and telemetry initialization. Keep
//! orchestration here; keep thin HTTP handling outside this workspace.

pub mod cleanup;
pub mod retrieval;
pub mod session;
pub mod telemetry;
pub mod upload;

pub use cleanup::CleanupService;
pub use retrieval::{PlaintextStream, RetrievalService};
pub use session::SessionService;
pub use telemetry::init_telemetry;
pub use upload::{StagedUpload, UploadService};

// Re-export the lower layers so the routing collaborator depends on a
// single facade crate.
pub use shredbox_core::{
    generate_key_hex, AppError, Config, ErrorMetadata, FileCipher, LogLevel, SessionView,
};
pub use shredbox_store::{
    FsSessionStore, MemorySessionStore, SecureEraser, SessionRepository, SessionStore,
};
