//! Ingestion pipeline: validate → sanitize → encrypt → register.

mod service;
mod types;

pub use service::UploadService;
pub use types::StagedUpload;
