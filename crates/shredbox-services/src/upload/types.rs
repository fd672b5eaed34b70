//! Types for the ingestion pipeline.

use std::path::PathBuf;

/// A plaintext upload the request-parsing collaborator has already staged
/// on disk. Once handed to [`UploadService::ingest`](super::UploadService),
/// the pipeline owns the staged file and erases it whatever the outcome.
#[derive(Debug, Clone)]
pub struct StagedUpload {
    pub original_filename: String,
    pub content_type: String,
    pub size: u64,
    pub path: PathBuf,
}
