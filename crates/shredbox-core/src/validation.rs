//! Upload validation: size cap, extension and content-type allow-lists, and
//! display-name sanitization.

use std::path::Path;

use crate::config::Config;

/// Common validation errors for uploaded files
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("file too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("file extension .{extension} is not allowed")]
    ExtensionNotAllowed { extension: String },

    #[error("file type {content_type} is not allowed")]
    ContentTypeNotAllowed { content_type: String },

    #[error("invalid filename: {0}")]
    InvalidFilename(String),

    #[error("empty file")]
    EmptyFile,
}

/// Upload validator
///
/// Holds the allow-lists once so every ingestion shares the same rules
/// without re-reading configuration.
pub struct UploadValidator {
    max_file_size: u64,
    allowed_extensions: Vec<String>,
    allowed_content_types: Vec<String>,
}

impl UploadValidator {
    pub fn new(
        max_file_size: u64,
        allowed_extensions: Vec<String>,
        allowed_content_types: Vec<String>,
    ) -> Self {
        Self {
            max_file_size,
            allowed_extensions,
            allowed_content_types,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.max_file_size_bytes,
            config.allowed_extensions.clone(),
            config.allowed_content_types.clone(),
        )
    }

    pub fn validate_file_size(&self, size: u64) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }
        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }
        Ok(())
    }

    pub fn validate_extension(&self, filename: &str) -> Result<(), ValidationError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .ok_or_else(|| ValidationError::InvalidFilename(filename.to_string()))?;

        if !self.allowed_extensions.contains(&extension) {
            return Err(ValidationError::ExtensionNotAllowed { extension });
        }
        Ok(())
    }

    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        let normalized = content_type.to_lowercase();
        if !self
            .allowed_content_types
            .iter()
            .any(|ct| ct == &normalized)
        {
            return Err(ValidationError::ContentTypeNotAllowed {
                content_type: content_type.to_string(),
            });
        }
        Ok(())
    }

    /// Validate all aspects of an upload
    pub fn validate(
        &self,
        filename: &str,
        content_type: &str,
        size: u64,
    ) -> Result<(), ValidationError> {
        self.validate_file_size(size)?;
        self.validate_extension(filename)?;
        self.validate_content_type(content_type)?;
        Ok(())
    }
}

/// Sanitize a display name: keep only the final path component, drop
/// traversal sequences, replace shell/filesystem-hostile characters, cap the
/// length. The result is display-only; blobs on disk are named by file id.
pub fn sanitize_file_name(filename: &str) -> String {
    const MAX: usize = 255;
    let base = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);
    if base.contains("..") {
        return "file".to_string();
    }
    let s: String = base
        .chars()
        .take(MAX)
        .map(|c| match c {
            '/' | '\\' | '<' | '>' | ':' | '"' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let s = s.trim().to_string();
    if s.is_empty() {
        "file".to_string()
    } else {
        s
    }
}
