//! Error types module
//!
//! All errors are unified under the `AppError` enum. The `ErrorMetadata`
//! trait lets the routing collaborator map an error to a response without
//! this crate knowing anything about HTTP: status code, machine-readable
//! error code, a client-safe message, and whether internal detail must be
//! hidden.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "SESSION_NOT_FOUND")
    fn error_code(&self) -> &'static str;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid session code: {0}")]
    InvalidCode(String),

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("corrupt ciphertext: {0}")]
    CorruptCiphertext(String),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("storage failure: {0}")]
    Storage(String),

    #[error("no unique session code found after {attempts} attempts")]
    ExhaustedRetries { attempts: u32 },

    #[error("invalid encryption key: {0}")]
    InvalidKey(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Storage(format!("I/O error: {}", err))
    }
}

/// Static metadata per variant: (http_status, error_code, sensitive, log_level).
/// `client_message` stays per-variant for dynamic content.
fn app_error_static_metadata(err: &AppError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        AppError::Validation(_) => (400, "VALIDATION_FAILED", false, LogLevel::Debug),
        AppError::InvalidCode(_) => (400, "INVALID_SESSION_CODE", false, LogLevel::Debug),
        AppError::SessionNotFound(_) => (404, "SESSION_NOT_FOUND", false, LogLevel::Debug),
        AppError::FileNotFound(_) => (404, "FILE_NOT_FOUND", false, LogLevel::Debug),
        AppError::CorruptCiphertext(_) => (500, "CORRUPT_CIPHERTEXT", true, LogLevel::Error),
        AppError::DecryptionFailed(_) => (500, "DECRYPTION_FAILED", true, LogLevel::Error),
        AppError::Storage(_) => (500, "STORAGE_FAILURE", true, LogLevel::Error),
        AppError::ExhaustedRetries { .. } => (503, "EXHAUSTED_RETRIES", false, LogLevel::Warn),
        AppError::InvalidKey(_) => (500, "INVALID_KEY", true, LogLevel::Error),
        AppError::Internal(_) => (500, "INTERNAL_ERROR", true, LogLevel::Error),
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Validation(ref msg) => msg.clone(),
            AppError::InvalidCode(_) => "Invalid session code format".to_string(),
            AppError::SessionNotFound(_) => "Session not found or expired".to_string(),
            AppError::FileNotFound(_) => "File not found in session".to_string(),
            AppError::CorruptCiphertext(_) | AppError::DecryptionFailed(_) => {
                "Failed to read file".to_string()
            }
            AppError::Storage(_) | AppError::InvalidKey(_) | AppError::Internal(_) => {
                "Internal server error".to_string()
            }
            AppError::ExhaustedRetries { .. } => {
                "Could not allocate a session code, try again".to_string()
            }
        }
    }
}
