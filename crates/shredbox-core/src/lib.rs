//! Shredbox Core Library
//!
//! This crate provides the domain models, error types, configuration,
//! validation, and the streaming file cipher shared across all shredbox
//! components.

pub mod codes;
pub mod config;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use crypto::{generate_key_hex, EncryptionKey, FileCipher};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{FileCategory, FileRecord, Session, SessionKey, SessionStatus, SessionView};
pub use validation::{sanitize_file_name, UploadValidator, ValidationError};
