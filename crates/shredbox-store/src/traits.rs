//! Session store abstraction
//!
//! The store is a plain key-value mapping from session code to session
//! record. The physical backing (one JSON file per session, an in-memory
//! map) is an implementation detail behind this trait; everything with
//! richer semantics (expiry, locking, erasure) lives in the
//! [`SessionRepository`](crate::repository::SessionRepository).

use async_trait::async_trait;
use thiserror::Error;

use shredbox_core::{AppError, Session};

/// Store operation errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Storage(err.to_string())
    }
}

/// Key-value session store.
///
/// All backends must implement this trait. `delete` is idempotent; `get`
/// performs no expiry interpretation: an expired record is still returned
/// and it is the repository's job to treat it as gone.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a session record by code.
    async fn get(&self, code: &str) -> StoreResult<Option<Session>>;

    /// Persist a session record, replacing any previous one.
    async fn put(&self, session: &Session) -> StoreResult<()>;

    /// Remove a session record; succeeds silently if absent.
    async fn delete(&self, code: &str) -> StoreResult<()>;

    /// All stored session codes. Used only by the expiry sweeper.
    async fn list(&self) -> StoreResult<Vec<String>>;
}
