//! Session repository
//!
//! Layers the domain rules over a raw [`SessionStore`] backend: unique code
//! allocation with a bounded retry, TTL expiry that self-heals on read,
//! per-session lock scopes for every mutation, and destruction that erases
//! blobs before the record disappears.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::fs;
use tokio::sync::OwnedMutexGuard;

use shredbox_core::constants::CODE_MAX_ATTEMPTS;
use shredbox_core::models::{Session, SessionStatus};
use shredbox_core::{codes, AppError};

use crate::shred::SecureEraser;
use crate::traits::SessionStore;

pub struct SessionRepository {
    store: Arc<dyn SessionStore>,
    eraser: SecureEraser,
    uploads_dir: PathBuf,
    ttl: chrono::Duration,
    /// One async mutex per live session code. Read-modify-write and
    /// destruction serialize behind it; plain reads do not.
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl SessionRepository {
    pub async fn new(
        store: Arc<dyn SessionStore>,
        eraser: SecureEraser,
        uploads_dir: impl Into<PathBuf>,
        ttl: chrono::Duration,
    ) -> Result<Self, AppError> {
        let uploads_dir = uploads_dir.into();
        fs::create_dir_all(&uploads_dir).await.map_err(|e| {
            AppError::Storage(format!(
                "failed to create uploads directory {}: {}",
                uploads_dir.display(),
                e
            ))
        })?;
        Ok(SessionRepository {
            store,
            eraser,
            uploads_dir,
            ttl,
            locks: Mutex::new(HashMap::new()),
        })
    }

    /// Directory holding this session's encrypted blobs.
    pub fn session_dir(&self, code: &str) -> PathBuf {
        self.uploads_dir.join(code)
    }

    async fn lock_for(&self, code: &str) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut map = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            map.entry(code.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        mutex.lock_owned().await
    }

    fn drop_lock_entry(&self, code: &str) {
        let mut map = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        map.remove(code);
    }

    /// Create a fresh active session under a newly allocated unique code.
    /// Collisions are retried up to a hard cap.
    pub async fn create(&self) -> Result<Session, AppError> {
        for attempt in 1..=CODE_MAX_ATTEMPTS {
            let code = codes::generate_code();
            if self.store.get(&code).await?.is_some() {
                tracing::debug!(attempt, "session code collision, retrying");
                continue;
            }
            let session = Session::new(code, Utc::now(), self.ttl);
            self.store.put(&session).await?;
            tracing::info!(
                code = %session.code,
                expires_at = %session.expires_at,
                "session created"
            );
            return Ok(session);
        }
        Err(AppError::ExhaustedRetries {
            attempts: CODE_MAX_ATTEMPTS,
        })
    }

    /// Load a session. An expired record self-heals here: its blobs are
    /// erased and the record deleted before `None` is returned, so expiry
    /// holds even if the sweeper has not run yet. A completed record left
    /// behind by a crash mid-completion heals the same way.
    pub async fn get(&self, code: &str) -> Result<Option<Session>, AppError> {
        match self.store.get(code).await? {
            Some(session) if Self::is_defunct(&session) => {
                tracing::info!(code, "session expired or completed, cleaning up on access");
                let _guard = self.lock_for(code).await;
                self.destroy_locked(code).await?;
                Ok(None)
            }
            other => Ok(other),
        }
    }

    /// A record that must read as gone: past its TTL, or completed (only a
    /// crash between the completion rewrite and the delete leaves one).
    fn is_defunct(session: &Session) -> bool {
        session.is_expired(Utc::now()) || session.status == SessionStatus::Completed
    }

    /// Read-modify-write under this session's lock scope. Concurrent
    /// updates to one session serialize here instead of losing writes.
    pub async fn update<F>(&self, code: &str, mutate: F) -> Result<Session, AppError>
    where
        F: FnOnce(&mut Session) + Send,
    {
        let _guard = self.lock_for(code).await;
        let mut session = match self.store.get(code).await? {
            Some(session) if Self::is_defunct(&session) => {
                self.destroy_locked(code).await?;
                return Err(AppError::SessionNotFound(code.to_string()));
            }
            Some(session) => session,
            None => return Err(AppError::SessionNotFound(code.to_string())),
        };
        mutate(&mut session);
        self.store.put(&session).await?;
        Ok(session)
    }

    /// Erase the session's blobs, then remove its record. Blobs go first:
    /// a crash in between leaves a record whose next access re-runs the
    /// erase, never an unreferenced directory of ciphertext. Idempotent.
    pub async fn destroy(&self, code: &str) -> Result<(), AppError> {
        let _guard = self.lock_for(code).await;
        self.destroy_locked(code).await
    }

    /// Explicit completion: erase blobs, rewrite the record as completed
    /// with zero files, then remove it. A crash in between never leaves an
    /// active record pointing at erased blobs.
    pub async fn complete(&self, code: &str) -> Result<(), AppError> {
        let _guard = self.lock_for(code).await;
        let mut session = match self.store.get(code).await? {
            Some(session) if Self::is_defunct(&session) => {
                self.destroy_locked(code).await?;
                return Err(AppError::SessionNotFound(code.to_string()));
            }
            Some(session) => session,
            None => return Err(AppError::SessionNotFound(code.to_string())),
        };

        self.eraser.erase_tree(&self.session_dir(code)).await?;
        session.status = SessionStatus::Completed;
        session.files.clear();
        self.store.put(&session).await?;
        self.store.delete(code).await?;
        self.drop_lock_entry(code);
        tracing::info!(code, "session completed and erased");
        Ok(())
    }

    async fn destroy_locked(&self, code: &str) -> Result<(), AppError> {
        self.eraser.erase_tree(&self.session_dir(code)).await?;
        self.store.delete(code).await?;
        self.drop_lock_entry(code);
        tracing::info!(code, "session destroyed");
        Ok(())
    }

    /// All stored codes; sweeper only.
    pub async fn list_codes(&self) -> Result<Vec<String>, AppError> {
        Ok(self.store.list().await?)
    }

    /// Erase any session directory with no matching store record, the
    /// leftovers of a crash between blob write and record update.
    pub async fn remove_orphan_dirs(&self) -> Result<usize, AppError> {
        let mut removed = 0usize;
        let mut entries = match fs::read_dir(&self.uploads_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if self.store.get(&name).await?.is_some() {
                continue;
            }
            let _guard = self.lock_for(&name).await;
            // recheck under the lock; an ingest may have raced us
            if self.store.get(&name).await?.is_some() {
                continue;
            }
            tracing::warn!(dir = %name, "erasing orphaned session directory");
            if let Err(e) = self.eraser.erase_tree(&entry.path()).await {
                tracing::error!(dir = %name, error = %e, "failed to erase orphaned directory");
                continue;
            }
            self.drop_lock_entry(&name);
            removed += 1;
        }
        Ok(removed)
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    pub fn eraser(&self) -> &SecureEraser {
        &self.eraser
    }
}
