//! Filesystem session store: one JSON record file per session.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use shredbox_core::Session;

use crate::traits::{SessionStore, StoreError, StoreResult};

const RECORD_EXT: &str = "json";

/// One-JSON-file-per-session store. Writes go through a temp file and a
/// rename so a crash mid-write never leaves a torn record behind.
#[derive(Clone)]
pub struct FsSessionStore {
    dir: PathBuf,
}

impl FsSessionStore {
    pub async fn new(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await.map_err(|e| {
            StoreError::Backend(format!(
                "failed to create session store directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(FsSessionStore { dir })
    }

    /// Record path for a code. Codes come from the repository already
    /// normalized, but a store must not be the component that lets a
    /// hostile code escape its directory.
    fn record_path(&self, code: &str) -> StoreResult<PathBuf> {
        if code.is_empty() || !code.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(StoreError::Backend(format!(
                "refusing non-alphanumeric session code {:?}",
                code
            )));
        }
        Ok(self.dir.join(format!("{}.{}", code, RECORD_EXT)))
    }

    async fn write_atomic(&self, path: &Path, data: &[u8]) -> StoreResult<()> {
        let tmp = path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FsSessionStore {
    async fn get(&self, code: &str) -> StoreResult<Option<Session>> {
        let path = self.record_path(code)?;
        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let session = serde_json::from_slice(&data)?;
        Ok(Some(session))
    }

    async fn put(&self, session: &Session) -> StoreResult<()> {
        let path = self.record_path(&session.code)?;
        let data = serde_json::to_vec_pretty(session)?;
        self.write_atomic(&path, &data).await?;
        tracing::debug!(code = %session.code, path = %path.display(), "session record written");
        Ok(())
    }

    async fn delete(&self, code: &str) -> StoreResult<()> {
        let path = self.record_path(code)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(code, "session record deleted");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> StoreResult<Vec<String>> {
        let mut codes = Vec::new();
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(codes),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            // skip in-flight temp files and anything that is not a record
            if let Some(code) = name.strip_suffix(&format!(".{}", RECORD_EXT)) {
                if !code.is_empty() && code.bytes().all(|b| b.is_ascii_alphanumeric()) {
                    codes.push(code.to_string());
                }
            }
        }
        Ok(codes)
    }
}
