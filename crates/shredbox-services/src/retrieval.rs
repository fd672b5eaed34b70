//! Retrieval path: decrypt one file into a transient spool file and stream
//! it out, erasing the plaintext on every exit (completion, stream error,
//! or client disconnect alike).

use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use chrono::Utc;
use futures::Stream;
use tokio::fs;
use tokio_util::io::ReaderStream;

use shredbox_core::{codes, AppError, FileCipher};
use shredbox_store::{shred, SecureEraser, SessionRepository};

pub struct RetrievalService {
    repository: Arc<SessionRepository>,
    spool_dir: PathBuf,
}

impl RetrievalService {
    pub fn new(repository: Arc<SessionRepository>, spool_dir: impl Into<PathBuf>) -> Self {
        RetrievalService {
            repository,
            spool_dir: spool_dir.into(),
        }
    }

    /// Decrypt `<sessionDir>/<fileId>.enc` and return a plaintext stream.
    ///
    /// On decryption failure the ciphertext blob is left in place for
    /// inspection; only the transient spool file is erased. The returned
    /// stream owns the spool file and erases it when dropped.
    #[tracing::instrument(skip(self))]
    pub async fn retrieve(&self, code: &str, file_id: &str) -> Result<PlaintextStream, AppError> {
        let code = codes::normalize_code(code)?;
        let session = self
            .repository
            .get(&code)
            .await?
            .ok_or_else(|| AppError::SessionNotFound(code.clone()))?;
        let record = session
            .find_file(file_id)
            .cloned()
            .ok_or_else(|| AppError::FileNotFound(file_id.to_string()))?;

        let blob_path = self.repository.session_dir(&code).join(record.blob_name());
        if !fs::try_exists(&blob_path).await.unwrap_or(false) {
            return Err(AppError::FileNotFound(file_id.to_string()));
        }

        let key = session
            .key
            .as_ref()
            .ok_or_else(|| AppError::DecryptionFailed("session has no key material".to_string()))?;
        let cipher = FileCipher::from_hex(key.expose())?;

        fs::create_dir_all(&self.spool_dir).await.map_err(|e| {
            AppError::Storage(format!(
                "failed to create spool directory {}: {}",
                self.spool_dir.display(),
                e
            ))
        })?;
        let spool_path = self.spool_dir.join(format!(
            "{}_{}_{}.tmp",
            code,
            record.id,
            Utc::now().timestamp_millis()
        ));

        let eraser = self.repository.eraser().clone();
        let plaintext_len = match cipher.decrypt_file(&blob_path, &spool_path).await {
            Ok(len) => len,
            Err(e) => {
                if let Err(erase_err) = eraser.erase(&spool_path).await {
                    tracing::error!(
                        path = %spool_path.display(),
                        error = %erase_err,
                        "failed to erase spool file after decryption failure"
                    );
                }
                return Err(e);
            }
        };

        let file = match fs::File::open(&spool_path).await {
            Ok(file) => file,
            Err(e) => {
                let _ = eraser.erase(&spool_path).await;
                return Err(e.into());
            }
        };

        tracing::info!(
            code = %code,
            file_id = %record.id,
            plaintext_bytes = plaintext_len,
            "serving decrypted file"
        );
        Ok(PlaintextStream {
            inner: ReaderStream::new(file),
            _guard: EraseOnDrop {
                path: spool_path,
                eraser,
            },
            file_name: record.name,
            content_type: record.content_type,
            len: plaintext_len,
        })
    }
}

/// Streaming plaintext handed to the routing collaborator. Dropping the
/// stream, whether after the last chunk, mid-stream on error, or because
/// the client disconnected, triggers secure erasure of the spool file.
#[derive(Debug)]
pub struct PlaintextStream {
    inner: ReaderStream<fs::File>,
    _guard: EraseOnDrop,
    file_name: String,
    content_type: String,
    len: u64,
}

impl PlaintextStream {
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Plaintext length in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Stream for PlaintextStream {
    type Item = Result<Bytes, io::Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[derive(Debug)]
struct EraseOnDrop {
    path: PathBuf,
    eraser: SecureEraser,
}

impl Drop for EraseOnDrop {
    fn drop(&mut self) {
        let path = std::mem::take(&mut self.path);
        let eraser = self.eraser.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = eraser.erase(&path).await {
                        tracing::error!(
                            path = %path.display(),
                            error = %e,
                            "failed to erase transient plaintext"
                        );
                    }
                });
            }
            Err(_) => {
                // no runtime (process teardown); erase synchronously
                if let Err(e) = shred::erase_blocking(&path, eraser.passes()) {
                    tracing::error!(
                        path = %path.display(),
                        error = %e,
                        "failed to erase transient plaintext"
                    );
                }
            }
        }
    }
}
