//! Secure erase: overwrite-then-unlink for files, bottom-up removal for
//! directory trees.
//!
//! Each pass writes fresh random bytes over the full length of the target
//! and fsyncs before the next pass starts. On media that remap sectors
//! (SSD wear-leveling, journaling filesystems) this reduces recoverability
//! but is not a cryptographic erasure guarantee.

use std::future::Future;
use std::io::{self, ErrorKind, SeekFrom};
use std::path::Path;
use std::pin::Pin;

use rand::RngCore;
use tokio::fs;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

const ERASE_CHUNK: usize = 64 * 1024;

#[derive(Clone, Debug)]
pub struct SecureEraser {
    passes: u32,
}

impl SecureEraser {
    pub fn new(passes: u32) -> Self {
        SecureEraser { passes }
    }

    pub fn passes(&self) -> u32 {
        self.passes
    }

    /// Overwrite the file at `path` with random bytes `passes` times, then
    /// unlink it. A missing target succeeds silently; every other
    /// filesystem error propagates. Directories are delegated to
    /// [`erase_tree`](Self::erase_tree).
    pub async fn erase(&self, path: &Path) -> io::Result<()> {
        let meta = match fs::symlink_metadata(path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };
        if meta.is_dir() {
            return self.erase_tree(path).await;
        }
        if meta.is_symlink() {
            // remove the link itself, never the target outside our tree
            return match fs::remove_file(path).await {
                Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
                _ => Ok(()),
            };
        }

        let size = meta.len();
        let mut file = fs::OpenOptions::new().write(true).open(path).await?;
        let mut chunk = vec![0u8; ERASE_CHUNK];
        for pass in 1..=self.passes {
            file.seek(SeekFrom::Start(0)).await?;
            let mut remaining = size;
            while remaining > 0 {
                let n = (chunk.len() as u64).min(remaining) as usize;
                rand::rng().fill_bytes(&mut chunk[..n]);
                file.write_all(&chunk[..n]).await?;
                remaining -= n as u64;
            }
            file.flush().await?;
            file.sync_all().await?;
            tracing::trace!(path = %path.display(), pass, "overwrite pass complete");
        }
        drop(file);

        match fs::remove_file(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        tracing::debug!(path = %path.display(), size_bytes = size, passes = self.passes, "file erased");
        Ok(())
    }

    /// Recursively erase every file under `dir`, bottom-up, removing each
    /// emptied directory on the way out. Idempotent on a missing root.
    pub fn erase_tree<'a>(
        &'a self,
        dir: &'a Path,
    ) -> Pin<Box<dyn Future<Output = io::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let mut entries = match fs::read_dir(dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
                Err(e) => return Err(e),
            };
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    self.erase_tree(&path).await?;
                } else {
                    self.erase(&path).await?;
                }
            }
            match fs::remove_dir(dir).await {
                Ok(()) => {
                    tracing::debug!(dir = %dir.display(), "directory removed");
                    Ok(())
                }
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e),
            }
        })
    }
}

/// Synchronous erase for contexts without a runtime (drop guards at process
/// teardown). Same overwrite discipline as the async path.
pub fn erase_blocking(path: &Path, passes: u32) -> io::Result<()> {
    use std::io::{Seek, Write};

    let meta = match std::fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    if !meta.is_file() {
        return match std::fs::remove_file(path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        };
    }

    let size = meta.len();
    let mut file = std::fs::OpenOptions::new().write(true).open(path)?;
    let mut chunk = vec![0u8; ERASE_CHUNK];
    for _ in 0..passes {
        file.seek(SeekFrom::Start(0))?;
        let mut remaining = size;
        while remaining > 0 {
            let n = (chunk.len() as u64).min(remaining) as usize;
            rand::rng().fill_bytes(&mut chunk[..n]);
            file.write_all(&chunk[..n])?;
            remaining -= n as u64;
        }
        file.flush()?;
        file.sync_all()?;
    }
    drop(file);
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
