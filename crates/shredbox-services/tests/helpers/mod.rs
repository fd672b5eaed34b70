//! Shared fixtures for the service-layer integration tests.
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tempfile::TempDir;

use shredbox_core::constants::{DEFAULT_ALLOWED_CONTENT_TYPES, DEFAULT_ALLOWED_EXTENSIONS};
use shredbox_core::Config;
use shredbox_services::{RetrievalService, SessionService, StagedUpload, UploadService};
use shredbox_store::{FsSessionStore, SecureEraser, SessionRepository, SessionStore};

static STAGE_SEQ: AtomicU64 = AtomicU64::new(0);

pub fn test_key_hex() -> String {
    "0123456789abcdef".repeat(4)
}

pub struct TestHarness {
    pub data_dir: TempDir,
    pub config: Config,
    pub store: Arc<FsSessionStore>,
    pub repository: Arc<SessionRepository>,
    pub sessions: SessionService,
    pub uploads: UploadService,
    pub retrieval: RetrievalService,
}

pub async fn harness() -> TestHarness {
    harness_with_ttl(300).await
}

pub async fn harness_with_ttl(ttl_secs: u64) -> TestHarness {
    let data_dir = tempfile::tempdir().expect("tempdir");
    let config = Config {
        data_dir: data_dir.path().to_path_buf(),
        encryption_key: test_key_hex(),
        session_ttl_secs: ttl_secs,
        sweep_interval_secs: 1800,
        erase_passes: 3,
        max_file_size_bytes: 50 * 1024 * 1024,
        max_files_per_upload: 10,
        allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
            .iter()
            .map(|s| s.to_string())
            .collect(),
        allowed_content_types: DEFAULT_ALLOWED_CONTENT_TYPES
            .iter()
            .map(|s| s.to_string())
            .collect(),
        spool_dir: data_dir.path().join("spool"),
    };
    config.validate().expect("valid test config");

    let store = Arc::new(
        FsSessionStore::new(config.sessions_dir())
            .await
            .expect("session store"),
    );
    let repository = Arc::new(
        SessionRepository::new(
            store.clone() as Arc<dyn SessionStore>,
            SecureEraser::new(config.erase_passes),
            config.uploads_dir(),
            config.session_ttl(),
        )
        .await
        .expect("repository"),
    );

    let sessions = SessionService::new(repository.clone());
    let uploads = UploadService::new(repository.clone(), &config).expect("upload service");
    let retrieval = RetrievalService::new(repository.clone(), config.spool_dir.clone());

    TestHarness {
        data_dir,
        config,
        store,
        repository,
        sessions,
        uploads,
        retrieval,
    }
}

impl TestHarness {
    /// Write plaintext bytes to a staging file, the way the request-parsing
    /// collaborator would before calling ingest.
    pub async fn stage(&self, name: &str, content_type: &str, bytes: &[u8]) -> StagedUpload {
        let staging = self.data_dir.path().join("staging");
        tokio::fs::create_dir_all(&staging).await.expect("staging dir");
        let seq = STAGE_SEQ.fetch_add(1, Ordering::Relaxed);
        let path = staging.join(format!("stage_{seq}"));
        tokio::fs::write(&path, bytes).await.expect("stage write");
        StagedUpload {
            original_filename: name.to_string(),
            content_type: content_type.to_string(),
            size: bytes.len() as u64,
            path,
        }
    }

    pub fn session_dir(&self, code: &str) -> PathBuf {
        self.config.uploads_dir().join(code)
    }

    /// Rewrite a session record so its TTL elapsed in the past.
    pub async fn backdate_past_ttl(&self, code: &str) {
        let mut session = self
            .store
            .get(code)
            .await
            .expect("store read")
            .expect("session exists");
        session.created_at = Utc::now() - chrono::Duration::seconds(600);
        session.expires_at = Utc::now() - chrono::Duration::seconds(300);
        self.store.put(&session).await.expect("store write");
    }

    /// Names of encrypted blobs currently in a session's directory.
    pub async fn blob_names(&self, code: &str) -> Vec<String> {
        list_file_names(&self.session_dir(code)).await
    }

    /// Names of files currently sitting in the spool directory.
    pub async fn spool_files(&self) -> Vec<String> {
        list_file_names(&self.config.spool_dir).await
    }
}

async fn list_file_names(dir: &std::path::Path) -> Vec<String> {
    let mut names = Vec::new();
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return names;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    names
}
