//! Upload service: runs the ingestion pipeline for one batch of staged
//! files against one session.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tokio::fs;

use shredbox_core::models::{new_file_id, FileCategory, FileRecord};
use shredbox_core::{
    codes, sanitize_file_name, AppError, Config, FileCipher, SessionKey, UploadValidator,
};
use shredbox_store::{SecureEraser, SessionRepository};

use super::types::StagedUpload;

pub struct UploadService {
    repository: Arc<SessionRepository>,
    validator: UploadValidator,
    /// Process-wide key, stamped into a session at its first ingestion.
    key: SessionKey,
    max_files_per_upload: usize,
}

impl UploadService {
    pub fn new(repository: Arc<SessionRepository>, config: &Config) -> Result<Self, AppError> {
        // the key must parse before any upload is accepted
        FileCipher::from_hex(&config.encryption_key)?;
        Ok(UploadService {
            repository,
            validator: UploadValidator::from_config(config),
            key: SessionKey::new(config.encryption_key.clone()),
            max_files_per_upload: config.max_files_per_upload,
        })
    }

    /// Ingest a batch of staged uploads into the session behind `code`.
    ///
    /// Per file: validate → sanitize name → assign id → encrypt into the
    /// session directory → erase the plaintext staging file. The batch
    /// aborts on the first failure; outputs already encrypted in the
    /// aborted batch are erased again, and every staged input is erased no
    /// matter what; plaintext does not outlive the request.
    #[tracing::instrument(skip(self, uploads), fields(batch = uploads.len()))]
    pub async fn ingest(
        &self,
        code: &str,
        uploads: Vec<StagedUpload>,
    ) -> Result<Vec<FileRecord>, AppError> {
        let code = match codes::normalize_code(code) {
            Ok(code) => code,
            Err(e) => {
                self.discard_inputs(&uploads).await;
                return Err(e);
            }
        };
        if uploads.is_empty() {
            return Err(AppError::Validation("no files provided".to_string()));
        }

        let session = match self.repository.get(&code).await {
            Ok(Some(session)) => session,
            Ok(None) => {
                self.discard_inputs(&uploads).await;
                return Err(AppError::SessionNotFound(code));
            }
            Err(e) => {
                self.discard_inputs(&uploads).await;
                return Err(e);
            }
        };
        if session.files.len() + uploads.len() > self.max_files_per_upload {
            self.discard_inputs(&uploads).await;
            return Err(AppError::Validation(format!(
                "too many files: session holds {}, batch adds {}, limit is {}",
                session.files.len(),
                uploads.len(),
                self.max_files_per_upload
            )));
        }

        let session_dir = self.repository.session_dir(&code);
        fs::create_dir_all(&session_dir).await.map_err(|e| {
            AppError::Storage(format!(
                "failed to create session directory {}: {}",
                session_dir.display(),
                e
            ))
        })?;

        let cipher = FileCipher::from_hex(self.key.expose())?;
        let mut records: Vec<FileRecord> = Vec::with_capacity(uploads.len());
        let mut outputs: Vec<PathBuf> = Vec::with_capacity(uploads.len());
        let mut failure: Option<AppError> = None;

        for upload in &uploads {
            match self.process_one(&cipher, &session_dir, upload).await {
                Ok((record, output)) => {
                    outputs.push(output);
                    records.push(record);
                }
                Err(e) => {
                    tracing::warn!(
                        file = %upload.original_filename,
                        error = %e,
                        "upload failed, aborting batch"
                    );
                    failure = Some(e);
                    break;
                }
            }
        }

        if let Some(err) = failure {
            self.discard_outputs(&outputs).await;
            self.discard_inputs(&uploads).await;
            return Err(err);
        }

        let key = self.key.clone();
        let appended = records.clone();
        match self
            .repository
            .update(&code, move |session| {
                // write-once: the key is never rotated after first ingestion
                if session.key.is_none() {
                    session.key = Some(key);
                }
                session.files.extend(appended);
            })
            .await
        {
            Ok(session) => {
                tracing::info!(
                    code = %code,
                    batch = records.len(),
                    total = session.files.len(),
                    "ingestion committed"
                );
                Ok(records)
            }
            Err(e) => {
                // the session vanished under us (expired or completed);
                // its directory is gone or going, our outputs go with it
                self.discard_outputs(&outputs).await;
                Err(e)
            }
        }
    }

    async fn process_one(
        &self,
        cipher: &FileCipher,
        session_dir: &Path,
        upload: &StagedUpload,
    ) -> Result<(FileRecord, PathBuf), AppError> {
        self.validator
            .validate(&upload.original_filename, &upload.content_type, upload.size)
            .map_err(|e| {
                AppError::Validation(format!(
                    "invalid file {:?}: {}",
                    upload.original_filename, e
                ))
            })?;

        let name = sanitize_file_name(&upload.original_filename);
        let record = FileRecord {
            id: new_file_id(Utc::now()),
            name,
            size: upload.size,
            content_type: upload.content_type.clone(),
            category: FileCategory::from_content_type(&upload.content_type),
            uploaded_at: Utc::now(),
        };
        let output = session_dir.join(record.blob_name());

        let written = cipher.encrypt_file(&upload.path, &output).await?;
        self.eraser().erase(&upload.path).await.map_err(|e| {
            AppError::Storage(format!(
                "failed to erase staged upload {}: {}",
                upload.path.display(),
                e
            ))
        })?;

        tracing::debug!(
            file = %record.name,
            id = %record.id,
            plaintext_bytes = upload.size,
            ciphertext_bytes = written,
            "file encrypted and staged input erased"
        );
        Ok((record, output))
    }

    /// Best-effort erase of ciphertext written by an aborted batch.
    async fn discard_outputs(&self, outputs: &[PathBuf]) {
        for path in outputs {
            if let Err(e) = self.eraser().erase(path).await {
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "failed to erase output of aborted batch; orphan sweep will retry"
                );
            }
        }
    }

    /// Best-effort erase of every staged plaintext input. Safe to call on
    /// inputs already erased by the pipeline; erase is idempotent.
    async fn discard_inputs(&self, uploads: &[StagedUpload]) {
        for upload in uploads {
            if let Err(e) = self.eraser().erase(&upload.path).await {
                tracing::error!(
                    path = %upload.path.display(),
                    error = %e,
                    "failed to erase staged plaintext input"
                );
            }
        }
    }

    fn eraser(&self) -> &SecureEraser {
        self.repository.eraser()
    }
}
