//! Configuration module
//!
//! Environment-based configuration for the document-drop service. Loaded
//! once at startup with [`Config::from_env`] and checked with
//! [`Config::validate`] before anything touches the disk.

use std::env;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_ALLOWED_CONTENT_TYPES, DEFAULT_ALLOWED_EXTENSIONS, DEFAULT_ERASE_PASSES,
    DEFAULT_MAX_FILES_PER_UPLOAD, DEFAULT_MAX_FILE_SIZE_BYTES, DEFAULT_SESSION_TTL_SECS,
    DEFAULT_SWEEP_INTERVAL_SECS, KEY_LEN, MIN_ERASE_PASSES,
};

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Root data directory; session records live under `sessions/`,
    /// encrypted blobs under `uploads/<CODE>/`.
    pub data_dir: PathBuf,
    /// Process-wide encryption key, hex-encoded (64 chars = 256 bits).
    pub encryption_key: String,
    pub session_ttl_secs: u64,
    pub sweep_interval_secs: u64,
    pub erase_passes: u32,
    pub max_file_size_bytes: u64,
    pub max_files_per_upload: usize,
    pub allowed_extensions: Vec<String>,
    pub allowed_content_types: Vec<String>,
    /// Where transient decrypted plaintext is spooled during retrieval.
    pub spool_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        // Load .env if present; real environment wins
        dotenvy::dotenv().ok();

        let encryption_key = env::var("ENCRYPTION_KEY").map_err(|_| {
            anyhow::anyhow!("ENCRYPTION_KEY environment variable not set (64 hex chars expected)")
        })?;

        let config = Config {
            data_dir: PathBuf::from(env_or("SHREDBOX_DATA_DIR", "./data")),
            encryption_key,
            session_ttl_secs: env_parse("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?,
            sweep_interval_secs: env_parse("SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS)?,
            erase_passes: env_parse("ERASE_PASSES", DEFAULT_ERASE_PASSES)?,
            max_file_size_bytes: env_parse("MAX_FILE_SIZE_BYTES", DEFAULT_MAX_FILE_SIZE_BYTES)?,
            max_files_per_upload: env_parse("MAX_FILES_PER_UPLOAD", DEFAULT_MAX_FILES_PER_UPLOAD)?,
            allowed_extensions: env_list("ALLOWED_EXTENSIONS", DEFAULT_ALLOWED_EXTENSIONS),
            allowed_content_types: env_list("ALLOWED_CONTENT_TYPES", DEFAULT_ALLOWED_CONTENT_TYPES),
            spool_dir: env::var("SPOOL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| env::temp_dir()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        let key_bytes = hex::decode(&self.encryption_key)
            .map_err(|e| anyhow::anyhow!("ENCRYPTION_KEY is not valid hex: {}", e))?;
        if key_bytes.len() != KEY_LEN {
            anyhow::bail!(
                "ENCRYPTION_KEY must decode to {} bytes, got {}",
                KEY_LEN,
                key_bytes.len()
            );
        }
        if self.erase_passes < MIN_ERASE_PASSES {
            anyhow::bail!(
                "ERASE_PASSES must be at least {}, got {}",
                MIN_ERASE_PASSES,
                self.erase_passes
            );
        }
        if self.session_ttl_secs == 0 {
            anyhow::bail!("SESSION_TTL_SECS must be greater than zero");
        }
        if self.max_files_per_upload == 0 {
            anyhow::bail!("MAX_FILES_PER_UPLOAD must be greater than zero");
        }
        if self.max_file_size_bytes == 0 {
            anyhow::bail!("MAX_FILE_SIZE_BYTES must be greater than zero");
        }
        if self.allowed_extensions.is_empty() || self.allowed_content_types.is_empty() {
            anyhow::bail!("allowed extension and content-type lists must not be empty");
        }
        Ok(())
    }

    /// Directory holding one record file per session.
    pub fn sessions_dir(&self) -> PathBuf {
        self.data_dir.join("sessions")
    }

    /// Directory holding one subdirectory of encrypted blobs per session.
    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.session_ttl_secs as i64)
    }

    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_secs)
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T>(name: &str, default: T) -> Result<T, anyhow::Error>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {}: {}", name, e)),
        Err(_) => Ok(default),
    }
}

fn env_list(name: &str, default: &[&str]) -> Vec<String> {
    match env::var(name) {
        Ok(raw) => raw
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect(),
        Err(_) => default.iter().map(|s| s.to_string()).collect(),
    }
}
