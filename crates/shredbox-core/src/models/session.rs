use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::file::FileRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
}

/// Hex-encoded session key. Redacted in `Debug`, zeroized on drop, and never
/// part of any client-facing view.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct SessionKey(String);

impl SessionKey {
    pub fn new(hex: String) -> Self {
        SessionKey(hex)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey(<redacted>)")
    }
}

/// A time-boxed, code-addressed bundle of encrypted files plus its key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub code: String,
    /// Insertion order is display order.
    pub files: Vec<FileRecord>,
    /// Set at most once, at first ingestion; never rotated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<SessionKey>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: SessionStatus,
}

impl Session {
    /// New active session with `expires_at = created_at + ttl`.
    /// `expires_at` is immutable after this point.
    pub fn new(code: String, now: DateTime<Utc>, ttl: chrono::Duration) -> Self {
        Session {
            code,
            files: Vec::new(),
            key: None,
            created_at: now,
            expires_at: now + ttl,
            status: SessionStatus::Active,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    pub fn find_file(&self, file_id: &str) -> Option<&FileRecord> {
        self.files.iter().find(|f| f.id == file_id)
    }
}

/// Client-facing projection of a session. Carries no key material.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub code: String,
    pub files: Vec<FileRecord>,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        SessionView {
            code: session.code.clone(),
            files: session.files.clone(),
            status: session.status,
            created_at: session.created_at,
            expires_at: session.expires_at,
        }
    }
}
