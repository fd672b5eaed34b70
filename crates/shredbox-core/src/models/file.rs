use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{ENCRYPTED_EXT, FILE_ID_SUFFIX_LEN};

/// Coarse display category derived from the content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Image,
    Pdf,
    Document,
    Spreadsheet,
    File,
}

impl FileCategory {
    pub fn from_content_type(content_type: &str) -> Self {
        let ct = content_type.to_lowercase();
        if ct.starts_with("image/") {
            FileCategory::Image
        } else if ct == "application/pdf" {
            FileCategory::Pdf
        } else if ct.contains("word") || ct.contains("document") {
            FileCategory::Document
        } else if ct.contains("sheet") || ct.contains("excel") {
            FileCategory::Spreadsheet
        } else {
            FileCategory::File
        }
    }
}

/// One uploaded file inside a session. The record never holds content;
/// `id` names exactly one ciphertext blob on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    /// Sanitized display name.
    pub name: String,
    pub size: u64,
    pub content_type: String,
    pub category: FileCategory,
    pub uploaded_at: DateTime<Utc>,
}

impl FileRecord {
    /// Name of the encrypted blob for this record: `<id>.enc`.
    pub fn blob_name(&self) -> String {
        format!("{}.{}", self.id, ENCRYPTED_EXT)
    }
}

/// Generate a file id: millisecond timestamp plus a random base-36 suffix,
/// unique enough under concurrent uploads into the same session and safe as
/// a filename component.
pub fn new_file_id(now: DateTime<Utc>) -> String {
    let suffix: String = (0..FILE_ID_SUFFIX_LEN)
        .map(|_| {
            let digit = rand::rng().random_range(0..36u32);
            char::from_digit(digit, 36).unwrap_or('0')
        })
        .collect();
    format!("{}_{}", now.timestamp_millis(), suffix)
}
