//! Shared constants: session code format, cipher framing, configuration defaults.

/// Length of a session code.
pub const CODE_LENGTH: usize = 6;

/// Alphabet a session code is drawn from. Codes are case-insensitive at
/// entry and normalized to this uppercase alphabet.
pub const CODE_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Hard cap on unique-code generation attempts before `ExhaustedRetries`.
pub const CODE_MAX_ATTEMPTS: u32 = 5;

/// Symmetric key length in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// Initialization vector length in bytes. The IV is the first `IV_LEN`
/// bytes of every ciphertext blob.
pub const IV_LEN: usize = 16;

/// AES block length in bytes.
pub const BLOCK_LEN: usize = 16;

/// Chunk size for streaming encrypt/decrypt.
pub const CIPHER_CHUNK_SIZE: usize = 64 * 1024;

/// Length of the random base-36 suffix in a file id.
pub const FILE_ID_SUFFIX_LEN: usize = 9;

/// Extension of encrypted blobs on disk (`<fileId>.enc`).
pub const ENCRYPTED_EXT: &str = "enc";

// Configuration defaults
pub const DEFAULT_SESSION_TTL_SECS: u64 = 300;
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 1800;
pub const DEFAULT_ERASE_PASSES: u32 = 3;
pub const MIN_ERASE_PASSES: u32 = 3;
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 50 * 1024 * 1024;
pub const DEFAULT_MAX_FILES_PER_UPLOAD: usize = 10;

pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &[
    "pdf", "jpg", "jpeg", "png", "doc", "docx", "xls", "xlsx", "txt", "tiff", "tif",
];

pub const DEFAULT_ALLOWED_CONTENT_TYPES: &[&str] = &[
    "application/pdf",
    "image/jpeg",
    "image/png",
    "image/jpg",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "text/plain",
    "image/tiff",
];
