//! Session code generation and normalization.
//!
//! Codes are 6 characters from `[0-9A-Z]`, the only external handle to a
//! session. Entry is case-insensitive; everything downstream works on the
//! normalized uppercase form.

use rand::Rng;

use crate::constants::{CODE_ALPHABET, CODE_LENGTH};
use crate::error::AppError;

/// Generate a random session code. Uniqueness is the store's business
/// (bounded collision retry), not this function's.
pub fn generate_code() -> String {
    (0..CODE_LENGTH)
        .map(|_| {
            let idx = rand::rng().random_range(0..CODE_ALPHABET.len());
            CODE_ALPHABET[idx] as char
        })
        .collect()
}

/// Normalize user input to the canonical uppercase form, rejecting anything
/// that is not exactly six alphanumeric characters.
pub fn normalize_code(input: &str) -> Result<String, AppError> {
    let code = input.trim().to_ascii_uppercase();
    if code.len() == CODE_LENGTH && code.bytes().all(|b| CODE_ALPHABET.contains(&b)) {
        Ok(code)
    } else {
        Err(AppError::InvalidCode(input.to_string()))
    }
}
