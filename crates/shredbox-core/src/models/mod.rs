//! Domain models

pub mod file;
pub mod session;

pub use file::{new_file_id, FileCategory, FileRecord};
pub use session::{Session, SessionKey, SessionStatus, SessionView};
