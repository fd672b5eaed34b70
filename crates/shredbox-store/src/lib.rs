//! Shredbox Store Library
//!
//! This crate owns everything that touches session state on disk: the
//! `SessionStore` key-value abstraction and its backings, the secure-erase
//! routine, and the `SessionRepository` that layers code allocation, expiry
//! self-healing, and per-session locking on top of a backend.
//!
//! # Record layout
//!
//! The filesystem backing keeps one JSON file per session
//! (`<sessions>/<CODE>.json`); encrypted blobs live outside the store under
//! `<uploads>/<CODE>/<fileId>.enc` and are owned by the repository.

pub mod fs;
pub mod memory;
pub mod repository;
pub mod shred;
pub mod traits;

// Re-export commonly used types
pub use fs::FsSessionStore;
pub use memory::MemorySessionStore;
pub use repository::SessionRepository;
pub use shred::SecureEraser;
pub use traits::{SessionStore, StoreError, StoreResult};
