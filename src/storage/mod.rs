//! Storage Module
//!
//! On-disk directory lifecycle and primitive entry file operations.

mod backend;

pub use backend::{StorageBackend, DIR_MODE};
