//! ocache - A process-local, file-backed object cache
//!
//! Values are kept in an in-memory index and written through to one file per
//! key, streamed to disk in bounded chunks so cached values survive process
//! restarts.

pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod hash;
pub mod index;
pub mod storage;
pub mod stream;

pub use cache::{CacheStats, Namespace, NamespaceRegistry, ObjectCache};
pub use config::{CacheConfig, MAX_CHUNK_BYTES};
pub use error::{CacheError, Result};
pub use hash::{HashAlgorithm, KeyHasher};
