//! Configuration Module
//!
//! Static configuration of one cache namespace, loadable from environment
//! variables.

use std::env;
use std::path::{Path, PathBuf};

use crate::error::{CacheError, Result};
use crate::hash::HashAlgorithm;

// == Defaults ==
/// Default root directory of all cache namespaces
pub const DEFAULT_CACHE_DIR: &str = "/tmp/.ocache";

/// Default namespace
pub const DEFAULT_NAMESPACE: &str = "def";

/// Default key hashing algorithm
pub const DEFAULT_HASH_ALGO: &str = "xxh3";

/// Default extension of persisted entry files
pub const DEFAULT_EXTENSION: &str = "ocache";

/// Maximum number of bytes handed to the file sink in one write
pub const MAX_CHUNK_BYTES: usize = 1024;

/// Cache configuration parameters.
///
/// A cache instance binds to exactly one namespace for its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Root directory holding one subdirectory per namespace
    pub cache_dir: PathBuf,
    /// Namespace (subdirectory) of this cache
    pub namespace: String,
    /// Name of the key hashing algorithm
    pub hash_algo: String,
    /// Extension appended to each entry file, without the dot
    pub extension: String,
    /// Chunk ceiling of the persistence writer
    pub chunk_bytes: usize,
}

impl CacheConfig {
    // == Constructor ==
    /// Creates a config for `namespace` under `cache_dir`, other fields default.
    pub fn new(cache_dir: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `OCACHE_DIR` - Cache root directory (default: /tmp/.ocache)
    /// - `OCACHE_NAMESPACE` - Namespace (default: def)
    /// - `OCACHE_HASH_ALGO` - Key hashing algorithm (default: xxh3)
    /// - `OCACHE_EXTENSION` - Entry file extension (default: ocache)
    /// - `OCACHE_CHUNK_BYTES` - Chunk ceiling in bytes (default: 1024)
    pub fn from_env() -> Self {
        Self {
            cache_dir: env::var("OCACHE_DIR")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR)),
            namespace: env::var("OCACHE_NAMESPACE")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            hash_algo: env::var("OCACHE_HASH_ALGO")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_HASH_ALGO.to_string()),
            extension: env::var("OCACHE_EXTENSION")
                .ok()
                .unwrap_or_else(|| DEFAULT_EXTENSION.to_string()),
            chunk_bytes: env::var("OCACHE_CHUNK_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(MAX_CHUNK_BYTES),
        }
    }

    // == Builders ==
    /// Sets the hashing algorithm.
    pub fn with_hash_algo(mut self, hash_algo: impl Into<String>) -> Self {
        self.hash_algo = hash_algo.into();
        self
    }

    /// Sets the entry file extension.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Sets the chunk ceiling.
    pub fn with_chunk_bytes(mut self, chunk_bytes: usize) -> Self {
        self.chunk_bytes = chunk_bytes;
        self
    }

    // == Validate ==
    /// Checks the configuration, returning the parsed hash algorithm.
    ///
    /// Namespace and extension are used as literal path components, so they
    /// must not contain separators or surrounding whitespace.
    pub fn validate(&self) -> Result<HashAlgorithm> {
        if self.cache_dir.to_string_lossy().trim().is_empty() {
            return Err(CacheError::Configuration(
                "cache directory must not be empty".to_string(),
            ));
        }
        if self.namespace.trim().is_empty() {
            return Err(CacheError::Configuration(
                "namespace must not be empty".to_string(),
            ));
        }
        check_component("namespace", &self.namespace)?;
        if !self.extension.is_empty() {
            check_component("extension", &self.extension)?;
        }
        if self.chunk_bytes == 0 {
            return Err(CacheError::Configuration(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        self.hash_algo.parse()
    }

    /// Returns the cache root directory.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            namespace: DEFAULT_NAMESPACE.to_string(),
            hash_algo: DEFAULT_HASH_ALGO.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
            chunk_bytes: MAX_CHUNK_BYTES,
        }
    }
}

fn check_component(field: &str, value: &str) -> Result<()> {
    if value == "."
        || value == ".."
        || value.trim() != value
        || value.contains(['/', '\\'])
    {
        return Err(CacheError::Configuration(format!(
            "{field} \"{value}\" is not a valid path component"
        )));
    }
    Ok(())
}
