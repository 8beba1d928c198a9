//! Namespace Registry Module
//!
//! Shared per-namespace components, constructed once and handed out by
//! reference counting.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::codec::ValueCodec;
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::hash::KeyHasher;
use crate::index::PathResolver;
use crate::storage::StorageBackend;

// == Namespace ==
/// Hasher, resolver, storage and codec of one initialized namespace.
#[derive(Debug)]
pub struct Namespace {
    config: CacheConfig,
    hasher: KeyHasher,
    resolver: PathResolver,
    storage: StorageBackend,
    codec: ValueCodec,
}

impl Namespace {
    /// Validates `config`, builds the components and initializes storage.
    pub fn open(config: CacheConfig) -> Result<Self> {
        let algorithm = config.validate()?;
        let hasher = KeyHasher::new(algorithm);
        let resolver = PathResolver::new(&config);
        let storage = StorageBackend::new(&resolver);
        storage.init()?;
        let codec = ValueCodec::new(resolver.clone(), storage.clone(), config.chunk_bytes);

        debug!(
            "Opened namespace \"{}\" at {} ({})",
            config.namespace,
            storage.namespace_dir().display(),
            algorithm
        );
        Ok(Self {
            config,
            hasher,
            resolver,
            storage,
            codec,
        })
    }

    /// Namespace name.
    pub fn name(&self) -> &str {
        &self.config.namespace
    }

    /// Configuration this namespace was opened with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Key hasher.
    pub fn hasher(&self) -> &KeyHasher {
        &self.hasher
    }

    /// Path resolver.
    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Storage backend.
    pub fn storage(&self) -> &StorageBackend {
        &self.storage
    }

    /// Value codec.
    pub fn codec(&self) -> &ValueCodec {
        &self.codec
    }
}

// == Namespace Registry ==
/// Explicit registry of opened namespaces, keyed by namespace name.
#[derive(Debug, Default)]
pub struct NamespaceRegistry {
    namespaces: HashMap<String, Arc<Namespace>>,
}

impl NamespaceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the namespace for `config`, opening it on first use.
    ///
    /// Reopening a registered namespace with a different configuration is a
    /// configuration error.
    pub fn open(&mut self, config: CacheConfig) -> Result<Arc<Namespace>> {
        if let Some(existing) = self.namespaces.get(&config.namespace) {
            if existing.config() != &config {
                return Err(CacheError::Configuration(format!(
                    "namespace \"{}\" is already registered with a different configuration",
                    config.namespace
                )));
            }
            return Ok(Arc::clone(existing));
        }

        let name = config.namespace.clone();
        let namespace = Arc::new(Namespace::open(config)?);
        self.namespaces.insert(name, Arc::clone(&namespace));
        Ok(namespace)
    }

    /// Returns a registered namespace.
    pub fn get(&self, name: &str) -> Option<Arc<Namespace>> {
        self.namespaces.get(name).cloned()
    }

    /// Unregisters a namespace. Existing holders keep their reference.
    pub fn remove(&mut self, name: &str) -> Option<Arc<Namespace>> {
        self.namespaces.remove(name)
    }

    /// Number of registered namespaces.
    pub fn len(&self) -> usize {
        self.namespaces.len()
    }

    /// Returns true if no namespace is registered.
    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }
}
