//! Object Cache Module
//!
//! Two-tier cache: an in-memory index over storage identifiers, backed by
//! one entry file per identifier.
//!
//! Reads are load-through: a memory miss imports the entry file and memoizes
//! the result, including a stored or missing absence. Writes are
//! write-through: `set` exports first and memoizes only after the export
//! succeeded, so a failed write never leaves a value in memory that the
//! disk does not have. Values are cloned on the way in and out; callers
//! never hold a reference into the index.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::cache::{CacheStats, Namespace};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

/// Memory index and counters, guarded together.
#[derive(Debug)]
struct MemoryIndex<V> {
    entries: HashMap<String, Option<V>>,
    stats: CacheStats,
}

impl<V> MemoryIndex<V> {
    fn sync_total(&mut self) {
        let total = self.entries.len();
        self.stats.set_total_entries(total);
    }
}

// == Object Cache ==
/// File-backed object cache bound to a single namespace.
#[derive(Debug)]
pub struct ObjectCache<V> {
    namespace: Arc<Namespace>,
    index: Mutex<MemoryIndex<V>>,
}

impl<V> ObjectCache<V>
where
    V: Serialize + DeserializeOwned + Clone,
{
    // == Constructors ==
    /// Opens a cache with its own namespace components.
    pub fn open(config: CacheConfig) -> Result<Self> {
        Ok(Self::with_namespace(Arc::new(Namespace::open(config)?)))
    }

    /// Creates a cache over an already opened, possibly shared, namespace.
    pub fn with_namespace(namespace: Arc<Namespace>) -> Self {
        Self {
            namespace,
            index: Mutex::new(MemoryIndex {
                entries: HashMap::new(),
                stats: CacheStats::new(),
            }),
        }
    }

    /// The namespace this cache is bound to.
    pub fn namespace(&self) -> &Arc<Namespace> {
        &self.namespace
    }

    /// Storage identifier of `key`.
    pub fn identifier(&self, key: &str) -> String {
        self.namespace.hasher().hash(key)
    }

    /// Entry file path of `key`.
    pub fn path(&self, key: &str) -> PathBuf {
        self.namespace.resolver().resolve(&self.identifier(key))
    }

    fn index(&self) -> Result<MutexGuard<'_, MemoryIndex<V>>> {
        self.index
            .lock()
            .map_err(|_| CacheError::Internal("memory index lock poisoned".to_string()))
    }

    fn index_recovered(&self) -> MutexGuard<'_, MemoryIndex<V>> {
        self.index.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // == Get ==
    /// Retrieves the value for `key`.
    ///
    /// Returns `None` both for a cached absence and for a key with no
    /// readable entry.
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_or(key, None)
    }

    /// Retrieves the value for `key`, returning `default` only when the
    /// lookup itself fails.
    ///
    /// A memoized absence is a result, not a failure, and yields `None`.
    pub fn get_or(&self, key: &str, default: Option<V>) -> Option<V> {
        match self.lookup(key) {
            Ok(value) => value,
            Err(err) => {
                error!("Lookup of key {:?} failed: {}", key, err);
                default
            }
        }
    }

    fn lookup(&self, key: &str) -> Result<Option<V>> {
        let id = self.identifier(key);
        {
            let mut index = self.index()?;
            if let Some(cached) = index.entries.get(&id).cloned() {
                index.stats.record_hit();
                debug!("Memory hit for {}", id);
                return Ok(cached);
            }
        }

        // Disk I/O happens outside the lock
        let loaded: Option<V> = self.namespace.codec().import(&id);

        let mut index = self.index()?;
        index.stats.record_miss(loaded.is_some());
        debug!("Memory miss for {} (loaded: {})", id, loaded.is_some());
        // A concurrent set wins over what was just read
        let value = index.entries.entry(id).or_insert(loaded).clone();
        index.sync_total();
        Ok(value)
    }

    // == Has ==
    /// Returns true if `key` is in the memory index and its entry file still
    /// exists.
    pub fn has(&self, key: &str) -> bool {
        let id = self.identifier(key);
        let present = match self.index() {
            Ok(index) => index.entries.contains_key(&id),
            Err(_) => return false,
        };
        present
            && self
                .namespace
                .storage()
                .exists(&self.namespace.resolver().resolve(&id))
    }

    // == Set ==
    /// Stores `value` (or an absence) under `key`, writing through to disk.
    ///
    /// `ttl` is accepted for interface compatibility and not interpreted.
    /// Returns `Ok(false)` when the export fails; the memory index is then
    /// left untouched for this key. Internal invariant violations are
    /// returned as `Err`.
    pub fn set(&self, key: &str, value: Option<V>, ttl: Option<u64>) -> Result<bool> {
        if let Some(ttl) = ttl {
            debug!("Ignoring TTL of {}s for key {:?}", ttl, key);
        }
        let id = self.identifier(key);
        let outcome = self.namespace.codec().export(&id, value.as_ref());

        let mut index = self.index()?;
        match outcome {
            Ok(()) => {
                index.stats.record_export(true);
                index.entries.insert(id, value);
                index.sync_total();
                Ok(true)
            }
            Err(err) if err.is_internal() => {
                index.stats.record_export(false);
                error!("Export of key {:?} aborted: {}", key, err);
                Err(err)
            }
            Err(err) => {
                index.stats.record_export(false);
                warn!("Export of key {:?} failed: {}", key, err);
                Ok(false)
            }
        }
    }

    // == Delete ==
    /// Forgets `key` and removes its entry file. Always succeeds.
    pub fn delete(&self, key: &str) -> bool {
        let id = self.identifier(key);
        let path = self.namespace.resolver().resolve(&id);

        {
            let mut index = self.index_recovered();
            index.entries.remove(&id);
            index.sync_total();
        }

        if self.namespace.storage().delete(&path) {
            self.index_recovered().stats.record_deletion();
        }
        true
    }

    // == Clear ==
    /// Removes every entry file referenced by the memory index and empties
    /// it. Always succeeds.
    pub fn clear(&self) -> bool {
        let ids: Vec<String> = {
            let mut index = self.index_recovered();
            let ids = index.entries.drain().map(|(id, _)| id).collect();
            index.sync_total();
            ids
        };

        let removed = ids
            .iter()
            .filter(|id| {
                let path = self.namespace.resolver().resolve(id);
                self.namespace.storage().delete(&path)
            })
            .count();
        {
            let mut index = self.index_recovered();
            for _ in 0..removed {
                index.stats.record_deletion();
            }
        }
        info!(
            "Cleared {} entries from namespace \"{}\"",
            ids.len(),
            self.namespace.name()
        );
        true
    }

    // == Touch ==
    /// Updates the timestamps of the entry file for `key`.
    ///
    /// Returns false if no entry file exists.
    pub fn touch(
        &self,
        key: &str,
        mtime: Option<DateTime<Utc>>,
        atime: Option<DateTime<Utc>>,
    ) -> bool {
        self.namespace.storage().touch(&self.path(key), mtime, atime)
    }

    // == Preload ==
    /// Imports every entry file of the namespace into the memory index.
    ///
    /// Entries already in memory are kept. Unreadable files are skipped.
    /// Returns the number of entries added.
    pub fn preload(&self) -> usize {
        let names = match self.namespace.storage().list() {
            Ok(names) => names,
            Err(err) => {
                warn!("Unable to scan namespace \"{}\": {}", self.namespace.name(), err);
                return 0;
            }
        };

        let resolver = self.namespace.resolver();
        let mut loaded = Vec::new();
        for name in &names {
            let Some(id) = resolver.identifier_of(name) else {
                continue;
            };
            match self.namespace.codec().load::<V>(id) {
                Ok(value) => loaded.push((id.to_string(), value)),
                Err(err) => warn!("Skipping unreadable entry {}: {}", name, err),
            }
        }

        let mut index = self.index_recovered();
        let mut added = 0;
        for (id, value) in loaded {
            if !index.entries.contains_key(&id) {
                index.entries.insert(id, value);
                added += 1;
            }
        }
        index.sync_total();
        info!(
            "Preloaded {} entries into namespace \"{}\"",
            added,
            self.namespace.name()
        );
        added
    }

    // == Batch Operations ==
    /// Looks up each key in turn.
    pub fn get_multiple<I, K>(&self, keys: I, default: Option<V>) -> Vec<(String, Option<V>)>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        keys.into_iter()
            .map(|key| {
                let key = key.as_ref();
                (key.to_string(), self.get_or(key, default.clone()))
            })
            .collect()
    }

    /// Stores each pair in turn. Returns `Ok(true)` only if every export
    /// succeeded; there is no rollback of the ones that did.
    pub fn set_multiple<I, K>(&self, items: I, ttl: Option<u64>) -> Result<bool>
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: AsRef<str>,
    {
        let mut all = true;
        for (key, value) in items {
            all &= self.set(key.as_ref(), value, ttl)?;
        }
        Ok(all)
    }

    /// Deletes each key in turn. Always succeeds.
    pub fn delete_multiple<I, K>(&self, keys: I) -> bool
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        for key in keys {
            self.delete(key.as_ref());
        }
        true
    }

    // == Introspection ==
    /// Number of entries in the memory index.
    pub fn len(&self) -> usize {
        self.index_recovered().entries.len()
    }

    /// Returns true if the memory index is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let index = self.index_recovered();
        let mut stats = index.stats.clone();
        stats.set_total_entries(index.entries.len());
        stats
    }
}
