//! Integration Tests for the Object Cache
//!
//! Exercises persistence across instances, failure isolation and the
//! namespace registry through the public API only.

use std::fs;
use std::io::{self, Write};
use std::sync::Arc;

use ocache::codec::{self, ENTRY_MAGIC};
use ocache::stream::ChunkedWriter;
use ocache::{CacheConfig, CacheError, NamespaceRegistry, ObjectCache, MAX_CHUNK_BYTES};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Order {
    id: u64,
    lines: Vec<(String, u32)>,
    note: Option<String>,
}

// == Helper Functions ==

fn order(id: u64) -> Order {
    Order {
        id,
        lines: vec![("widget".to_string(), 3), ("gadget".to_string(), 1)],
        note: None,
    }
}

fn config(tmp: &TempDir) -> CacheConfig {
    CacheConfig::new(tmp.path().join("cache"), "orders")
}

fn open(tmp: &TempDir) -> ObjectCache<Order> {
    ObjectCache::open(config(tmp)).unwrap()
}

#[derive(Default)]
struct CountingSink {
    sizes: Vec<usize>,
    bytes: Vec<u8>,
}

impl Write for CountingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.sizes.push(buf.len());
        self.bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// == Persistence ==

#[test]
fn test_write_through_visible_to_fresh_instance() {
    let tmp = tempfile::tempdir().unwrap();
    let first = open(&tmp);
    assert!(first.set("order:1", Some(order(1)), None).unwrap());

    let second = open(&tmp);
    let loaded = second.get("order:1").unwrap();
    assert_eq!(loaded, order(1));
}

#[test]
fn test_cached_absence_persists() {
    let tmp = tempfile::tempdir().unwrap();
    assert!(open(&tmp).set("gone", None, None).unwrap());

    let second = open(&tmp);
    assert_eq!(second.get_or("gone", Some(order(0))), None);
    assert!(second.has("gone"));
}

#[test]
fn test_directory_layout() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = open(&tmp);
    cache.set("k", Some(order(1)), None).unwrap();

    let id = cache.identifier("k");
    assert_eq!(id.len(), 16);
    let expected = tmp
        .path()
        .join("cache")
        .join("orders")
        .join(format!("{id}.ocache"));
    assert_eq!(cache.path("k"), expected);

    let bytes = fs::read(&expected).unwrap();
    assert_eq!(&bytes[..4], &ENTRY_MAGIC);
}

#[test]
fn test_namespaces_are_isolated() {
    let tmp = tempfile::tempdir().unwrap();
    let a: ObjectCache<Order> =
        ObjectCache::open(CacheConfig::new(tmp.path(), "alpha")).unwrap();
    let b: ObjectCache<Order> = ObjectCache::open(CacheConfig::new(tmp.path(), "beta")).unwrap();

    a.set("shared", Some(order(1)), None).unwrap();
    assert_eq!(b.get("shared"), None);
    assert_eq!(a.get("shared"), Some(order(1)));
}

#[test]
fn test_hash_algorithm_changes_identifier() {
    let tmp = tempfile::tempdir().unwrap();
    let xxh: ObjectCache<Order> = open(&tmp);
    let sha: ObjectCache<Order> =
        ObjectCache::open(CacheConfig::new(tmp.path(), "sha").with_hash_algo("sha256")).unwrap();

    assert_eq!(sha.identifier("k").len(), 64);
    assert_ne!(xxh.identifier("k"), sha.identifier("k"));
}

// == Miss Isolation ==

#[test]
fn test_corrupt_file_is_clean_miss() {
    let tmp = tempfile::tempdir().unwrap();
    let writer = open(&tmp);
    writer.set("a", Some(order(1)), None).unwrap();

    fs::write(writer.path("a"), b"garbage that is not an entry").unwrap();

    let reader = open(&tmp);
    assert_eq!(reader.get("a"), None);
}

#[test]
fn test_truncated_file_is_clean_miss() {
    let tmp = tempfile::tempdir().unwrap();
    let writer = open(&tmp);
    writer.set("a", Some(order(1)), None).unwrap();

    let bytes = fs::read(writer.path("a")).unwrap();
    fs::write(writer.path("a"), &bytes[..bytes.len() / 2]).unwrap();

    assert_eq!(open(&tmp).get("a"), None);
}

#[test]
fn test_wrong_type_is_clean_miss() {
    let tmp = tempfile::tempdir().unwrap();
    let values: ObjectCache<Value> = ObjectCache::open(config(&tmp)).unwrap();
    values.set("a", Some(json!({"unexpected": true})), None).unwrap();

    assert_eq!(open(&tmp).get("a"), None);
}

#[test]
fn test_removed_file_is_clean_miss() {
    let tmp = tempfile::tempdir().unwrap();
    let writer = open(&tmp);
    writer.set("a", Some(order(1)), None).unwrap();
    fs::remove_file(writer.path("a")).unwrap();

    let reader = open(&tmp);
    assert_eq!(reader.get("a"), None);
    assert!(!reader.has("a"));
}

// == Chunked Writes ==

#[test]
fn test_three_full_chunks_plus_seventeen() {
    let payload = vec![b'x'; 3 * MAX_CHUNK_BYTES + 17];
    let mut writer = ChunkedWriter::new(CountingSink::default(), MAX_CHUNK_BYTES).unwrap();
    writer.write(&payload).unwrap();
    let sink = writer.finish().unwrap();

    assert_eq!(
        sink.sizes,
        vec![MAX_CHUNK_BYTES, MAX_CHUNK_BYTES, MAX_CHUNK_BYTES, 17]
    );
    assert_eq!(sink.bytes, payload);
}

#[test]
fn test_exported_file_matches_encoding() {
    let tmp = tempfile::tempdir().unwrap();
    let cache: ObjectCache<Order> =
        ObjectCache::open(config(&tmp).with_chunk_bytes(5)).unwrap();
    let mut big = order(9);
    big.note = Some("n".repeat(10_000));

    cache.set("big", Some(big.clone()), None).unwrap();

    let on_disk = fs::read(cache.path("big")).unwrap();
    assert_eq!(on_disk, codec::encode(Some(&big)).unwrap());
    assert_eq!(open(&tmp).get("big"), Some(big));
}

// == Registry ==

#[test]
fn test_registry_shares_namespace_between_caches() {
    let tmp = tempfile::tempdir().unwrap();
    let mut registry = NamespaceRegistry::new();

    let ns = registry.open(config(&tmp)).unwrap();
    let orders: ObjectCache<Order> = ObjectCache::with_namespace(Arc::clone(&ns));
    let raw: ObjectCache<Value> = ObjectCache::with_namespace(registry.open(config(&tmp)).unwrap());

    assert!(Arc::ptr_eq(orders.namespace(), raw.namespace()));

    orders.set("o", Some(order(5)), None).unwrap();
    let as_json = raw.get("o").unwrap();
    assert_eq!(as_json["id"], 5);
}

#[test]
fn test_registry_rejects_conflicting_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    let mut registry = NamespaceRegistry::new();
    registry.open(config(&tmp)).unwrap();

    let err = registry
        .open(config(&tmp).with_chunk_bytes(8))
        .unwrap_err();
    assert!(matches!(err, CacheError::Configuration(_)));
}

// == Construction ==

#[test]
fn test_unsupported_hash_algorithm() {
    let tmp = tempfile::tempdir().unwrap();
    let result = ObjectCache::<Order>::open(config(&tmp).with_hash_algo("whirlpool"));
    assert!(matches!(result, Err(CacheError::Configuration(_))));
}

#[test]
fn test_root_directory_created_on_first_use() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("deep").join("cache");
    assert!(!root.exists());

    let _cache: ObjectCache<Order> = ObjectCache::open(CacheConfig::new(&root, "ns")).unwrap();
    assert!(root.join("ns").is_dir());
}
