#![cfg(feature = "object-store")]

use ironshard::{Backend, BackendOptions, Error, IngestOptions, LazyText, ObjectStoreBackend, ingest_str, upload_dir};
use object_store::ObjectStore;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use std::sync::Arc;
use tempfile::tempdir;

/// Ingests `data` locally, uploads it under `prefix` and returns the store.
fn seeded_store(data: &str, shard_size: u64, prefix: &str) -> Arc<InMemory> {
  let dir = tempdir().unwrap();
  ingest_str(data, dir.path(), &IngestOptions::new(shard_size)).unwrap();

  let store = Arc::new(InMemory::new());
  let count = upload_dir(store.as_ref(), dir.path(), prefix).unwrap();
  assert_eq!(count as u64, data.chars().count().div_ceil(shard_size as usize).max(1) as u64 + 1);
  store
}

#[test]
fn test_object_store_range_reads() {
  let store = seeded_store("abcdefghij", 3, "corpus/v1");
  let backend = ObjectStoreBackend::new(store, "corpus/v1", BackendOptions::default()).unwrap();

  assert_eq!(backend.index().num_shards(), 4);
  assert_eq!(backend.fetch_range(1, 8).unwrap(), "bcdefgh");
  assert_eq!(backend.fetch_range(-1, 100).unwrap(), "j");

  let text = LazyText::new(&backend);
  assert!(text == "abcdefghij");
  assert!(text.contains("fgh").unwrap());
}

#[test]
fn test_object_store_prefix_slashes_are_trimmed() {
  let store = seeded_store("hello world", 4, "/nested/prefix/");
  let backend = ObjectStoreBackend::new(store, "nested/prefix", BackendOptions::default()).unwrap();
  assert_eq!(backend.prefix(), "nested/prefix");
  assert_eq!(backend.fetch_range(6, 11).unwrap(), "world");
}

#[test]
fn test_object_store_caches_shards() {
  let store = seeded_store(&"k".repeat(100), 10, "");
  let backend = ObjectStoreBackend::new(store, "", BackendOptions::with_cache_capacity(4)).unwrap();

  backend.fetch_range(0, 5).unwrap();
  backend.fetch_range(5, 10).unwrap();
  let stats = backend.cache_stats().unwrap();
  assert_eq!(stats.loads, 1);
  assert_eq!(stats.hits, 1);
}

#[test]
fn test_object_store_missing_descriptor() {
  let store = Arc::new(InMemory::new());
  assert!(matches!(
    ObjectStoreBackend::new(store, "nothing/here", BackendOptions::default()),
    Err(Error::DescriptorNotFound(_))
  ));
}

#[test]
fn test_object_store_missing_shard() {
  let store = seeded_store("abcdefghij", 3, "p");
  let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
  rt.block_on(store.delete(&ObjectPath::from("p/0002.txt"))).unwrap();

  let backend = ObjectStoreBackend::new(store, "p", BackendOptions::default()).unwrap();
  assert_eq!(backend.fetch_range(0, 6).unwrap(), "abcdef");
  assert!(matches!(backend.fetch_range(0, 10), Err(Error::ShardNotFound(2))));
}

#[test]
fn test_upload_keeps_names_and_bytes() {
  let dir = tempdir().unwrap();
  ingest_str("abcde", dir.path(), &IngestOptions::new(2)).unwrap();

  let store = Arc::new(InMemory::new());
  upload_dir(store.as_ref(), dir.path(), "x").unwrap();

  let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
  for name in ["0000.txt", "0001.txt", "0002.txt", "meta.json"] {
    let key = ObjectPath::from(format!("x/{}", name));
    let remote = rt.block_on(async { store.get(&key).await.unwrap().bytes().await.unwrap() });
    let local = std::fs::read(dir.path().join(name)).unwrap();
    assert_eq!(remote.as_ref(), local.as_slice(), "{} differs", name);
  }
}
