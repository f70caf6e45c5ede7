use crate::error::{Error, Result};
use fibre_cache::policy::lru::LruPolicy;
use fibre_cache::{Cache, CacheBuilder};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time counters of a [`ShardCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
  pub hits: u64,
  pub misses: u64,
  /// Number of times the underlying storage was asked for a shard.
  pub loads: u64,
}

/// A bounded, LRU-evicted read-through cache of fully materialized shards.
///
/// Shards are immutable, so entries never need invalidation. Concurrent
/// misses on the same cold shard may each load it; the last insert wins.
/// Eviction runs on the insert path, so the cache never holds more than
/// `capacity` shards once an insert returns.
pub struct ShardCache {
  inner: Option<Cache<u64, Arc<String>>>,
  capacity: usize,
  hits: AtomicU64,
  misses: AtomicU64,
  loads: AtomicU64,
}

impl ShardCache {
  /// Creates a cache holding at most `capacity` shards. A capacity of zero
  /// disables caching: every lookup goes to storage.
  pub fn new(capacity: usize) -> Result<Self> {
    let inner = if capacity > 0 {
      let cache = CacheBuilder::new()
        .shards(1)
        .capacity(capacity as u64)
        .cache_policy_factory(|| Box::new(LruPolicy::new()))
        .maintenance_chance(1)
        .build()
        .map_err(|e| Error::Config(format!("Failed to build shard cache: {}", e)))?;
      Some(cache)
    } else {
      None
    };

    Ok(Self {
      inner,
      capacity,
      hits: AtomicU64::new(0),
      misses: AtomicU64::new(0),
      loads: AtomicU64::new(0),
    })
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Returns the cached shard, or runs `load` and caches its result.
  /// Errors from `load` propagate and nothing is cached.
  pub fn get_or_load<F>(&self, shard_id: u64, load: F) -> Result<Arc<String>>
  where
    F: FnOnce() -> Result<String>,
  {
    let cache = match &self.inner {
      Some(c) => c,
      None => {
        self.loads.fetch_add(1, Ordering::Relaxed);
        return load().map(Arc::new);
      }
    };

    // 1. Optimistic fetch.
    if let Some(entry) = cache.fetch(&shard_id) {
      self.hits.fetch_add(1, Ordering::Relaxed);
      return Ok(Arc::clone(&*entry));
    }

    // 2. On miss, go to storage.
    self.misses.fetch_add(1, Ordering::Relaxed);
    self.loads.fetch_add(1, Ordering::Relaxed);
    tracing::debug!(target: "ironshard", "Shard cache miss for shard {}", shard_id);
    let shared = Arc::new(load()?);

    // 3. The cost of an entry is 1 (one shard), so capacity counts shards.
    // The janitor alone trims only periodically; evict now so a scan over
    // many shards stays within capacity.
    cache.insert(shard_id, Arc::clone(&shared), 1);
    cache.run_maintenance();
    Ok(shared)
  }

  pub fn stats(&self) -> CacheStats {
    CacheStats {
      hits: self.hits.load(Ordering::Relaxed),
      misses: self.misses.load(Ordering::Relaxed),
      loads: self.loads.load(Ordering::Relaxed),
    }
  }
}
