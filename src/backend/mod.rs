//! Storage backends.
//!
//! A backend knows how to fetch one whole shard, or a slice of one shard,
//! from a concrete medium. Everything above a single shard (normalizing
//! bounds, resolving covering shards, stitching slices together) lives in
//! [`Backend::fetch_range`] so concrete backends only supply the primitives.

mod file;
mod memory;
#[cfg(feature = "object-store")]
mod object;

pub use file::FileBackend;
pub use memory::MemoryBackend;
#[cfg(feature = "object-store")]
pub use object::ObjectStoreBackend;
#[cfg(feature = "object-store")]
pub(crate) use object::object_key;

use crate::cache::CacheStats;
use crate::error::{Error, Result};
use crate::index::{ShardIndex, ShardMeta};
use crate::util;
use std::sync::Arc;

pub trait Backend: Send + Sync {
  /// The index describing the shards this backend serves.
  fn index(&self) -> &ShardIndex;

  /// Fetches the full contents of a shard.
  fn fetch_shard(&self, shard_id: u64) -> Result<Arc<String>>;

  /// Fetches `length` characters of a shard starting at `offset`
  /// (relative to the shard start).
  fn fetch_shard_slice(&self, shard_id: u64, offset: u64, length: u64) -> Result<String>;

  /// Cache counters, for backends that cache shards.
  fn cache_stats(&self) -> Option<CacheStats> {
    None
  }

  /// Fetches the characters in `[start, stop)` across shards.
  ///
  /// Bounds follow slice conventions: negative values count from the end and
  /// both are clamped into `[0, len]`. An empty range yields an empty string.
  /// The first failing shard fetch aborts the call.
  fn fetch_range(&self, start: i64, stop: i64) -> Result<String> {
    let index = self.index();
    let (start, stop) = match index.normalize(start, stop) {
      Some(bounds) => bounds,
      None => return Ok(String::new()),
    };

    let mut out = String::new();
    for shard_id in index.lookup_normalized(start, stop) {
      let meta = shard_meta(index, shard_id)?;
      let local_start = start.saturating_sub(meta.start_offset);
      let local_end = meta.length.min(stop - meta.start_offset);
      if local_end <= local_start {
        continue;
      }
      out.push_str(&self.fetch_shard_slice(shard_id, local_start, local_end - local_start)?);
    }
    Ok(out)
  }
}

/// Resolves `shard_id` against the index, failing with `ShardNotFound`.
pub(crate) fn shard_meta(index: &ShardIndex, shard_id: u64) -> Result<&ShardMeta> {
  index.shard(shard_id).ok_or(Error::ShardNotFound(shard_id))
}

/// Slices a materialized shard, reporting a shard shorter than its index
/// entry as corruption.
pub(crate) fn slice_shard(text: &str, shard_id: u64, offset: u64, length: u64) -> Result<String> {
  util::char_slice(text, offset, length)
    .map(str::to_string)
    .ok_or_else(|| {
      Error::Corruption(format!(
        "Shard {} is shorter than its index entry (requested {} characters at offset {})",
        shard_id, length, offset
      ))
    })
}

/// Checks a freshly loaded shard against its index entry.
pub(crate) fn verify_shard(text: &str, meta: &ShardMeta) -> Result<()> {
  let actual = util::char_len(text);
  if actual != meta.length {
    return Err(Error::Corruption(format!(
      "Shard {} holds {} characters but the index records {}",
      meta.shard_id, actual, meta.length
    )));
  }
  Ok(())
}
