use crate::backend::{self, Backend};
use crate::error::{Error, Result};
use crate::index::{ShardIndex, ShardIndexBuilder};
use std::sync::Arc;

/// Serves shards held in process memory.
///
/// Useful for tests and for callers that already hold shard text but want
/// the same slicing and search semantics as the storage-backed backends.
pub struct MemoryBackend {
  index: ShardIndex,
  shards: Vec<Arc<String>>,
}

impl MemoryBackend {
  /// Splits `text` into shards of `shard_size` characters.
  pub fn from_text(text: &str, shard_size: u64) -> Result<Self> {
    let mut builder = ShardIndexBuilder::new(shard_size, "<memory>")?;
    let mut shards = Vec::new();

    let mut current = String::new();
    let mut current_len = 0u64;
    for c in text.chars() {
      current.push(c);
      current_len += 1;
      if current_len == shard_size {
        builder.push(current_len)?;
        shards.push(Arc::new(std::mem::take(&mut current)));
        current_len = 0;
      }
    }
    if current_len > 0 || shards.is_empty() {
      builder.push(current_len)?;
      shards.push(Arc::new(current));
    }

    Ok(Self {
      index: builder.finish()?,
      shards,
    })
  }

  /// Pairs an existing index with its shard payloads, checking each payload
  /// against its index entry.
  pub fn from_shards(index: ShardIndex, shards: Vec<String>) -> Result<Self> {
    if shards.len() as u64 != index.num_shards() {
      return Err(Error::Corruption(format!(
        "Index lists {} shards but {} payloads were supplied",
        index.num_shards(),
        shards.len()
      )));
    }
    for (meta, text) in index.shards().iter().zip(&shards) {
      backend::verify_shard(text, meta)?;
    }

    Ok(Self {
      index,
      shards: shards.into_iter().map(Arc::new).collect(),
    })
  }
}

impl Backend for MemoryBackend {
  fn index(&self) -> &ShardIndex {
    &self.index
  }

  fn fetch_shard(&self, shard_id: u64) -> Result<Arc<String>> {
    usize::try_from(shard_id)
      .ok()
      .and_then(|i| self.shards.get(i))
      .cloned()
      .ok_or(Error::ShardNotFound(shard_id))
  }

  fn fetch_shard_slice(&self, shard_id: u64, offset: u64, length: u64) -> Result<String> {
    let text = self.fetch_shard(shard_id)?;
    backend::slice_shard(&text, shard_id, offset, length)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_from_text_splits_by_chars() {
    let backend = MemoryBackend::from_text("abcdefghij", 3).unwrap();
    let shards: Vec<String> = (0..4).map(|i| backend.fetch_shard(i).unwrap().to_string()).collect();
    assert_eq!(shards, vec!["abc", "def", "ghi", "j"]);
    assert!(matches!(backend.fetch_shard(4), Err(Error::ShardNotFound(4))));
  }

  #[test]
  fn test_from_shards_rejects_bad_lengths() {
    let index = ShardIndex::build(4, 2, "").unwrap();
    let result = MemoryBackend::from_shards(index, vec!["ab".into(), "c".into()]);
    assert!(matches!(result, Err(Error::Corruption(_))));
  }

  #[test]
  fn test_multibyte_range() {
    let text = "ünïcödé text";
    let backend = MemoryBackend::from_text(text, 4).unwrap();
    assert_eq!(backend.index().total_length(), 12);
    assert_eq!(backend.fetch_range(2, 9).unwrap(), "ïcödé t");
  }
}
