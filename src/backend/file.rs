use crate::backend::{self, Backend};
use crate::cache::{CacheStats, ShardCache};
use crate::config::{BackendOptions, ReadStrategy};
use crate::error::{Error, Result};
use crate::index::ShardIndex;
use crate::util::shard_filename;
use memmap2::Mmap;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Reads shards from a local directory.
///
/// Shards are stored as `shards_dir/NNNN.txt` next to a `meta.json`
/// descriptor.
pub struct FileBackend {
  shards_dir: PathBuf,
  index: ShardIndex,
  options: BackendOptions,
  cache: ShardCache,
}

impl FileBackend {
  /// Opens a shard directory with default options.
  pub fn open(shards_dir: impl Into<PathBuf>) -> Result<Self> {
    Self::with_options(shards_dir, BackendOptions::default())
  }

  pub fn with_options(shards_dir: impl Into<PathBuf>, options: BackendOptions) -> Result<Self> {
    let shards_dir = shards_dir.into();
    let index = ShardIndex::load(&shards_dir.join(&options.descriptor_name))?;
    let cache = ShardCache::new(options.cache_capacity)?;

    tracing::debug!(
      target: "ironshard",
      "Opened shard directory {:?}: {} shards, {} characters",
      shards_dir,
      index.num_shards(),
      index.total_length()
    );

    Ok(Self {
      shards_dir,
      index,
      options,
      cache,
    })
  }

  pub fn shards_dir(&self) -> &Path {
    &self.shards_dir
  }

  pub fn shard_path(&self, shard_id: u64) -> PathBuf {
    self.shards_dir.join(shard_filename(shard_id, &self.options.shard_extension))
  }

  fn read_shard_uncached(&self, shard_id: u64) -> Result<String> {
    let meta = backend::shard_meta(&self.index, shard_id)?;
    let path = self.shard_path(shard_id);

    let mut file = match File::open(&path) {
      Ok(f) => f,
      Err(e) if e.kind() == ErrorKind::NotFound => return Err(Error::ShardNotFound(shard_id)),
      Err(e) => return Err(Error::Io(e)),
    };

    let bytes = match self.options.read_strategy {
      ReadStrategy::StandardIo => {
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;
        buf
      }
      ReadStrategy::Mmap => {
        if file.metadata()?.len() == 0 {
          Vec::new()
        } else {
          // Safety: shards are immutable once ingested; external modification is a risk.
          let mmap = unsafe { Mmap::map(&file)? };
          mmap.to_vec()
        }
      }
    };

    let text = String::from_utf8(bytes)
      .map_err(|e| Error::Corruption(format!("Shard {} is not valid UTF-8: {}", shard_id, e)))?;
    backend::verify_shard(&text, meta)?;
    Ok(text)
  }
}

impl Backend for FileBackend {
  fn index(&self) -> &ShardIndex {
    &self.index
  }

  fn fetch_shard(&self, shard_id: u64) -> Result<Arc<String>> {
    self.cache.get_or_load(shard_id, || self.read_shard_uncached(shard_id))
  }

  fn fetch_shard_slice(&self, shard_id: u64, offset: u64, length: u64) -> Result<String> {
    let text = self.fetch_shard(shard_id)?;
    backend::slice_shard(&text, shard_id, offset, length)
  }

  fn cache_stats(&self) -> Option<CacheStats> {
    Some(self.cache.stats())
  }
}
