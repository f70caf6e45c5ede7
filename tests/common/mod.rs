#![allow(dead_code)]

use ironshard::{BackendOptions, FileBackend, IngestOptions, LazyText, ShardIndex};
use tempfile::TempDir;

pub struct TestEnv {
  pub backend: FileBackend,
  pub index: ShardIndex,
  pub reference: String,
  // The TempDir guard must be kept alive to prevent premature deletion of the directory.
  pub _dir: TempDir,
  pub root: std::path::PathBuf,
}

impl TestEnv {
  /// Ingests `data` with the given shard size and opens it with `options`.
  pub fn with_options(data: &str, shard_size: u64, options: BackendOptions) -> Self {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_path_buf();

    let index = ironshard::ingest_str(data, &root, &IngestOptions::new(shard_size)).unwrap();
    let backend = FileBackend::with_options(&root, options).unwrap();

    Self {
      backend,
      index,
      reference: data.to_string(),
      _dir: dir,
      root,
    }
  }

  pub fn new(data: &str, shard_size: u64) -> Self {
    Self::with_options(data, shard_size, BackendOptions::default())
  }

  pub fn text(&self) -> LazyText<'_> {
    LazyText::new(&self.backend)
  }

  /// Reference substring by character positions.
  pub fn expected(&self, start: usize, stop: usize) -> String {
    self.reference.chars().skip(start).take(stop.saturating_sub(start)).collect()
  }
}

/// 104 characters: the alphabet four times.
pub fn alphabet_x4() -> String {
  "abcdefghijklmnopqrstuvwxyz".repeat(4)
}
