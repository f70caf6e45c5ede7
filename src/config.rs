/// Default name of the sidecar index descriptor.
pub const DEFAULT_DESCRIPTOR_NAME: &str = "meta.json";

/// Default extension of shard payload files.
pub const DEFAULT_SHARD_EXTENSION: &str = "txt";

/// Default nominal shard size, in characters.
pub const DEFAULT_SHARD_SIZE: u64 = 1_000_000;

/// Defines the strategy used for reading shard files from local disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStrategy {
  /// Reads the whole shard file with `std::fs`.
  StandardIo,

  /// Memory-maps the shard file and copies the text out of the map.
  /// WARNING: carries SIGBUS risks if the file is truncated while mapped.
  Mmap,
}

#[derive(Debug, Clone)]
pub struct BackendOptions {
  /// Maximum number of fully materialized shards kept in memory.
  /// Uses an LRU policy to enforce this limit. Zero disables caching.
  /// Default: 32.
  pub cache_capacity: usize,

  /// How `FileBackend` reads shard payloads. Ignored by other backends.
  pub read_strategy: ReadStrategy,

  /// Name of the index descriptor next to the shard files.
  /// Default: `meta.json`.
  pub descriptor_name: String,

  /// Extension of the shard payload files, without the dot.
  /// Default: `txt`.
  pub shard_extension: String,
}

impl Default for BackendOptions {
  fn default() -> Self {
    Self {
      cache_capacity: 32,
      read_strategy: ReadStrategy::StandardIo,
      descriptor_name: DEFAULT_DESCRIPTOR_NAME.to_string(),
      shard_extension: DEFAULT_SHARD_EXTENSION.to_string(),
    }
  }
}

impl BackendOptions {
  pub fn with_cache_capacity(capacity: usize) -> Self {
    Self {
      cache_capacity: capacity,
      ..Default::default()
    }
  }
}

#[derive(Debug, Clone)]
pub struct IngestOptions {
  /// Nominal shard size in characters. Every shard but the last holds
  /// exactly this many characters.
  /// Default: 1,000,000.
  pub shard_size: u64,

  /// Diagnostic label recorded in the descriptor. When `None`, file ingestion
  /// records the source path and string ingestion records `<string>`.
  pub source_identifier: Option<String>,

  pub descriptor_name: String,
  pub shard_extension: String,
}

impl Default for IngestOptions {
  fn default() -> Self {
    Self {
      shard_size: DEFAULT_SHARD_SIZE,
      source_identifier: None,
      descriptor_name: DEFAULT_DESCRIPTOR_NAME.to_string(),
      shard_extension: DEFAULT_SHARD_EXTENSION.to_string(),
    }
  }
}

impl IngestOptions {
  pub fn new(shard_size: u64) -> Self {
    Self {
      shard_size,
      ..Default::default()
    }
  }
}
