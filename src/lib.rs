//! # IronShard
//!
//! `ironshard` provides random-access reads over very large text blobs that
//! are split into fixed-size shards, without ever materializing the whole
//! blob in memory.
//!
//! ## Key Features
//!
//! * **O(1) Addressing**: Uniform shard sizes turn range lookups into integer division.
//! * **Backend-Agnostic**: Local directories, in-memory shards, or any object store (S3, MinIO, GCS).
//! * **Shared Range Fetch**: Cross-shard boundary handling is written once, above the backends.
//! * **Bounded Caching**: Per-backend LRU cache of whole shards.
//! * **String Semantics**: `LazyText` offers indexing, slicing, search and equality on demand.
//!
//! ## Example
//!
//! ```no_run
//! use ironshard::{FileBackend, IngestOptions, LazyText, ingest_str};
//! use std::path::Path;
//!
//! # fn main() -> ironshard::Result<()> {
//! let dir = Path::new("./shards");
//! ingest_str("abcdefghij", dir, &IngestOptions::new(3))?;
//!
//! let backend = FileBackend::open(dir)?;
//! let text = LazyText::new(&backend);
//!
//! assert_eq!(text.substring(1, 8)?, "bcdefgh");
//! assert_eq!(text.at(-1)?, "j");
//! assert!(text.contains("cde")?);
//! # Ok(())
//! # }
//! ```

pub mod backend;
mod cache;
mod config;
mod error;
mod index;
mod ingest;
mod iter;
mod text;
#[cfg(feature = "object-store")]
mod upload;
mod util;

// Re-exports for the flat public API
pub use backend::{Backend, FileBackend, MemoryBackend};
#[cfg(feature = "object-store")]
pub use backend::ObjectStoreBackend;
pub use cache::{CacheStats, ShardCache};
pub use config::{
  BackendOptions, DEFAULT_DESCRIPTOR_NAME, DEFAULT_SHARD_EXTENSION, DEFAULT_SHARD_SIZE, IngestOptions, ReadStrategy,
};
pub use error::{Error, Result};
pub use index::{ShardIndex, ShardIndexBuilder, ShardMeta};
pub use ingest::{ingest_file, ingest_str};
pub use iter::LazyChars;
pub use text::LazyText;
#[cfg(feature = "object-store")]
pub use upload::{upload_dir, upload_dir_with_descriptor};
pub use util::shard_filename;
