use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
  #[error("I/O Error: {0}")]
  Io(#[from] io::Error),

  #[error("Shard not found: {0}")]
  ShardNotFound(u64),

  #[error("Index descriptor not found: {0}")]
  DescriptorNotFound(PathBuf),

  #[error("Index {index} out of range for text of length {length}")]
  OutOfRange { index: i64, length: u64 },

  #[error("Unsupported operation: {0}")]
  Unsupported(String),

  #[error("Data Corruption: {0}")]
  Corruption(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Serialization Error: {0}")]
  Serialization(String),

  #[error("Storage Error: {0}")]
  Storage(String),
}

impl From<serde_json::Error> for Error {
  fn from(e: serde_json::Error) -> Self {
    Error::Serialization(e.to_string())
  }
}

#[cfg(feature = "object-store")]
impl From<object_store::Error> for Error {
  fn from(e: object_store::Error) -> Self {
    match e {
      object_store::Error::NotFound { path, .. } => Error::Storage(format!("object not found: {}", path)),
      other => Error::Storage(other.to_string()),
    }
  }
}
