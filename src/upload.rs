//! Copies a local shard directory into an object store.

use crate::backend::object_key;
use crate::config::DEFAULT_DESCRIPTOR_NAME;
use crate::error::Result;
use object_store::{ObjectStore, PutPayload};
use std::fs;
use std::path::Path;

/// Uploads every file in `shards_dir` to `store` under `prefix`, keeping file
/// names verbatim. The descriptor is uploaded last, so a reader never sees a
/// descriptor that references a shard which is not there yet.
///
/// Returns the number of objects written.
pub fn upload_dir(store: &dyn ObjectStore, shards_dir: &Path, prefix: &str) -> Result<usize> {
  upload_dir_with_descriptor(store, shards_dir, prefix, DEFAULT_DESCRIPTOR_NAME)
}

pub fn upload_dir_with_descriptor(
  store: &dyn ObjectStore,
  shards_dir: &Path,
  prefix: &str,
  descriptor_name: &str,
) -> Result<usize> {
  let prefix = prefix.trim_matches('/');
  let names = upload_order(shards_dir, descriptor_name)?;

  let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
  runtime.block_on(async {
    for name in &names {
      let bytes = fs::read(shards_dir.join(name))?;
      store.put(&object_key(prefix, name), PutPayload::from(bytes)).await?;
      tracing::debug!(target: "ironshard", "Uploaded {} to {}/{}", name, store, prefix);
    }
    Ok::<_, crate::error::Error>(())
  })?;

  tracing::info!(target: "ironshard", "Uploaded {} objects from {:?}", names.len(), shards_dir);
  Ok(names.len())
}

/// Lists the regular files of `shards_dir` in the order they are uploaded:
/// sorted by name, with the descriptor moved to the end.
fn upload_order(shards_dir: &Path, descriptor_name: &str) -> Result<Vec<String>> {
  let mut names = Vec::new();
  for entry in fs::read_dir(shards_dir)? {
    let entry = entry?;
    if entry.file_type()?.is_file() {
      names.push(entry.file_name().to_string_lossy().to_string());
    }
  }
  names.sort_unstable();
  // Hold the descriptor back until every shard is in place.
  if let Some(pos) = names.iter().position(|n| n == descriptor_name) {
    let descriptor = names.remove(pos);
    names.push(descriptor);
  }
  Ok(names)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::IngestOptions;

  #[test]
  fn test_descriptor_is_uploaded_last() {
    let dir = tempfile::tempdir().unwrap();
    crate::ingest::ingest_str("abcdefg", dir.path(), &IngestOptions::new(2)).unwrap();

    let order = upload_order(dir.path(), DEFAULT_DESCRIPTOR_NAME).unwrap();
    assert_eq!(order, vec!["0000.txt", "0001.txt", "0002.txt", "0003.txt", "meta.json"]);
  }

  #[test]
  fn test_descriptor_last_even_when_it_sorts_first() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("0000.txt"), "a").unwrap();
    std::fs::write(dir.path().join("0001.txt"), "b").unwrap();
    std::fs::write(dir.path().join("000-index.json"), "{}").unwrap();
    std::fs::create_dir(dir.path().join("nested")).unwrap();

    let order = upload_order(dir.path(), "000-index.json").unwrap();
    assert_eq!(order, vec!["0000.txt", "0001.txt", "000-index.json"]);
  }
}
