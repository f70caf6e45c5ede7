//! Splits a source text into shard files plus a `meta.json` descriptor.
//!
//! Shards are written before the descriptor, so a reader that finds a
//! descriptor always finds every shard it lists.

use crate::config::IngestOptions;
use crate::error::{Error, Result};
use crate::index::{ShardIndex, ShardIndexBuilder};
use crate::util::{self, parse_shard_id, shard_filename};
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;

/// Size of the byte blocks read from the source file.
const READ_BLOCK_SIZE: usize = 64 * 1024;

/// Ingests an in-memory string into `output_dir`.
pub fn ingest_str(data: &str, output_dir: &Path, options: &IngestOptions) -> Result<ShardIndex> {
  let source = options.source_identifier.clone().unwrap_or_else(|| "<string>".to_string());
  let mut writer = ShardWriter::create(output_dir, options, source)?;
  writer.write_str(data)?;
  writer.finish()
}

/// Streams a UTF-8 file into `output_dir`. Never holds more than one shard
/// (plus one read block) in memory.
pub fn ingest_file(path: &Path, output_dir: &Path, options: &IngestOptions) -> Result<ShardIndex> {
  let source = options
    .source_identifier
    .clone()
    .unwrap_or_else(|| path.display().to_string());
  let mut reader = BufReader::new(File::open(path)?);
  let mut writer = ShardWriter::create(output_dir, options, source)?;

  let mut block = vec![0u8; READ_BLOCK_SIZE];
  // Bytes of a multi-byte character split across two reads.
  let mut pending: Vec<u8> = Vec::new();

  loop {
    let n = reader.read(&mut block)?;
    if n == 0 {
      break;
    }
    pending.extend_from_slice(&block[..n]);

    let valid_up_to = match std::str::from_utf8(&pending) {
      Ok(_) => pending.len(),
      Err(e) if e.error_len().is_none() => e.valid_up_to(),
      Err(e) => {
        return Err(Error::Corruption(format!("Source {:?} is not valid UTF-8: {}", path, e)));
      }
    };

    // Safety: `from_utf8` above validated this prefix.
    let text = unsafe { std::str::from_utf8_unchecked(&pending[..valid_up_to]) };
    writer.write_str(text)?;
    pending.drain(..valid_up_to);
  }

  if !pending.is_empty() {
    return Err(Error::Corruption(format!(
      "Source {:?} ends with a truncated UTF-8 sequence",
      path
    )));
  }

  writer.finish()
}

/// Accumulates characters into shards and writes each one as it fills.
struct ShardWriter<'a> {
  output_dir: &'a Path,
  options: &'a IngestOptions,
  builder: ShardIndexBuilder,
  current: String,
  current_len: u64,
}

impl<'a> ShardWriter<'a> {
  fn create(output_dir: &'a Path, options: &'a IngestOptions, source: String) -> Result<Self> {
    let builder = ShardIndexBuilder::new(options.shard_size, source)?;
    fs::create_dir_all(output_dir)?;

    // A descriptor from an earlier run would describe shards we are about to
    // overwrite. Remove it first so readers see either nothing or the new set.
    match fs::remove_file(output_dir.join(&options.descriptor_name)) {
      Ok(()) => {}
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
      Err(e) => return Err(Error::Io(e)),
    }

    Ok(Self {
      output_dir,
      options,
      builder,
      current: String::new(),
      current_len: 0,
    })
  }

  fn write_str(&mut self, mut text: &str) -> Result<()> {
    while !text.is_empty() {
      let room = self.options.shard_size - self.current_len;
      let (head, tail, taken) = split_at_chars(text, room);
      self.current.push_str(head);
      self.current_len += taken;
      text = tail;

      if self.current_len == self.options.shard_size {
        self.flush_shard()?;
      }
    }
    Ok(())
  }

  fn flush_shard(&mut self) -> Result<()> {
    let shard_id = self.builder.next_shard_id();
    let name = shard_filename(shard_id, &self.options.shard_extension);
    util::write_atomic(self.output_dir, &name, self.current.as_bytes())?;
    self.builder.push(self.current_len)?;

    self.current.clear();
    self.current_len = 0;
    Ok(())
  }

  fn finish(mut self) -> Result<ShardIndex> {
    if self.current_len > 0 || self.builder.next_shard_id() == 0 {
      self.flush_shard()?;
    }

    let index = self.builder.finish()?;
    remove_stale_shards(self.output_dir, &self.options.shard_extension, index.num_shards())?;
    index.save(&self.output_dir.join(&self.options.descriptor_name))?;

    tracing::info!(
      target: "ironshard",
      "Ingested {} characters into {} shards at {:?}",
      index.total_length(),
      index.num_shards(),
      self.output_dir
    );
    Ok(index)
  }
}

/// Splits off at most `n` leading characters of `text`.
/// Returns the head, the rest and the number of characters taken.
fn split_at_chars(text: &str, n: u64) -> (&str, &str, u64) {
  // If the first `n` bytes are ASCII they are also the first `n` characters.
  let at = usize::try_from(n).unwrap_or(usize::MAX).min(text.len());
  if text.as_bytes()[..at].is_ascii() {
    return (&text[..at], &text[at..], at as u64);
  }

  match text.char_indices().nth(n as usize) {
    Some((byte_idx, _)) => (&text[..byte_idx], &text[byte_idx..], n),
    None => (text, "", util::char_len(text)),
  }
}

/// Deletes shard files left behind by an earlier, longer ingestion.
fn remove_stale_shards(output_dir: &Path, extension: &str, num_shards: u64) -> Result<()> {
  for entry in fs::read_dir(output_dir)? {
    let entry = entry?;
    let name = entry.file_name().to_string_lossy().to_string();
    if let Some(id) = parse_shard_id(&name, extension) {
      if id >= num_shards {
        tracing::debug!(target: "ironshard", "Removing stale shard file {:?}", entry.path());
        fs::remove_file(entry.path())?;
      }
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_split_at_chars() {
    assert_eq!(split_at_chars("abcdef", 4), ("abcd", "ef", 4));
    assert_eq!(split_at_chars("ab", 4), ("ab", "", 2));
    assert_eq!(split_at_chars("äöüß", 2), ("äö", "üß", 2));
    assert_eq!(split_at_chars("äö", 5), ("äö", "", 2));
  }
}
