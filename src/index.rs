use crate::error::{Error, Result};
use crate::util;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::Path;

/// Metadata for a single shard.
///
/// Offsets are half-open and expressed in the global character coordinate
/// space of the ingested object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardMeta {
  pub shard_id: u64,
  pub start_offset: u64,
  pub end_offset: u64,
  /// Number of characters in the shard (`end_offset - start_offset`).
  #[serde(rename = "byte_length")]
  pub length: u64,
}

impl ShardMeta {
  #[inline]
  pub fn range(&self) -> Range<u64> {
    self.start_offset..self.end_offset
  }
}

/// On-disk shape of the sidecar descriptor (`meta.json`).
#[derive(Debug, Serialize, Deserialize)]
struct IndexDescriptor {
  total_length: u64,
  shard_size: u64,
  num_shards: u64,
  #[serde(rename = "source_file", alias = "source_identifier")]
  source_identifier: String,
  shards: Vec<ShardMeta>,
}

/// Maps character offsets to shards.
///
/// Immutable once built. Every shard except the last holds exactly
/// `shard_size` characters, which makes `lookup` a pair of integer divisions.
/// A descriptor that breaks that rule (but is otherwise contiguous) is still
/// accepted; lookups then binary search over the shard offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardIndex {
  total_length: u64,
  shard_size: u64,
  source_identifier: String,
  shards: Vec<ShardMeta>,
  uniform: bool,
}

impl ShardIndex {
  /// Builds an index analytically from a known total length and shard size.
  pub fn build(total_length: u64, shard_size: u64, source_identifier: impl Into<String>) -> Result<Self> {
    if shard_size == 0 {
      return Err(Error::Config("Shard size must be greater than zero".into()));
    }

    let num_shards = total_length.div_ceil(shard_size).max(1);
    let shards = (0..num_shards)
      .map(|i| {
        let start = i * shard_size;
        let end = (start + shard_size).min(total_length);
        ShardMeta {
          shard_id: i,
          start_offset: start,
          end_offset: end,
          length: end - start,
        }
      })
      .collect();

    Self::from_shards(total_length, shard_size, source_identifier, shards)
  }

  /// Assembles an index from explicit shard records, validating contiguity.
  pub fn from_shards(
    total_length: u64,
    shard_size: u64,
    source_identifier: impl Into<String>,
    shards: Vec<ShardMeta>,
  ) -> Result<Self> {
    let uniform = validate(total_length, shard_size, &shards)?;
    if !uniform {
      tracing::warn!(target: "ironshard", "Shard index has non-uniform shard sizes; lookups fall back to binary search");
    }

    Ok(Self {
      total_length,
      shard_size,
      source_identifier: source_identifier.into(),
      shards,
      uniform,
    })
  }

  pub fn total_length(&self) -> u64 {
    self.total_length
  }

  /// Nominal shard size in characters.
  pub fn shard_size(&self) -> u64 {
    self.shard_size
  }

  pub fn num_shards(&self) -> u64 {
    self.shards.len() as u64
  }

  pub fn source_identifier(&self) -> &str {
    &self.source_identifier
  }

  pub fn shards(&self) -> &[ShardMeta] {
    &self.shards
  }

  /// Iterates shard records in ascending id order.
  pub fn iter(&self) -> std::slice::Iter<'_, ShardMeta> {
    self.shards.iter()
  }

  pub fn shard(&self, shard_id: u64) -> Option<&ShardMeta> {
    usize::try_from(shard_id).ok().and_then(|i| self.shards.get(i))
  }

  /// Normalizes a half-open range using slice conventions: negative bounds
  /// count from the end, both bounds are clamped into `[0, total_length]`.
  ///
  /// Returns `None` when the normalized range is empty.
  pub fn normalize(&self, start: i64, stop: i64) -> Option<(u64, u64)> {
    let start = clamp_offset(start, self.total_length);
    let stop = clamp_offset(stop, self.total_length);
    if start >= stop { None } else { Some((start, stop)) }
  }

  /// Returns the IDs of every shard overlapping `[start, stop)`, ascending.
  ///
  /// Bounds are normalized as in [`ShardIndex::normalize`]; a degenerate
  /// range yields an empty result.
  pub fn lookup(&self, start: i64, stop: i64) -> Range<u64> {
    match self.normalize(start, stop) {
      Some((start, stop)) => self.lookup_normalized(start, stop),
      None => 0..0,
    }
  }

  /// Lookup for bounds that already satisfy `start < stop <= total_length`.
  pub(crate) fn lookup_normalized(&self, start: u64, stop: u64) -> Range<u64> {
    if self.uniform {
      let first = start / self.shard_size;
      let last = (stop - 1) / self.shard_size;
      return first..last + 1;
    }

    let first = self.shards.partition_point(|s| s.end_offset <= start);
    let end = self.shards.partition_point(|s| s.start_offset < stop);
    first as u64..end as u64
  }

  /// Deserializes an index from descriptor bytes.
  pub fn from_json(bytes: &[u8]) -> Result<Self> {
    let desc: IndexDescriptor = serde_json::from_slice(bytes)?;
    if desc.num_shards != desc.shards.len() as u64 {
      return Err(Error::Corruption(format!(
        "Descriptor declares {} shards but lists {}",
        desc.num_shards,
        desc.shards.len()
      )));
    }
    Self::from_shards(desc.total_length, desc.shard_size, desc.source_identifier, desc.shards)
  }

  /// Serializes the index into descriptor bytes (pretty-printed JSON).
  pub fn to_json(&self) -> Result<Vec<u8>> {
    let desc = IndexDescriptor {
      total_length: self.total_length,
      shard_size: self.shard_size,
      num_shards: self.num_shards(),
      source_identifier: self.source_identifier.clone(),
      shards: self.shards.clone(),
    };
    Ok(serde_json::to_vec_pretty(&desc)?)
  }

  /// Loads the index from a descriptor file.
  pub fn load(path: &Path) -> Result<Self> {
    let bytes = match std::fs::read(path) {
      Ok(b) => b,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        return Err(Error::DescriptorNotFound(path.to_path_buf()));
      }
      Err(e) => return Err(Error::Io(e)),
    };
    tracing::debug!(target: "ironshard", "Loaded shard index descriptor {:?}", path);
    Self::from_json(&bytes)
  }

  /// Writes the index to a descriptor file atomically.
  pub fn save(&self, path: &Path) -> Result<()> {
    let dir = match path.parent() {
      Some(p) if !p.as_os_str().is_empty() => p,
      _ => Path::new("."),
    };
    let name = path
      .file_name()
      .and_then(|n| n.to_str())
      .ok_or_else(|| Error::Config(format!("Invalid descriptor path: {:?}", path)))?;
    util::write_atomic(dir, name, &self.to_json()?)
  }
}

/// Builds a `ShardIndex` incrementally as shards are written.
pub struct ShardIndexBuilder {
  shard_size: u64,
  source_identifier: String,
  shards: Vec<ShardMeta>,
  next_offset: u64,
}

impl ShardIndexBuilder {
  pub fn new(shard_size: u64, source_identifier: impl Into<String>) -> Result<Self> {
    if shard_size == 0 {
      return Err(Error::Config("Shard size must be greater than zero".into()));
    }
    Ok(Self {
      shard_size,
      source_identifier: source_identifier.into(),
      shards: Vec::new(),
      next_offset: 0,
    })
  }

  /// Records the next shard, which holds `length` characters.
  ///
  /// Only the final shard may be shorter than the nominal size, so pushing
  /// after a short shard is an error.
  pub fn push(&mut self, length: u64) -> Result<ShardMeta> {
    if length > self.shard_size {
      return Err(Error::Config(format!(
        "Shard of {} characters exceeds nominal size {}",
        length, self.shard_size
      )));
    }
    if let Some(last) = self.shards.last() {
      if last.length < self.shard_size {
        return Err(Error::Config("Cannot append a shard after a short final shard".into()));
      }
    }
    if length == 0 && !self.shards.is_empty() {
      return Err(Error::Config("Only an empty object may contain a zero-length shard".into()));
    }

    let meta = ShardMeta {
      shard_id: self.shards.len() as u64,
      start_offset: self.next_offset,
      end_offset: self.next_offset + length,
      length,
    };
    self.next_offset = meta.end_offset;
    self.shards.push(meta);
    Ok(meta)
  }

  pub fn next_shard_id(&self) -> u64 {
    self.shards.len() as u64
  }

  pub fn finish(mut self) -> Result<ShardIndex> {
    if self.shards.is_empty() {
      self.push(0)?;
    }
    ShardIndex::from_shards(self.next_offset, self.shard_size, self.source_identifier, self.shards)
  }
}

fn clamp_offset(offset: i64, total: u64) -> u64 {
  if offset < 0 {
    total.saturating_sub(offset.unsigned_abs())
  } else {
    (offset as u64).min(total)
  }
}

/// Checks the contiguity invariants. Returns whether all but the final
/// shard have exactly the nominal size.
fn validate(total_length: u64, shard_size: u64, shards: &[ShardMeta]) -> Result<bool> {
  if shard_size == 0 {
    return Err(Error::Corruption("Shard size must be greater than zero".into()));
  }
  if shards.is_empty() {
    return Err(Error::Corruption("Shard index contains no shards".into()));
  }

  let mut uniform = true;
  let mut expected_start = 0u64;
  let last_idx = shards.len() - 1;

  for (i, shard) in shards.iter().enumerate() {
    if shard.shard_id != i as u64 {
      return Err(Error::Corruption(format!(
        "Shard IDs are not dense: expected {}, found {}",
        i, shard.shard_id
      )));
    }
    if shard.start_offset != expected_start {
      return Err(Error::Corruption(format!(
        "Shard {} starts at {} but previous shard ended at {}",
        i, shard.start_offset, expected_start
      )));
    }
    if shard.end_offset < shard.start_offset || shard.end_offset - shard.start_offset != shard.length {
      return Err(Error::Corruption(format!(
        "Shard {} has inconsistent range {}..{} for length {}",
        i, shard.start_offset, shard.end_offset, shard.length
      )));
    }
    if shard.length > shard_size {
      return Err(Error::Corruption(format!(
        "Shard {} holds {} characters, more than the nominal size {}",
        i, shard.length, shard_size
      )));
    }
    if shard.length == 0 && !(shards.len() == 1 && total_length == 0) {
      return Err(Error::Corruption(format!("Shard {} is empty", i)));
    }
    if i != last_idx && shard.length != shard_size {
      uniform = false;
    }
    expected_start = shard.end_offset;
  }

  if expected_start != total_length {
    return Err(Error::Corruption(format!(
      "Shards cover {} characters but total length is {}",
      expected_start, total_length
    )));
  }

  Ok(uniform)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn meta(id: u64, start: u64, end: u64) -> ShardMeta {
    ShardMeta {
      shard_id: id,
      start_offset: start,
      end_offset: end,
      length: end - start,
    }
  }

  #[test]
  fn test_build_ten_by_three() {
    let index = ShardIndex::build(10, 3, "").unwrap();
    assert_eq!(index.num_shards(), 4);
    let lengths: Vec<u64> = index.shards().iter().map(|s| s.length).collect();
    assert_eq!(lengths, vec![3, 3, 3, 1]);
    assert_eq!(index.lookup(1, 8), 0..3);
  }

  #[test]
  fn test_build_empty() {
    let index = ShardIndex::build(0, 10, "").unwrap();
    assert_eq!(index.num_shards(), 1);
    assert_eq!(index.shards()[0].length, 0);
    assert_eq!(index.lookup(0, 10), 0..0);
  }

  #[test]
  fn test_zero_shard_size_rejected() {
    assert!(matches!(ShardIndex::build(10, 0, ""), Err(Error::Config(_))));
  }

  #[test]
  fn test_negative_and_clamped_bounds() {
    let index = ShardIndex::build(10, 3, "").unwrap();
    assert_eq!(index.normalize(-3, 100), Some((7, 10)));
    assert_eq!(index.normalize(-100, 2), Some((0, 2)));
    assert_eq!(index.normalize(5, 5), None);
    assert_eq!(index.normalize(5, 3), None);
    assert_eq!(index.normalize(-1, -1), None);
    assert_eq!(index.lookup(-1, 10), 3..4);
    assert_eq!(index.lookup(3, 6), 1..2);
    assert_eq!(index.lookup(2, 4), 0..2);
  }

  #[test]
  fn test_non_uniform_falls_back_to_search() {
    let shards = vec![meta(0, 0, 2), meta(1, 2, 5), meta(2, 5, 6)];
    let index = ShardIndex::from_shards(6, 3, "hand-made", shards).unwrap();
    assert_eq!(index.lookup(0, 2), 0..1);
    assert_eq!(index.lookup(2, 3), 1..2);
    assert_eq!(index.lookup(1, 6), 0..3);
    assert_eq!(index.lookup(5, 6), 2..3);
  }

  #[test]
  fn test_rejects_gaps_and_overlaps() {
    let gap = vec![meta(0, 0, 3), meta(1, 4, 6)];
    assert!(matches!(ShardIndex::from_shards(6, 3, "", gap), Err(Error::Corruption(_))));

    let short_total = vec![meta(0, 0, 3), meta(1, 3, 5)];
    assert!(matches!(
      ShardIndex::from_shards(6, 3, "", short_total),
      Err(Error::Corruption(_))
    ));

    let oversized = vec![meta(0, 0, 4)];
    assert!(matches!(ShardIndex::from_shards(4, 3, "", oversized), Err(Error::Corruption(_))));

    let bad_id = vec![meta(1, 0, 3)];
    assert!(matches!(ShardIndex::from_shards(3, 3, "", bad_id), Err(Error::Corruption(_))));
  }

  #[test]
  fn test_builder_matches_analytic_build() {
    let mut builder = ShardIndexBuilder::new(4, "src").unwrap();
    builder.push(4).unwrap();
    builder.push(4).unwrap();
    builder.push(2).unwrap();
    assert!(builder.push(1).is_err());
    let built = builder.finish().unwrap();

    assert_eq!(built, ShardIndex::build(10, 4, "src").unwrap());
  }

  #[test]
  fn test_builder_empty_object() {
    let index = ShardIndexBuilder::new(8, "").unwrap().finish().unwrap();
    assert_eq!(index.total_length(), 0);
    assert_eq!(index.num_shards(), 1);
  }

  #[test]
  fn test_json_roundtrip() {
    let index = ShardIndex::build(26, 10, "<string>").unwrap();
    let json = index.to_json().unwrap();
    let text = String::from_utf8(json.clone()).unwrap();
    assert!(text.contains("\"source_file\""));
    assert!(text.contains("\"byte_length\""));
    assert_eq!(ShardIndex::from_json(&json).unwrap(), index);
  }

  #[test]
  fn test_json_num_shards_mismatch() {
    let json = br#"{"total_length": 3, "shard_size": 3, "num_shards": 2, "source_identifier": "x",
      "shards": [{"shard_id": 0, "start_offset": 0, "end_offset": 3, "byte_length": 3}]}"#;
    assert!(matches!(ShardIndex::from_json(json), Err(Error::Corruption(_))));
  }
}
