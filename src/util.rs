use crate::error::Result;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Generates a shard payload filename from a shard ID.
/// Format: 0007.txt (at least 4 digits)
pub fn shard_filename(shard_id: u64, extension: &str) -> String {
  format!("{:04}.{}", shard_id, extension)
}

/// Parses a shard ID from a payload filename.
pub fn parse_shard_id(filename: &str, extension: &str) -> Option<u64> {
  let stem = filename.strip_suffix(extension)?.strip_suffix('.')?;
  if stem.len() < 4 || !stem.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  stem.parse::<u64>().ok()
}

/// Returns the number of characters in `text`.
#[inline]
pub fn char_len(text: &str) -> u64 {
  if text.is_ascii() {
    text.len() as u64
  } else {
    text.chars().count() as u64
  }
}

/// Returns the sub-slice of `text` holding `length` characters starting at
/// character `offset`, or `None` if that range runs past the end of `text`.
pub fn char_slice(text: &str, offset: u64, length: u64) -> Option<&str> {
  let end = offset.checked_add(length)?;

  // ASCII fast path: character positions are byte positions.
  if text.is_ascii() {
    if end > text.len() as u64 {
      return None;
    }
    return Some(&text[offset as usize..end as usize]);
  }

  let mut start_byte = None;
  let mut end_byte = None;
  for (pos, (byte_idx, _)) in text.char_indices().enumerate() {
    let pos = pos as u64;
    if pos == offset {
      start_byte = Some(byte_idx);
    }
    if pos == end {
      end_byte = Some(byte_idx);
      break;
    }
  }

  // Offsets equal to the character count map to the end of the string.
  let count = if start_byte.is_none() || end_byte.is_none() {
    char_len(text)
  } else {
    0
  };
  let start_byte = match start_byte {
    Some(b) => b,
    None if offset == count => text.len(),
    None => return None,
  };
  let end_byte = match end_byte {
    Some(b) => b,
    None if end == count => text.len(),
    None => return None,
  };

  Some(&text[start_byte..end_byte])
}

/// Converts a byte position inside `text` into a character position.
#[inline]
pub fn byte_to_char_pos(text: &str, byte_pos: usize) -> u64 {
  char_len(&text[..byte_pos])
}

/// Writes `contents` to `dir/name` atomically: temp file, fsync, rename,
/// then fsync the directory so the rename is persisted.
pub fn write_atomic(dir: &Path, name: &str, contents: &[u8]) -> Result<()> {
  let temp_path = dir.join(format!("{}.tmp", name));
  let final_path = dir.join(name);

  let mut file = File::create(&temp_path)?;
  file.write_all(contents)?;
  file.sync_all()?;
  drop(file);

  fs::rename(&temp_path, &final_path)?;

  // Directory fsync is not supported on every platform; the rename itself
  // already happened, so a failure here is not fatal.
  if let Ok(parent_dir) = File::open(dir) {
    let _ = parent_dir.sync_all();
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_filenames() {
    assert_eq!(shard_filename(7, "txt"), "0007.txt");
    assert_eq!(shard_filename(12345, "txt"), "12345.txt");
    assert_eq!(parse_shard_id("0007.txt", "txt"), Some(7));
    assert_eq!(parse_shard_id("meta.json", "txt"), None);
    assert_eq!(parse_shard_id("7.txt", "txt"), None);
    assert_eq!(parse_shard_id("0007.txt.tmp", "txt"), None);
  }

  #[test]
  fn test_char_slice_ascii() {
    assert_eq!(char_slice("abcdef", 1, 3), Some("bcd"));
    assert_eq!(char_slice("abcdef", 6, 0), Some(""));
    assert_eq!(char_slice("abcdef", 4, 3), None);
  }

  #[test]
  fn test_char_slice_multibyte() {
    let text = "héllo wörld";
    assert_eq!(char_slice(text, 1, 4), Some("éllo"));
    assert_eq!(char_slice(text, 7, 4), Some("örld"));
    assert_eq!(char_slice(text, 11, 0), Some(""));
    assert_eq!(char_slice(text, 0, 11), Some(text));
    assert_eq!(char_slice(text, 8, 4), None);
    assert_eq!(char_slice(text, 12, 0), None);
  }

  #[test]
  fn test_char_positions() {
    assert_eq!(char_len("日本語"), 3);
    let text = "日本語abc";
    assert_eq!(byte_to_char_pos(text, text.find('a').unwrap()), 3);
  }
}
