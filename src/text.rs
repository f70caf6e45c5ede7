use std::fmt;

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::iter::LazyChars;
use crate::util;

/// Texts up to this many characters are rendered in full by
/// [`LazyText::to_display_string`].
pub const DISPLAY_FULL_LIMIT: u64 = 200;

/// Characters kept from each end when a long text is rendered.
pub const DISPLAY_EDGE: u64 = 80;

/// A string-like view over sharded storage.
///
/// Holds no text of its own: every operation is answered by on-demand
/// fetches through the backend, so indexing and slicing cost only the shards
/// they touch. Whole-object operations (search, equality) walk the object
/// one shard at a time.
///
/// `LazyText` deliberately does not implement `Hash`; see
/// [`LazyText::try_hash`].
#[derive(Clone, Copy)]
pub struct LazyText<'a> {
  backend: &'a dyn Backend,
}

impl<'a> LazyText<'a> {
  pub fn new(backend: &'a dyn Backend) -> Self {
    Self { backend }
  }

  pub fn backend(&self) -> &'a dyn Backend {
    self.backend
  }

  /// Length in characters. Read from the index; no I/O.
  pub fn len(&self) -> u64 {
    self.backend.index().total_length()
  }

  /// Whether the text has no characters. The text is "truthy" iff this is false.
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Returns the character at `index` as a one-character string.
  ///
  /// Negative indices count from the end. Unlike slices, out-of-range
  /// indices are an error rather than clamped.
  pub fn at(&self, index: i64) -> Result<String> {
    let len = self.len() as i64;
    let pos = if index < 0 { index + len } else { index };
    if pos < 0 || pos >= len {
      return Err(Error::OutOfRange {
        index,
        length: self.len(),
      });
    }
    self.backend.fetch_range(pos, pos + 1)
  }

  /// Extended slice with the usual semantics: `None` bounds default to the
  /// ends (depending on the sign of `step`), negative bounds count from the
  /// end, and out-of-range bounds are clamped.
  ///
  /// A unit step is a single range fetch. Any other step fetches every
  /// selected character individually, one backend call each.
  pub fn slice(&self, start: Option<i64>, stop: Option<i64>, step: i64) -> Result<String> {
    let (start, stop) = slice_indices(start, stop, step, self.len() as i64)?;

    if step == 1 {
      return self.backend.fetch_range(start, stop);
    }

    let mut out = String::new();
    let mut pos = start;
    while (step > 0 && pos < stop) || (step < 0 && pos > stop) {
      out.push_str(&self.backend.fetch_range(pos, pos + 1)?);
      pos += step;
    }
    Ok(out)
  }

  /// `[start, stop)` with slice conventions; shorthand for a unit-step slice.
  pub fn substring(&self, start: i64, stop: i64) -> Result<String> {
    self.slice(Some(start), Some(stop), 1)
  }

  /// Materializes the whole text.
  pub fn to_text(&self) -> Result<String> {
    self.backend.fetch_range(0, self.len() as i64)
  }

  /// Short-form rendering: the full text when it is short, otherwise the
  /// first and last 80 characters around an omission marker. The middle is
  /// never fetched.
  pub fn to_display_string(&self) -> Result<String> {
    let n = self.len();
    if n <= DISPLAY_FULL_LIMIT {
      return self.to_text();
    }

    let head = self.backend.fetch_range(0, DISPLAY_EDGE as i64)?;
    let tail = self.backend.fetch_range((n - DISPLAY_EDGE) as i64, n as i64)?;
    Ok(format!("{}...({} chars omitted)...{}", head, n - 2 * DISPLAY_EDGE, tail))
  }

  /// Returns whether `needle` occurs anywhere in the text.
  ///
  /// Each shard is searched together with the `len(needle) - 1` characters
  /// before it, so a match straddling a boundary is seen in the window of
  /// the shard where it ends.
  pub fn contains(&self, needle: &str) -> Result<bool> {
    let overlap = util::char_len(needle).saturating_sub(1);
    for meta in self.backend.index().iter() {
      let start = meta.start_offset.saturating_sub(overlap);
      let window = self.backend.fetch_range(start as i64, meta.end_offset as i64)?;
      if window.contains(needle) {
        return Ok(true);
      }
    }
    Ok(false)
  }

  /// Returns the offset of the first occurrence of `needle` inside
  /// `[start, end)`, or `None`. Bounds follow slice conventions;
  /// `end = None` means the end of the text.
  pub fn find(&self, needle: &str, start: i64, end: Option<i64>) -> Result<Option<u64>> {
    let len = self.len();
    let end = end.unwrap_or(len as i64);

    if needle.is_empty() {
      // An empty needle matches at `start` itself, as long as `start` does
      // not lie past the end of the text or the search window.
      let start = if start < 0 {
        len.saturating_sub(start.unsigned_abs())
      } else {
        start as u64
      };
      let end = self.backend.index().normalize(0, end).map_or(0, |(_, e)| e);
      return Ok((start <= len && start <= end).then_some(start));
    }

    let index = self.backend.index();
    let (start, end) = match index.normalize(start, end) {
      Some(bounds) => bounds,
      None => return Ok(None),
    };

    let overlap = util::char_len(needle) - 1;
    let shard_ids = index.lookup_normalized(start, end);
    let first = shard_ids.start;

    for shard_id in shard_ids {
      let meta = crate::backend::shard_meta(index, shard_id)?;
      // The first window starts exactly at `start`; later windows reach back
      // far enough to catch a match that began in the previous shard.
      let fetch_start = if shard_id == first {
        start
      } else {
        start.max(meta.start_offset.saturating_sub(overlap))
      };
      let fetch_end = end.min(meta.end_offset);
      if fetch_end <= fetch_start {
        continue;
      }

      let window = self.backend.fetch_range(fetch_start as i64, fetch_end as i64)?;
      if let Some(pos) = window.find(needle) {
        return Ok(Some(fetch_start + util::byte_to_char_pos(&window, pos)));
      }
    }
    Ok(None)
  }

  /// Compares against a materialized string, one shard window at a time.
  pub fn try_eq_str(&self, other: &str) -> Result<bool> {
    if util::char_len(other) != self.len() {
      return Ok(false);
    }

    let mut cursor = 0usize;
    for meta in self.backend.index().shards() {
      let chunk = self
        .backend
        .fetch_range(meta.start_offset as i64, meta.end_offset as i64)?;
      if !other[cursor..].starts_with(chunk.as_str()) {
        return Ok(false);
      }
      cursor += chunk.len();
    }
    Ok(true)
  }

  /// Compares against another lazy text, using this text's shard windows for
  /// both sides. The two may be sharded differently.
  pub fn try_eq(&self, other: &LazyText<'_>) -> Result<bool> {
    if self.len() != other.len() {
      return Ok(false);
    }

    for meta in self.backend.index().shards() {
      let (start, end) = (meta.start_offset as i64, meta.end_offset as i64);
      let ours = self.backend.fetch_range(start, end)?;
      let theirs = other.backend.fetch_range(start, end)?;
      if ours != theirs {
        return Ok(false);
      }
    }
    Ok(true)
  }

  /// Iterates one-character strings in order, one backend call per
  /// character. For bulk reads use [`LazyText::to_text`] or a range instead.
  pub fn chars(&self) -> LazyChars<'a> {
    LazyChars::new(*self)
  }

  /// Always fails: content hashing would require materializing an unbounded
  /// object. Hash an explicit materialized range instead.
  pub fn try_hash(&self) -> Result<u64> {
    Err(Error::Unsupported(
      "LazyText is not hashable; hash an explicit materialized range instead".into(),
    ))
  }

  /// `self + suffix`. Materializes the whole text.
  pub fn concat(&self, suffix: &str) -> Result<String> {
    let mut text = self.to_text()?;
    text.push_str(suffix);
    Ok(text)
  }

  /// `prefix + self`. Materializes the whole text.
  pub fn prepend(&self, prefix: &str) -> Result<String> {
    let body = self.to_text()?;
    let mut text = String::with_capacity(prefix.len() + body.len());
    text.push_str(prefix);
    text.push_str(&body);
    Ok(text)
  }

  fn eq_or_warn(&self, result: Result<bool>) -> bool {
    result.unwrap_or_else(|e| {
      tracing::warn!(target: "ironshard", "Comparison failed on storage error, treating as unequal: {}", e);
      false
    })
  }
}

/// Resolves optional slice bounds against `len`, returning the concrete
/// `(start, stop)` to walk with `step`.
fn slice_indices(start: Option<i64>, stop: Option<i64>, step: i64, len: i64) -> Result<(i64, i64)> {
  if step == 0 {
    return Err(Error::Unsupported("slice step cannot be zero".into()));
  }

  let (lower, upper) = if step < 0 { (-1, len - 1) } else { (0, len) };
  let resolve = |bound: Option<i64>, default: i64| match bound {
    None => default,
    Some(b) if b < 0 => (b + len).max(lower),
    Some(b) => b.min(upper),
  };

  let start = resolve(start, if step < 0 { upper } else { lower });
  let stop = resolve(stop, if step < 0 { lower } else { upper });
  Ok((start, stop))
}

impl fmt::Display for LazyText<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.to_display_string() {
      Ok(text) => f.pad(&text),
      Err(e) => {
        tracing::warn!(target: "ironshard", "Rendering failed on storage error: {}", e);
        write!(f, "<LazyText: storage error: {}>", e)
      }
    }
  }
}

impl fmt::Debug for LazyText<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let index = self.backend.index();
    write!(
      f,
      "LazyText(length={}, shards={}, shard_size={})",
      index.total_length(),
      index.num_shards(),
      index.shard_size()
    )
  }
}

impl PartialEq<str> for LazyText<'_> {
  fn eq(&self, other: &str) -> bool {
    self.eq_or_warn(self.try_eq_str(other))
  }
}

impl PartialEq<&str> for LazyText<'_> {
  fn eq(&self, other: &&str) -> bool {
    self.eq_or_warn(self.try_eq_str(other))
  }
}

impl PartialEq<String> for LazyText<'_> {
  fn eq(&self, other: &String) -> bool {
    self.eq_or_warn(self.try_eq_str(other))
  }
}

impl<'b> PartialEq<LazyText<'b>> for LazyText<'_> {
  fn eq(&self, other: &LazyText<'b>) -> bool {
    self.eq_or_warn(self.try_eq(other))
  }
}

impl PartialEq<LazyText<'_>> for str {
  fn eq(&self, other: &LazyText<'_>) -> bool {
    other == self
  }
}

impl PartialEq<LazyText<'_>> for &str {
  fn eq(&self, other: &LazyText<'_>) -> bool {
    other == *self
  }
}

impl PartialEq<LazyText<'_>> for String {
  fn eq(&self, other: &LazyText<'_>) -> bool {
    other == self
  }
}

impl<'a> IntoIterator for LazyText<'a> {
  type Item = Result<String>;
  type IntoIter = LazyChars<'a>;

  fn into_iter(self) -> Self::IntoIter {
    LazyChars::new(self)
  }
}

impl<'a> IntoIterator for &LazyText<'a> {
  type Item = Result<String>;
  type IntoIter = LazyChars<'a>;

  fn into_iter(self) -> Self::IntoIter {
    LazyChars::new(*self)
  }
}
