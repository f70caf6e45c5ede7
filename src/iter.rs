use crate::error::Result;
use crate::text::LazyText;

/// Iterates the characters of a [`LazyText`] as one-character strings.
///
/// Each step is a separate single-index fetch through the backend. Cheap
/// with a warm shard cache, but not meant for scanning whole objects.
pub struct LazyChars<'a> {
  text: LazyText<'a>,
  /// The next position to yield.
  next_pos: u64,
  len: u64,
}

impl<'a> LazyChars<'a> {
  pub(crate) fn new(text: LazyText<'a>) -> Self {
    Self {
      len: text.len(),
      text,
      next_pos: 0,
    }
  }
}

impl Iterator for LazyChars<'_> {
  type Item = Result<String>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.next_pos >= self.len {
      return None;
    }
    let item = self.text.at(self.next_pos as i64);
    self.next_pos += 1;
    Some(item)
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    let remaining = (self.len - self.next_pos) as usize;
    (remaining, Some(remaining))
  }
}

impl ExactSizeIterator for LazyChars<'_> {}
