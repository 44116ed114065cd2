//! Source location tracking for error reporting.
//!
//! Expressions are short and usually single line, so a [`Span`] is a byte
//! range into the expression text rather than a line/column pair. The
//! column shown to users is derived from the offset.

use std::fmt;

/// A byte range of expression text.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Byte offset of the first character.
    pub offset: u32,
    /// Length in bytes.
    pub len: u32,
}

impl Span {
    /// Create a span from an offset and a length.
    #[inline]
    pub fn new(offset: u32, len: u32) -> Self {
        Self { offset, len }
    }

    /// Create a zero-length span at an offset.
    #[inline]
    pub fn point(offset: u32) -> Self {
        Self { offset, len: 0 }
    }

    /// Whether this span is empty (zero length).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The length of this span in bytes.
    #[inline]
    pub fn len(&self) -> u32 {
        self.len
    }

    /// One past the last byte covered by this span.
    #[inline]
    pub fn end(&self) -> u32 {
        self.offset + self.len
    }

    /// 1-based column of the first character.
    #[inline]
    pub fn column(&self) -> u32 {
        self.offset + 1
    }

    /// Smallest span covering both `self` and `other`, in either order.
    #[inline]
    pub fn merge(self, other: Span) -> Span {
        let start = self.offset.min(other.offset);
        let end = self.end().max(other.end());
        Span {
            offset: start,
            len: end - start,
        }
    }

    /// Slice the covered text out of `source`.
    ///
    /// Returns an empty string when the span lies outside the source.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source
            .get(self.offset as usize..self.end() as usize)
            .unwrap_or("")
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.offset, self.end())
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "column {}", self.column())
    }
}
