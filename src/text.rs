//! Immutable text lines with cheap slicing
//!
//! A `Text` is a single line of characters, NFC-normalized at construction.
//! Slices share the underlying character buffer, so window views over a
//! model never copy line content.

pub mod model;

use std::fmt;
use std::sync::Arc;

use unicode_normalization::UnicodeNormalization;

/// A single normalized character; lines are sequences of these
pub type TextChar = char;

/// One line of normalized text
///
/// Holds a shared character buffer plus a `[start, end)` range into it.
/// Slicing produces another view over the same buffer.
#[derive(Clone)]
pub struct Text {
    chars: Arc<Vec<char>>,
    start: usize,
    end: usize,
}

impl Text {
    /// Build a line from a raw string, applying NFC normalization
    ///
    /// The input must not contain line breaks; use [`split_lines`] to break
    /// a document into lines first.
    pub fn new(line: &str) -> Self {
        debug_assert!(
            !line.contains(|c| c == '\n' || c == '\r'),
            "Text::new given embedded line break"
        );
        let chars: Vec<char> = line.nfc().collect();
        let end = chars.len();
        Self {
            chars: Arc::new(chars),
            start: 0,
            end,
        }
    }

    /// An empty line
    pub fn empty() -> Self {
        Self {
            chars: Arc::new(Vec::new()),
            start: 0,
            end: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The character at `col`; panics when `col` is out of range
    pub fn char_at(&self, col: usize) -> TextChar {
        assert!(
            col < self.len(),
            "column {} out of range for line of length {}",
            col,
            self.len()
        );
        self.chars[self.start + col]
    }

    /// A sub-line covering `[from, to)` of this line, sharing the buffer
    pub fn slice(&self, from: usize, to: usize) -> Text {
        assert!(
            from <= to && to <= self.len(),
            "invalid slice {}..{} of line of length {}",
            from,
            to,
            self.len()
        );
        Text {
            chars: Arc::clone(&self.chars),
            start: self.start + from,
            end: self.start + to,
        }
    }

    /// The suffix of this line starting at `from`
    pub fn slice_from(&self, from: usize) -> Text {
        self.slice(from, self.len())
    }

    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.chars[self.start..self.end].iter().copied()
    }

    pub fn as_string(&self) -> String {
        self.chars().collect()
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.chars() {
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Text({:?})", self.as_string())
    }
}

impl PartialEq for Text {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.chars().eq(other.chars())
    }
}

impl Eq for Text {}

impl From<&str> for Text {
    fn from(line: &str) -> Self {
        Text::new(line)
    }
}

/// Split a document into lines on `\r\n`, `\n`, or `\r`
///
/// A document with n line breaks yields n + 1 lines; the empty document is
/// a single empty line. Line break characters are not part of any line.
pub fn split_lines(source: &str) -> Vec<Text> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut iter = source.chars().peekable();
    while let Some(c) = iter.next() {
        match c {
            '\n' => {
                lines.push(Text::new(&current));
                current.clear();
            }
            '\r' => {
                if iter.peek() == Some(&'\n') {
                    iter.next();
                }
                lines.push(Text::new(&current));
                current.clear();
            }
            _ => current.push(c),
        }
    }
    lines.push(Text::new(&current));
    lines
}
