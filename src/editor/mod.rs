//! Insertion sink.
//!
//! A text buffer addressed by zero-based `(line, ch)` positions, where `ch`
//! counts characters within the line. Positions past the end of a line clamp
//! to the line end; lines past the end of the buffer clamp to the buffer end.

mod buffer;

pub use buffer::{FileBuffer, MemoryBuffer};

use crate::Result;
use std::fmt;
use std::future::Future;

/// A cursor position in a text buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EditorPosition {
    /// Zero-based line.
    pub line: usize,
    /// Zero-based character within the line.
    pub ch: usize,
}

impl EditorPosition {
    /// Creates a position.
    #[must_use]
    pub const fn new(line: usize, ch: usize) -> Self {
        Self { line, ch }
    }

    /// Returns the position `chars` characters further along the same line.
    #[must_use]
    pub const fn advanced(self, chars: usize) -> Self {
        Self {
            line: self.line,
            ch: self.ch + chars,
        }
    }

    /// Converts to a byte offset into `text`, clamping out-of-range values.
    #[must_use]
    pub fn to_offset(self, text: &str) -> usize {
        let mut line_start = 0;
        for (index, line) in text.split('\n').enumerate() {
            if index == self.line {
                let visible = line.strip_suffix('\r').unwrap_or(line);
                let within = visible
                    .char_indices()
                    .nth(self.ch)
                    .map_or(visible.len(), |(offset, _)| offset);
                return line_start + within;
            }
            line_start += line.len() + 1;
        }
        text.len()
    }

    /// Converts a byte offset into a position. Offsets past the end clamp.
    #[must_use]
    pub fn from_offset(text: &str, offset: usize) -> Self {
        let mut offset = offset.min(text.len());
        while !text.is_char_boundary(offset) {
            offset -= 1;
        }
        let before = &text[..offset];
        let line = before.matches('\n').count();
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        Self {
            line,
            ch: before[line_start..].chars().count(),
        }
    }

    /// Returns the position just past the last character of `text`.
    #[must_use]
    pub fn end_of(text: &str) -> Self {
        Self::from_offset(text, text.len())
    }
}

impl fmt::Display for EditorPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.ch)
    }
}

/// An editable document.
pub trait TextBuffer: Send {
    /// Returns the current text.
    fn text(&self) -> &str;

    /// Replaces the whole text.
    fn set_text(&mut self, text: String);

    /// Persists the buffer, if it has a backing store.
    fn save(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Refreshes the text from the backing store, picking up edits made
    /// elsewhere since it was loaded.
    fn reload(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Returns the text between two positions.
    fn text_in_range(&self, from: EditorPosition, to: EditorPosition) -> &str {
        let text = self.text();
        let start = from.to_offset(text);
        let end = to.to_offset(text).max(start);
        &text[start..end]
    }

    /// Replaces `from..to` with `replacement`; with no `to`, inserts at `from`.
    fn replace_range(
        &mut self,
        replacement: &str,
        from: EditorPosition,
        to: Option<EditorPosition>,
    ) {
        let text = self.text();
        let start = from.to_offset(text);
        let end = to.map_or(start, |to| to.to_offset(text).max(start));

        let mut updated = String::with_capacity(text.len() + replacement.len());
        updated.push_str(&text[..start]);
        updated.push_str(replacement);
        updated.push_str(&text[end..]);
        self.set_text(updated);
    }

    /// Returns the end-of-document position.
    fn end_position(&self) -> EditorPosition {
        EditorPosition::end_of(self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "first line\nsecond 🔮 line\n\nlast";

    #[test]
    fn test_to_offset() {
        assert_eq!(EditorPosition::new(0, 0).to_offset(TEXT), 0);
        assert_eq!(EditorPosition::new(0, 5).to_offset(TEXT), 5);
        assert_eq!(EditorPosition::new(1, 0).to_offset(TEXT), 11);
        // The glyph is one char but four bytes.
        assert_eq!(EditorPosition::new(1, 8).to_offset(TEXT), 11 + 7 + 4);
    }

    #[test]
    fn test_to_offset_clamps() {
        assert_eq!(EditorPosition::new(0, 99).to_offset(TEXT), 10);
        assert_eq!(EditorPosition::new(2, 3).to_offset(TEXT), TEXT.find("\nlast").unwrap());
        assert_eq!(EditorPosition::new(42, 0).to_offset(TEXT), TEXT.len());
    }

    #[test]
    fn test_crlf_line_end_clamps_before_carriage_return() {
        let text = "ab\r\ncd";
        assert_eq!(EditorPosition::new(0, 9).to_offset(text), 2);
        assert_eq!(EditorPosition::new(1, 1).to_offset(text), 5);
    }

    #[test]
    fn test_from_offset_round_trip() {
        for pos in [
            EditorPosition::new(0, 3),
            EditorPosition::new(1, 8),
            EditorPosition::new(1, 9),
            EditorPosition::new(2, 0),
            EditorPosition::new(3, 4),
        ] {
            assert_eq!(EditorPosition::from_offset(TEXT, pos.to_offset(TEXT)), pos);
        }
    }

    #[test]
    fn test_end_of() {
        assert_eq!(EditorPosition::end_of(TEXT), EditorPosition::new(3, 4));
        assert_eq!(EditorPosition::end_of(""), EditorPosition::new(0, 0));
        assert_eq!(EditorPosition::end_of("x\n"), EditorPosition::new(1, 0));
    }

    #[test]
    fn test_replace_range_and_insert() {
        let mut buffer = MemoryBuffer::new("hello world");
        buffer.replace_range("🔮", EditorPosition::new(0, 6), None);
        assert_eq!(buffer.text(), "hello 🔮world");

        let from = EditorPosition::new(0, 6);
        assert_eq!(buffer.text_in_range(from, from.advanced(1)), "🔮");
        buffer.replace_range("brave ", from, Some(from.advanced(1)));
        assert_eq!(buffer.text(), "hello brave world");
    }

    #[test]
    fn test_display() {
        assert_eq!(EditorPosition::new(3, 7).to_string(), "3:7");
    }
}
