use std::borrow::Cow;
use std::ops::Range;

use xi_rope::Rope;
use xi_rope::delta::Builder;

/// The character storage behind a document.
///
/// A thin wrapper around an `xi_rope::Rope`: edits are compiled into a
/// `Delta` and applied, so insertion, removal and slicing all cost O(log n).
/// Offsets are UTF-8 byte offsets. The wrapper does no validation of its own;
/// callers check ranges and character boundaries first.
#[derive(Debug, Clone, Default)]
pub(crate) struct TextBuffer {
    rope: Rope,
}

impl TextBuffer {
    pub(crate) fn new(text: &str) -> Self {
        Self {
            rope: Rope::from(text),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.rope.len()
    }

    pub(crate) fn insert(&mut self, offset: usize, text: &str) {
        if text.is_empty() {
            return;
        }
        let mut builder = Builder::new(self.rope.len());
        builder.replace(offset..offset, Rope::from(text));
        self.rope = builder.build().apply(&self.rope);
    }

    pub(crate) fn remove(&mut self, offset: usize, length: usize) {
        if length == 0 {
            return;
        }
        let mut builder = Builder::new(self.rope.len());
        builder.delete(offset..offset + length);
        self.rope = builder.build().apply(&self.rope);
    }

    /// Replace the whole content in one step.
    pub(crate) fn set_text(&mut self, text: &str) {
        self.rope = Rope::from(text);
    }

    pub(crate) fn slice(&self, range: Range<usize>) -> Cow<'_, str> {
        self.rope.slice_to_cow(range)
    }

    pub(crate) fn text(&self, offset: usize, length: usize) -> String {
        self.slice(offset..offset + length).into_owned()
    }

    /// The byte at `offset`, or `None` past the end.
    pub(crate) fn byte_at(&self, offset: usize) -> Option<u8> {
        (offset < self.rope.len()).then(|| self.rope.byte_at(offset))
    }

    /// True at both ends of the buffer and between two encoded characters.
    pub(crate) fn is_char_boundary(&self, offset: usize) -> bool {
        match self.byte_at(offset) {
            Some(byte) => !is_continuation_byte(byte),
            None => offset == self.rope.len(),
        }
    }

    /// The character starting at `offset`, if one does.
    pub(crate) fn char_at(&self, offset: usize) -> Option<char> {
        let first = self.byte_at(offset)?;
        if is_continuation_byte(first) {
            return None;
        }
        let width = utf8_width(first);
        self.slice(offset..offset + width).chars().next()
    }
}

impl std::fmt::Display for TextBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.rope, f)
    }
}

fn is_continuation_byte(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}

fn utf8_width(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        _ => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_remove() {
        let mut buffer = TextBuffer::new("Hello World");
        buffer.insert(5, ",");
        assert_eq!(buffer.to_string(), "Hello, World");

        buffer.remove(0, 7);
        assert_eq!(buffer.to_string(), "World");
        assert_eq!(buffer.len(), 5);
    }

    #[test]
    fn test_empty_edits_are_ignored() {
        let mut buffer = TextBuffer::new("abc");
        buffer.insert(1, "");
        buffer.remove(2, 0);
        assert_eq!(buffer.to_string(), "abc");
    }

    #[test]
    fn test_text_reads_ranges() {
        let buffer = TextBuffer::new("line one\nline two");
        assert_eq!(buffer.text(5, 3), "one");
        assert_eq!(buffer.text(9, 0), "");
        assert_eq!(buffer.slice(9..17), "line two");
    }

    #[test]
    fn test_byte_at_and_boundaries() {
        let buffer = TextBuffer::new("a\u{e9}b");
        assert_eq!(buffer.byte_at(0), Some(b'a'));
        assert_eq!(buffer.byte_at(4), None);
        assert!(buffer.is_char_boundary(0));
        assert!(buffer.is_char_boundary(1));
        assert!(!buffer.is_char_boundary(2));
        assert!(buffer.is_char_boundary(3));
        assert!(buffer.is_char_boundary(4));
        assert!(!buffer.is_char_boundary(5));
    }

    #[test]
    fn test_char_at_decodes_multibyte() {
        let buffer = TextBuffer::new("x\u{1F980}y");
        assert_eq!(buffer.char_at(0), Some('x'));
        assert_eq!(buffer.char_at(1), Some('\u{1F980}'));
        assert_eq!(buffer.char_at(2), None);
        assert_eq!(buffer.char_at(5), Some('y'));
        assert_eq!(buffer.char_at(6), None);
    }

    #[test]
    fn test_set_text_replaces_everything() {
        let mut buffer = TextBuffer::new("old");
        buffer.set_text("brand new");
        assert_eq!(buffer.to_string(), "brand new");
    }
}
