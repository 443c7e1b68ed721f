use std::fmt;

use super::line_tree::DocumentLine;
use crate::error::EditError;

/// Read-only access to a document, as handed to trackers and renderers.
pub trait DocumentView {
    /// Document length in bytes.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn line_count(&self) -> usize;

    fn text_range(&self, offset: usize, length: usize) -> Result<String, EditError>;

    /// 1-based.
    fn line_by_number(&self, line_number: usize) -> Result<DocumentLine, EditError>;

    fn line_by_offset(&self, offset: usize) -> Result<DocumentLine, EditError>;
}

/// A line/column position. Both are 1-based; the column counts bytes from
/// the start of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextLocation {
    pub line: usize,
    pub column: usize,
}

impl TextLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for TextLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.line, self.column)
    }
}
