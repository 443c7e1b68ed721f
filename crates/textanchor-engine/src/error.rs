/// Errors reported by [`Document`](crate::editing::Document) and its read-only views.
///
/// Every call that returns one of these leaves the document exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("Offset {offset} is outside the document (length {document_length})")]
    OffsetOutOfRange {
        offset: usize,
        document_length: usize,
    },
    #[error("Range {offset}+{length} extends past the end of the document (length {document_length})")]
    RangeOutOfBounds {
        offset: usize,
        length: usize,
        document_length: usize,
    },
    #[error("Offset {0} does not fall on a UTF-8 character boundary")]
    NotCharBoundary(usize),
    #[error("Line {line} does not exist (document has {line_count} lines)")]
    LineOutOfRange { line: usize, line_count: usize },
    #[error("Document content is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error("Text at offset {offset} does not match the change being applied")]
    ChangeMismatch { offset: usize },
    #[error("A previous edit was interrupted; the document no longer accepts changes")]
    EditInterrupted,
    #[error("end_update called without a matching begin_update")]
    NoUpdateInProgress,
}
