use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::anchors::{Anchor, AnchorTree, DEFAULT_SWEEP_THRESHOLD};
use super::change::{DocumentChange, EditMode};
use super::change_offset::AnchorMovement;
use super::line_manager::LineManager;
use super::line_tree::{DocumentLine, LineId, LineTree};
use super::listener::LineTracker;
use super::text_buffer::TextBuffer;
use super::view::{DocumentView, TextLocation};
use crate::error::EditError;

/// Tuning knobs for a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentOptions {
    /// Anchor count below which dropped anchors are only reclaimed when an
    /// edit touches them. Past it, the anchor index sweeps itself every time
    /// its node count doubles.
    pub anchor_sweep_threshold: usize,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            anchor_sweep_threshold: DEFAULT_SWEEP_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditState {
    Idle,
    Applying,
}

/// Text plus the two indexes that must agree with it after every edit.
///
/// ## Structure
/// - **Buffer**: an `xi_rope::Rope`, edited through deltas
/// - **Line index**: line number and offset lookups in O(log n), with stable
///   [`LineId`]s
/// - **Anchor index**: caller-held [`Anchor`]s that move with the text
///
/// ## Edit pipeline
/// Every mutation funnels through [`Document::replace`]:
///
/// 1. Validate the range: out-of-range or mid-character offsets fail before
///    anything changes
/// 2. Remove the old text from the buffer, then from the line index
/// 3. Insert the new text into the buffer, then into the line index
/// 4. Move anchors through the edit's [`ChangeDescriptor`](super::ChangeDescriptor)s
/// 5. Bump the version and report the [`DocumentChange`] to trackers, now or
///    when the outermost update batch ends
///
/// Replacing the whole text skips step 2 and 3 in favour of a full rescan.
///
/// ```rust
/// # use textanchor_engine::editing::{AnchorMovement, Document, EditMode};
/// let mut doc = Document::from_text("hello\nworld");
/// let anchor = doc
///     .create_anchor_with(6, AnchorMovement::AfterInsertion, false)
///     .unwrap();
///
/// doc.insert(6, "big ").unwrap();
/// assert_eq!(doc.text(), "hello\nbig world");
/// assert_eq!(anchor.offset(), 10);
/// assert_eq!(doc.line_by_offset(anchor.offset()).unwrap().line_number, 2);
///
/// doc.replace(0, 5, "HELLO", EditMode::ReplaceCharacters).unwrap();
/// assert_eq!(doc.line_count(), 2);
/// ```
pub struct Document {
    buffer: TextBuffer,
    lines: LineTree,
    anchors: Rc<RefCell<AnchorTree>>,
    trackers: Vec<Rc<RefCell<dyn LineTracker>>>,
    update_depth: usize,
    pending: Vec<DocumentChange>,
    state: EditState,
    version: u64,
}

impl Document {
    pub fn new() -> Self {
        Self::with_options("", DocumentOptions::default())
    }

    pub fn from_text(text: &str) -> Self {
        Self::with_options(text, DocumentOptions::default())
    }

    /// Create a document from raw bytes, which must be valid UTF-8.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EditError> {
        let text = std::str::from_utf8(bytes)?;
        Ok(Self::from_text(text))
    }

    pub fn with_options(text: &str, options: DocumentOptions) -> Self {
        Self {
            buffer: TextBuffer::new(text),
            lines: LineTree::new(text),
            anchors: Rc::new(RefCell::new(AnchorTree::new(
                options.anchor_sweep_threshold,
            ))),
            trackers: Vec::new(),
            update_depth: 0,
            pending: Vec::new(),
            state: EditState::Idle,
            version: 0,
        }
    }

    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    /// The content as bytes, exactly as loaded or edited.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.text().into_bytes()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.len() == 0
    }

    /// Incremented once per committed change.
    pub fn version(&self) -> u64 {
        self.version
    }

    // ============ Edits ============

    pub fn insert(&mut self, offset: usize, text: &str) -> Result<(), EditError> {
        self.replace(offset, 0, text, EditMode::Normal)
    }

    pub fn remove(&mut self, offset: usize, length: usize) -> Result<(), EditError> {
        self.replace(offset, length, "", EditMode::Normal)
    }

    /// Replace the whole content. Takes the rebuild path: trackers receive
    /// [`LineTracker::rebuild`] and every old [`LineId`] stops resolving.
    pub fn set_text(&mut self, text: &str) -> Result<(), EditError> {
        self.replace(0, self.len(), text, EditMode::Normal)
    }

    /// Replay a change reported by this or another document. The text it
    /// removes must match what is at its offset.
    pub fn apply_change(&mut self, change: &DocumentChange) -> Result<(), EditError> {
        let current = self.text_range(change.offset(), change.removal_length())?;
        if current != change.removed_text() {
            return Err(EditError::ChangeMismatch {
                offset: change.offset(),
            });
        }
        self.replace(
            change.offset(),
            change.removal_length(),
            change.inserted_text(),
            change.mode(),
        )
    }

    /// Replace `length` bytes at `offset` with `text`.
    ///
    /// A zero-length replacement with empty text is a no-op: nothing is
    /// reported and the version does not change.
    pub fn replace(
        &mut self,
        offset: usize,
        length: usize,
        text: &str,
        mode: EditMode,
    ) -> Result<(), EditError> {
        self.ensure_ready()?;
        self.check_range(offset, length)?;
        if length == 0 && text.is_empty() {
            return Ok(());
        }

        let change = DocumentChange::new(offset, self.buffer.text(offset, length), text, mode);
        self.state = EditState::Applying;

        if offset == 0 && length == self.buffer.len() {
            self.buffer.set_text(text);
            self.lines.rebuild(text);
            log::debug!(
                "document text replaced: {} bytes, {} lines",
                text.len(),
                self.lines.line_count()
            );
            for tracker in &self.trackers {
                tracker.borrow_mut().rebuild();
            }
        } else {
            self.buffer.remove(offset, length);
            LineManager::new(&mut self.lines, &self.buffer, &self.trackers).remove(offset, length);
            self.buffer.insert(offset, text);
            LineManager::new(&mut self.lines, &self.buffer, &self.trackers).insert(offset, text);
        }
        debug_assert_eq!(self.lines.total_length(), self.buffer.len());

        {
            let mut anchors = self.anchors.borrow_mut();
            for descriptor in change.descriptors() {
                anchors.apply_change(descriptor);
            }
        }
        self.version += 1;

        if self.update_depth > 0 {
            self.pending.push(change);
        } else {
            self.dispatch(&[change]);
        }
        self.state = EditState::Idle;
        Ok(())
    }

    // ============ Update batches ============

    /// Start a batch. `after_change` is held back until the matching
    /// outermost [`Document::end_update`]. Batches nest.
    pub fn begin_update(&mut self) {
        self.update_depth += 1;
    }

    /// End a batch, delivering every change made since the outermost
    /// `begin_update` in a single `after_change` call.
    pub fn end_update(&mut self) -> Result<(), EditError> {
        if self.update_depth == 0 {
            return Err(EditError::NoUpdateInProgress);
        }
        self.update_depth -= 1;
        if self.update_depth == 0 && !self.pending.is_empty() {
            let changes = std::mem::take(&mut self.pending);
            self.state = EditState::Applying;
            self.dispatch(&changes);
            self.state = EditState::Idle;
        }
        Ok(())
    }

    pub fn is_updating(&self) -> bool {
        self.update_depth > 0
    }

    /// Run `edits` inside one update batch.
    pub fn run_update<R>(
        &mut self,
        edits: impl FnOnce(&mut Self) -> Result<R, EditError>,
    ) -> Result<R, EditError> {
        self.begin_update();
        let result = edits(self);
        self.end_update()?;
        result
    }

    // ============ Anchors ============

    /// Create an anchor with default movement that is deleted when the text
    /// around it is removed.
    pub fn create_anchor(&mut self, offset: usize) -> Result<Anchor, EditError> {
        self.create_anchor_with(offset, AnchorMovement::Default, false)
    }

    pub fn create_anchor_with(
        &mut self,
        offset: usize,
        movement: AnchorMovement,
        survives_deletion: bool,
    ) -> Result<Anchor, EditError> {
        self.ensure_ready()?;
        self.check_offset(offset)?;
        Ok(AnchorTree::create(
            &self.anchors,
            offset,
            movement,
            survives_deletion,
        ))
    }

    pub fn anchor_location(&self, anchor: &Anchor) -> Result<TextLocation, EditError> {
        self.location_of(anchor.offset())
    }

    /// Reclaim every dropped anchor now. Returns how many were reclaimed.
    pub fn sweep_anchors(&mut self) -> usize {
        self.anchors.borrow_mut().sweep()
    }

    /// Anchors tracked by the index, including dropped ones not yet reclaimed.
    pub fn anchor_count(&self) -> usize {
        self.anchors.borrow().node_count()
    }

    // ============ Lines and offsets ============

    pub fn line_count(&self) -> usize {
        self.lines.line_count()
    }

    /// 1-based.
    pub fn line_by_number(&self, line_number: usize) -> Result<DocumentLine, EditError> {
        self.lines
            .node_by_number(line_number)
            .map(|node| self.lines.line(node))
            .ok_or(EditError::LineOutOfRange {
                line: line_number,
                line_count: self.line_count(),
            })
    }

    /// The line containing `offset`. An offset between a line's content and
    /// its delimiter, or inside a `\r\n`, belongs to that line.
    pub fn line_by_offset(&self, offset: usize) -> Result<DocumentLine, EditError> {
        self.check_offset(offset)?;
        Ok(self.lines.line(self.lines.node_at_offset(offset)))
    }

    /// `None` once the line has been merged away or the text replaced.
    pub fn line_by_id(&self, id: LineId) -> Option<DocumentLine> {
        self.lines.node(id).map(|node| self.lines.line(node))
    }

    pub fn is_live(&self, id: LineId) -> bool {
        self.lines.node(id).is_some()
    }

    pub fn next_line(&self, id: LineId) -> Option<DocumentLine> {
        let node = self.lines.node(id)?;
        self.lines.next_node(node).map(|next| self.lines.line(next))
    }

    pub fn previous_line(&self, id: LineId) -> Option<DocumentLine> {
        let node = self.lines.node(id)?;
        self.lines
            .previous_node(node)
            .map(|previous| self.lines.line(previous))
    }

    /// Every line, first to last.
    pub fn lines(&self) -> impl Iterator<Item = DocumentLine> + '_ {
        (1..=self.line_count()).filter_map(|number| self.line_by_number(number).ok())
    }

    /// Content of a line, without its delimiter.
    pub fn line_text(&self, line: &DocumentLine) -> Result<String, EditError> {
        self.text_range(line.offset, line.length)
    }

    pub fn text_range(&self, offset: usize, length: usize) -> Result<String, EditError> {
        self.check_range(offset, length)?;
        Ok(self.buffer.text(offset, length))
    }

    pub fn char_at(&self, offset: usize) -> Result<char, EditError> {
        self.check_offset(offset)?;
        self.buffer
            .char_at(offset)
            .ok_or(EditError::OffsetOutOfRange {
                offset,
                document_length: self.len(),
            })
    }

    pub fn location_of(&self, offset: usize) -> Result<TextLocation, EditError> {
        let line = self.line_by_offset(offset)?;
        Ok(TextLocation::new(line.line_number, offset - line.offset + 1))
    }

    /// Offset of a location. Columns past the end of the line clamp to the
    /// line end and columns inside a character snap to its start.
    pub fn offset_of(&self, location: TextLocation) -> Result<usize, EditError> {
        let line = self.line_by_number(location.line)?;
        let column = location.column.saturating_sub(1).min(line.length);
        let mut offset = line.offset + column;
        while !self.buffer.is_char_boundary(offset) {
            offset -= 1;
        }
        Ok(offset)
    }

    // ============ Trackers ============

    /// Register a tracker. Trackers are called in registration order.
    pub fn add_line_tracker(&mut self, tracker: Rc<RefCell<dyn LineTracker>>) {
        self.trackers.push(tracker);
    }

    /// Unregister a tracker added earlier. Returns whether it was found.
    pub fn remove_line_tracker(&mut self, tracker: &Rc<RefCell<dyn LineTracker>>) -> bool {
        let before = self.trackers.len();
        self.trackers
            .retain(|registered| !Rc::ptr_eq(registered, tracker));
        self.trackers.len() != before
    }

    // ============ Internals ============

    fn ensure_ready(&self) -> Result<(), EditError> {
        match self.state {
            EditState::Idle => Ok(()),
            EditState::Applying => {
                log::warn!("rejecting call on a document whose last edit was interrupted");
                Err(EditError::EditInterrupted)
            }
        }
    }

    fn check_offset(&self, offset: usize) -> Result<(), EditError> {
        let document_length = self.len();
        if offset > document_length {
            return Err(EditError::OffsetOutOfRange {
                offset,
                document_length,
            });
        }
        if !self.buffer.is_char_boundary(offset) {
            return Err(EditError::NotCharBoundary(offset));
        }
        Ok(())
    }

    fn check_range(&self, offset: usize, length: usize) -> Result<(), EditError> {
        self.check_offset(offset)?;
        let document_length = self.len();
        let end = offset
            .checked_add(length)
            .filter(|&end| end <= document_length)
            .ok_or(EditError::RangeOutOfBounds {
                offset,
                length,
                document_length,
            })?;
        if !self.buffer.is_char_boundary(end) {
            return Err(EditError::NotCharBoundary(end));
        }
        Ok(())
    }

    fn dispatch(&self, changes: &[DocumentChange]) {
        for tracker in &self.trackers {
            tracker.borrow_mut().after_change(self, changes);
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentView for Document {
    fn len(&self) -> usize {
        Document::len(self)
    }

    fn line_count(&self) -> usize {
        Document::line_count(self)
    }

    fn text_range(&self, offset: usize, length: usize) -> Result<String, EditError> {
        Document::text_range(self, offset, length)
    }

    fn line_by_number(&self, line_number: usize) -> Result<DocumentLine, EditError> {
        Document::line_by_number(self, line_number)
    }

    fn line_by_offset(&self, offset: usize) -> Result<DocumentLine, EditError> {
        Document::line_by_offset(self, offset)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("len", &self.len())
            .field("lines", &self.line_count())
            .field("anchors", &self.anchor_count())
            .field("trackers", &self.trackers.len())
            .field("version", &self.version)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use AnchorMovement::{AfterInsertion, BeforeInsertion};

    fn outline(doc: &Document) -> String {
        doc.lines()
            .map(|line| {
                format!(
                    "{}: @{} {:?} +{}",
                    line.line_number,
                    line.offset,
                    doc.line_text(&line).unwrap(),
                    line.delimiter_length
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    // ============ Basic document tests ============

    #[test]
    fn test_document_from_bytes_round_trip() {
        let text = "first\r\nsecond\nthird";
        let doc = Document::from_bytes(text.as_bytes()).expect("Should create document");
        assert_eq!(doc.to_bytes(), text.as_bytes());
        assert_eq!(doc.version(), 0);
        assert_eq!(doc.line_count(), 3);
    }

    #[test]
    fn test_document_from_bytes_invalid_utf8() {
        let result = Document::from_bytes(&[0xFF, 0xFE, 0xFD]);
        assert!(matches!(result, Err(EditError::InvalidUtf8(_))));
    }

    #[test]
    fn test_empty_document_has_one_line() {
        let doc = Document::new();
        assert!(doc.is_empty());
        assert_eq!(doc.line_count(), 1);
        let line = doc.line_by_number(1).unwrap();
        assert_eq!((line.offset, line.length, line.delimiter_length), (0, 0, 0));
    }

    #[test]
    fn test_edits_keep_lines_in_sync() {
        let mut doc = Document::from_text("alpha\nbeta\ngamma");
        doc.insert(5, " one").unwrap();
        doc.remove(10, 5).unwrap();
        doc.replace(0, 0, "# ", EditMode::Normal).unwrap();
        doc.insert(doc.len(), "\r\n").unwrap();

        assert_snapshot!(outline(&doc), @r###"
        1: @0 "# alpha one" +1
        2: @12 "gamma" +2
        3: @19 "" +0
        "###);
        assert_eq!(doc.version(), 4);
    }

    #[test]
    fn test_edits_beside_cr_before_crlf() {
        let mut doc = Document::from_text("a\r\r\nb");
        doc.remove(2, 1).unwrap();
        assert_eq!(outline(&doc), "1: @0 \"a\" +2\n2: @3 \"b\" +0");

        let mut doc = Document::from_text("a\r\r\nb");
        doc.insert(2, "\n").unwrap();
        assert_eq!(doc.line_count(), 3);
        assert_eq!(
            doc.lines().map(|line| line.delimiter_length).collect::<Vec<_>>(),
            vec![2, 2, 0]
        );
    }

    // ============ Validation ============

    #[rstest]
    #[case::offset_past_end(7, 0, EditError::OffsetOutOfRange { offset: 7, document_length: 6 })]
    #[case::range_past_end(4, 3, EditError::RangeOutOfBounds { offset: 4, length: 3, document_length: 6 })]
    #[case::mid_char_start(2, 1, EditError::NotCharBoundary(2))]
    #[case::mid_char_end(0, 2, EditError::NotCharBoundary(2))]
    fn test_invalid_ranges_are_rejected(
        #[case] offset: usize,
        #[case] length: usize,
        #[case] expected: EditError,
    ) {
        // "aéb" plus two bytes: a(0) é(1..3) b(3) c(4) d(5)
        let mut doc = Document::from_text("a\u{e9}bcd");
        let anchor = doc.create_anchor(4).unwrap();

        assert_eq!(doc.replace(offset, length, "x", EditMode::Normal), Err(expected));
        assert_eq!(doc.text(), "a\u{e9}bcd");
        assert_eq!(doc.version(), 0);
        assert_eq!(anchor.offset(), 4);
    }

    #[test]
    fn test_create_anchor_out_of_range() {
        let mut doc = Document::from_text("abc");
        assert_eq!(
            doc.create_anchor(4),
            Err(EditError::OffsetOutOfRange {
                offset: 4,
                document_length: 3
            })
        );
        assert_eq!(doc.create_anchor(3).map(|anchor| anchor.offset()), Ok(3));
    }

    #[test]
    fn test_zero_length_insert_is_a_no_op() {
        let mut doc = Document::from_text("abc");
        let anchor = doc.create_anchor_with(1, AfterInsertion, false).unwrap();
        doc.insert(1, "").unwrap();
        assert_eq!(anchor.offset(), 1);
        assert_eq!(doc.version(), 0);
    }

    // ============ Anchors through edits ============

    #[test]
    fn test_replace_normal_mode_scenario() {
        let mut doc = Document::from_text("abcd");
        let plain = doc.create_anchor(1).unwrap();
        let doomed = doc.create_anchor(2).unwrap();
        let before = doc.create_anchor_with(2, BeforeInsertion, true).unwrap();
        let after = doc.create_anchor_with(2, AfterInsertion, true).unwrap();
        let tail = doc.create_anchor(3).unwrap();

        doc.replace(1, 2, "BxC", EditMode::Normal).unwrap();

        assert_eq!(doc.text(), "aBxCd");
        assert_eq!(plain.offset(), 1);
        assert!(doomed.is_deleted());
        assert_eq!(before.offset(), 1);
        assert_eq!(after.offset(), 4);
        assert_eq!(tail.offset(), 4);
    }

    #[test]
    fn test_replace_characters_scenario() {
        let mut doc = Document::from_text("a    b");
        let first = doc.create_anchor_with(1, AfterInsertion, false).unwrap();
        let last = doc.create_anchor(5).unwrap();
        let second = doc.create_anchor(2).unwrap();
        let third = doc.create_anchor(3).unwrap();

        doc.replace(1, 4, "\t", EditMode::ReplaceCharacters).unwrap();

        assert_eq!(doc.text(), "a\tb");
        assert_eq!(first.offset(), 1);
        assert_eq!(last.offset(), 2);
        assert_eq!(second.offset(), 2);
        assert_eq!(third.offset(), 2);
        assert!(!third.is_deleted());
    }

    #[rstest]
    #[case::normal(EditMode::Normal, 1)]
    #[case::remove_then_insert(EditMode::RemoveThenInsert, 0)]
    fn test_reindent_modes(#[case] mode: EditMode, #[case] expected: usize) {
        let mut doc = Document::from_text("    code");
        let inside = doc.create_anchor_with(2, AfterInsertion, true).unwrap();
        let at_start = doc.create_anchor_with(0, AfterInsertion, false).unwrap();

        doc.replace(0, 4, "\t", mode).unwrap();

        assert_eq!(doc.text(), "\tcode");
        assert_eq!(inside.offset(), expected);
        assert_eq!(at_start.offset(), 0);
    }

    #[test]
    fn test_set_text_rebuilds_and_moves_anchors() {
        let mut doc = Document::from_text("one\ntwo");
        let start = doc.create_anchor(0).unwrap();
        let middle = doc.create_anchor(4).unwrap();
        let end = doc.create_anchor_with(7, AfterInsertion, false).unwrap();
        let old_line = doc.line_by_number(2).unwrap().id;

        doc.set_text("a\nb\nc\n").unwrap();

        assert_eq!(doc.line_count(), 4);
        assert!(!doc.is_live(old_line));
        assert_eq!(start.offset(), 0);
        assert!(middle.is_deleted());
        assert_eq!(end.offset(), 6);
    }

    #[test]
    fn test_anchor_location() {
        let mut doc = Document::from_text("ab\ncd\nef");
        let anchor = doc.create_anchor(4).unwrap();
        assert_eq!(doc.anchor_location(&anchor), Ok(TextLocation::new(2, 2)));
        doc.insert(0, "\n").unwrap();
        assert_eq!(doc.anchor_location(&anchor), Ok(TextLocation::new(3, 2)));
    }

    #[test]
    fn test_dropping_document_deletes_anchors() {
        let mut doc = Document::from_text("hello");
        let anchor = doc.create_anchor(3).unwrap();
        drop(doc);
        assert!(anchor.is_deleted());
        assert_eq!(anchor.offset(), 3);
    }

    // ============ Locations ============

    #[rstest]
    #[case(0, 1, 1)]
    #[case(2, 1, 3)]
    #[case(3, 2, 1)]
    #[case::inside_crlf(6, 2, 4)]
    #[case(7, 3, 1)]
    #[case::document_end(9, 3, 3)]
    fn test_location_of(#[case] offset: usize, #[case] line: usize, #[case] column: usize) {
        let doc = Document::from_text("ab\ncd\r\nef");
        assert_eq!(doc.location_of(offset), Ok(TextLocation::new(line, column)));
    }

    #[rstest]
    #[case(TextLocation::new(2, 1), 3)]
    #[case(TextLocation::new(2, 3), 5)]
    #[case(TextLocation::new(2, 40), 5)]
    #[case(TextLocation::new(1, 0), 0)]
    #[case(TextLocation::new(3, 3), 9)]
    fn test_offset_of_clamps_column(#[case] location: TextLocation, #[case] expected: usize) {
        let doc = Document::from_text("ab\ncd\r\nef");
        assert_eq!(doc.offset_of(location), Ok(expected));
    }

    #[test]
    fn test_offset_of_snaps_to_char_start() {
        let doc = Document::from_text("x\u{1F980}");
        assert_eq!(doc.offset_of(TextLocation::new(1, 3)), Ok(1));
        assert_eq!(
            doc.offset_of(TextLocation::new(2, 1)),
            Err(EditError::LineOutOfRange {
                line: 2,
                line_count: 1
            })
        );
    }

    #[test]
    fn test_char_at() {
        let doc = Document::from_text("a\u{e9}");
        assert_eq!(doc.char_at(1), Ok('\u{e9}'));
        assert_eq!(doc.char_at(2), Err(EditError::NotCharBoundary(2)));
        assert!(doc.char_at(3).is_err());
    }

    #[test]
    fn test_line_navigation_by_id() {
        let doc = Document::from_text("a\nb\nc");
        let middle = doc.line_by_number(2).unwrap();
        assert_eq!(doc.next_line(middle.id).map(|line| line.line_number), Some(3));
        assert_eq!(doc.previous_line(middle.id).map(|line| line.line_number), Some(1));
        assert_eq!(doc.line_by_id(middle.id), Some(middle));
    }

    #[test]
    fn test_line_ids_survive_unrelated_edits() {
        let mut doc = Document::from_text("keep\nme\nsafe");
        let id = doc.line_by_number(3).unwrap().id;
        doc.insert(0, "new\n").unwrap();
        doc.remove(4, 5).unwrap();
        let line = doc.line_by_id(id).expect("Should still resolve");
        assert_eq!(doc.line_text(&line).unwrap(), "safe");
        assert_eq!(line.line_number, 3);
    }

    // ============ Batches ============

    #[test]
    fn test_end_update_without_begin() {
        let mut doc = Document::new();
        assert_eq!(doc.end_update(), Err(EditError::NoUpdateInProgress));
    }

    #[test]
    fn test_run_update_returns_closure_result() {
        let mut doc = Document::from_text("x");
        let len = doc
            .run_update(|doc| {
                doc.insert(1, "yz")?;
                Ok(doc.len())
            })
            .unwrap();
        assert_eq!(len, 3);
        assert!(!doc.is_updating());
    }
}
