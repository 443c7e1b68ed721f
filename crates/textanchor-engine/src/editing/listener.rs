use super::change::DocumentChange;
use super::line_tree::LineId;
use super::view::DocumentView;

/// Observer of structural line changes and committed edits.
///
/// Trackers are registered on a [`Document`](super::Document) and called
/// synchronously, in registration order. During an edit the structural
/// callbacks arrive while the line index is still being updated, so they only
/// receive line ids: resolve them later through the view passed to
/// [`after_change`](LineTracker::after_change). Every method defaults to a
/// no-op.
pub trait LineTracker {
    /// `line` is about to be merged into its predecessor and will stop
    /// resolving.
    fn before_removing(&mut self, _line: LineId) {}

    /// The total length (content plus delimiter) of `line` is about to change.
    fn reset_length(&mut self, _line: LineId, _new_total_length: usize) {}

    /// `new_line` was split off the end of `original`.
    fn after_inserting(&mut self, _original: LineId, _new_line: LineId) {}

    /// The whole line index was replaced; every previously seen id is gone.
    fn rebuild(&mut self) {}

    /// One or more edits were committed. Called once per edit, or once per
    /// outermost batch with every change of the batch.
    fn after_change(&mut self, _document: &dyn DocumentView, _changes: &[DocumentChange]) {}
}
