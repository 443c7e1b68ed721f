//! Offset mapping through a single atomic edit.
//!
//! Every position tracked by the document (anchors, caret positions held by
//! collaborators, undo bookkeeping) moves through an edit by the same rules,
//! so they live here as pure functions with no access to the text.

/// Tie-break rule for a position sitting exactly where text is inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AnchorMovement {
    /// Behaves like [`AnchorMovement::BeforeInsertion`].
    #[default]
    Default,
    /// Stays in front of text inserted at its position.
    BeforeInsertion,
    /// Moves past text inserted at its position.
    AfterInsertion,
}

/// One atomic edit: remove `removal_length` bytes at `removal_start`, then
/// insert `insertion_length` bytes at the same point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChangeDescriptor {
    pub removal_start: usize,
    pub removal_length: usize,
    pub insertion_length: usize,
    /// Positions inside the removed range collapse instead of being deleted,
    /// whatever their own survives-deletion flag says.
    pub removal_never_deletes: bool,
    /// Positions at the insertion point stay in front of the inserted text,
    /// whatever their own movement says.
    pub forces_before_insertion: bool,
}

/// Result of mapping an offset through a [`ChangeDescriptor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappedOffset {
    pub offset: usize,
    /// The old offset lay strictly inside the removed range.
    pub inside_removed_range: bool,
}

impl ChangeDescriptor {
    pub fn new(removal_start: usize, removal_length: usize, insertion_length: usize) -> Self {
        Self {
            removal_start,
            removal_length,
            insertion_length,
            removal_never_deletes: false,
            forces_before_insertion: false,
        }
    }

    /// Same edit, but positions caught in the removal are never deleted.
    #[must_use]
    pub fn keeping_positions(mut self) -> Self {
        self.removal_never_deletes = true;
        self
    }

    /// Same edit, but every position at the insertion point stays in front
    /// of the inserted text.
    #[must_use]
    pub fn forcing_before_insertion(mut self) -> Self {
        self.forces_before_insertion = true;
        self
    }

    pub fn removal_end(&self) -> usize {
        self.removal_start + self.removal_length
    }

    /// A descriptor that neither removes nor inserts anything.
    pub fn is_empty(&self) -> bool {
        self.removal_length == 0 && self.insertion_length == 0
    }

    /// Map `old_offset` through this edit.
    pub fn map(&self, old_offset: usize, movement: AnchorMovement) -> MappedOffset {
        let movement = if self.forces_before_insertion {
            AnchorMovement::BeforeInsertion
        } else {
            movement
        };
        map_offset(
            old_offset,
            movement,
            self.removal_start,
            self.removal_length,
            self.insertion_length,
        )
    }

    /// Map `old_offset` through this edit, ignoring whether it was removed.
    pub fn new_offset(&self, old_offset: usize, movement: AnchorMovement) -> usize {
        self.map(old_offset, movement).offset
    }
}

/// Map `old_offset` through the edit `(removal_start, removal_length, insertion_length)`.
///
/// - Offsets before the edit do not move. An offset exactly at the edit point
///   only moves on a pure insertion, and only for
///   [`AnchorMovement::AfterInsertion`].
/// - Offsets strictly inside the removed range collapse to `removal_start`
///   (or past the inserted text for `AfterInsertion`) and are flagged.
/// - Offsets at or after the end of the removed range shift by the length delta.
pub fn map_offset(
    old_offset: usize,
    movement: AnchorMovement,
    removal_start: usize,
    removal_length: usize,
    insertion_length: usize,
) -> MappedOffset {
    let collapsed = |inside_removed_range| MappedOffset {
        offset: match movement {
            AnchorMovement::AfterInsertion => removal_start + insertion_length,
            AnchorMovement::Default | AnchorMovement::BeforeInsertion => removal_start,
        },
        inside_removed_range,
    };
    let unchanged = MappedOffset {
        offset: old_offset,
        inside_removed_range: false,
    };

    if old_offset < removal_start {
        return unchanged;
    }
    if old_offset == removal_start {
        return if removal_length == 0 {
            collapsed(false)
        } else {
            unchanged
        };
    }
    if old_offset >= removal_start + removal_length {
        return MappedOffset {
            offset: old_offset - removal_length + insertion_length,
            inside_removed_range: false,
        };
    }
    collapsed(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    use AnchorMovement::{AfterInsertion, BeforeInsertion};

    const DEFAULT: AnchorMovement = AnchorMovement::Default;

    #[rstest]
    #[case::before_edit(3, DEFAULT, 3)]
    #[case::at_start_of_removal(5, AfterInsertion, 5)]
    #[case::inside_default(6, DEFAULT, 5)]
    #[case::inside_before(7, BeforeInsertion, 5)]
    #[case::inside_after(6, AfterInsertion, 9)]
    #[case::at_end_of_removal(8, DEFAULT, 9)]
    #[case::after_edit(20, BeforeInsertion, 21)]
    fn test_replace_moves_offsets(
        #[case] old: usize,
        #[case] movement: AnchorMovement,
        #[case] expected: usize,
    ) {
        // remove 3 bytes at 5, insert 4
        let change = ChangeDescriptor::new(5, 3, 4);
        assert_eq!(change.new_offset(old, movement), expected);
    }

    #[rstest]
    #[case(DEFAULT, 10)]
    #[case(BeforeInsertion, 10)]
    #[case(AfterInsertion, 13)]
    fn test_pure_insertion_tie_break(#[case] movement: AnchorMovement, #[case] expected: usize) {
        let mapped = map_offset(10, movement, 10, 0, 3);
        assert_eq!(mapped.offset, expected);
        assert!(!mapped.inside_removed_range);
    }

    #[test]
    fn test_only_strict_interior_is_flagged() {
        let change = ChangeDescriptor::new(2, 4, 0);
        let flagged: Vec<usize> = (0..10)
            .filter(|&offset| change.map(offset, DEFAULT).inside_removed_range)
            .collect();
        assert_eq!(flagged, vec![3, 4, 5]);
    }

    #[test]
    fn test_empty_descriptor_is_identity() {
        let change = ChangeDescriptor::new(4, 0, 0);
        assert!(change.is_empty());
        for movement in [DEFAULT, BeforeInsertion, AfterInsertion] {
            for offset in 0..8 {
                assert_eq!(change.new_offset(offset, movement), offset);
            }
        }
    }

    #[test]
    fn test_keeping_positions_only_sets_flag() {
        let change = ChangeDescriptor::new(1, 2, 3).keeping_positions();
        assert!(change.removal_never_deletes);
        assert_eq!(change.removal_end(), 3);
        assert_eq!(change.new_offset(2, AfterInsertion), 4);
    }

    #[test]
    fn test_forcing_before_insertion_overrides_movement() {
        let change = ChangeDescriptor::new(6, 0, 2).forcing_before_insertion();
        assert_eq!(change.new_offset(6, AfterInsertion), 6);
        assert_eq!(change.new_offset(7, AfterInsertion), 9);
    }
}
