use super::change_offset::{AnchorMovement, ChangeDescriptor};

/// How a replacement moves the positions inside the replaced range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EditMode {
    /// One combined removal and insertion.
    #[default]
    Normal,
    /// A removal followed by an insertion at the same point. Positions caught
    /// in the range end up in front of the new text whatever their movement.
    RemoveThenInsert,
    /// Byte-for-byte substitution: positions inside the range keep their
    /// relative offset (clamped to the shorter of the two lengths) and are
    /// never deleted.
    ReplaceCharacters,
}

impl EditMode {
    /// The descriptor sequence for replacing `removal_length` bytes at
    /// `offset` with `insertion_length` bytes, applied left to right.
    pub fn descriptors(
        self,
        offset: usize,
        removal_length: usize,
        insertion_length: usize,
    ) -> Vec<ChangeDescriptor> {
        if removal_length == 0 || insertion_length == 0 {
            return vec![ChangeDescriptor::new(offset, removal_length, insertion_length)];
        }
        match self {
            EditMode::Normal => {
                vec![ChangeDescriptor::new(offset, removal_length, insertion_length)]
            }
            EditMode::RemoveThenInsert => vec![
                ChangeDescriptor::new(offset, removal_length, 0),
                ChangeDescriptor::new(offset, 0, insertion_length).forcing_before_insertion(),
            ],
            EditMode::ReplaceCharacters => {
                if insertion_length > removal_length {
                    // substitute all but the last byte in place, grow at the end
                    vec![
                        ChangeDescriptor::new(
                            offset + removal_length - 1,
                            1,
                            1 + insertion_length - removal_length,
                        )
                        .keeping_positions(),
                    ]
                } else if insertion_length < removal_length {
                    vec![
                        ChangeDescriptor::new(
                            offset + insertion_length,
                            removal_length - insertion_length,
                            0,
                        )
                        .keeping_positions(),
                    ]
                } else {
                    Vec::new()
                }
            }
        }
    }
}

/// A committed edit, as reported to trackers and undo collaborators.
///
/// Carries enough to replay the edit (`offset`, removed and inserted text)
/// and to build its inverse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentChange {
    offset: usize,
    removed_text: String,
    inserted_text: String,
    mode: EditMode,
    descriptors: Vec<ChangeDescriptor>,
}

impl DocumentChange {
    pub fn new(
        offset: usize,
        removed_text: impl Into<String>,
        inserted_text: impl Into<String>,
        mode: EditMode,
    ) -> Self {
        let removed_text = removed_text.into();
        let inserted_text = inserted_text.into();
        let descriptors = mode.descriptors(offset, removed_text.len(), inserted_text.len());
        Self {
            offset,
            removed_text,
            inserted_text,
            mode,
            descriptors,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn removed_text(&self) -> &str {
        &self.removed_text
    }

    pub fn inserted_text(&self) -> &str {
        &self.inserted_text
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn removal_length(&self) -> usize {
        self.removed_text.len()
    }

    pub fn insertion_length(&self) -> usize {
        self.inserted_text.len()
    }

    /// Offset just past the inserted text.
    pub fn insertion_end(&self) -> usize {
        self.offset + self.inserted_text.len()
    }

    pub fn descriptors(&self) -> &[ChangeDescriptor] {
        &self.descriptors
    }

    /// Map a position from before this change to after it.
    pub fn new_offset(&self, old_offset: usize, movement: AnchorMovement) -> usize {
        self.descriptors
            .iter()
            .fold(old_offset, |offset, descriptor| {
                descriptor.new_offset(offset, movement)
            })
    }

    /// The change that undoes this one.
    pub fn inverse(&self) -> DocumentChange {
        DocumentChange::new(
            self.offset,
            self.inserted_text.clone(),
            self.removed_text.clone(),
            self.mode,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case::normal(EditMode::Normal, 4, 2, 3, vec![ChangeDescriptor::new(4, 2, 3)])]
    #[case::pure_insertion(EditMode::RemoveThenInsert, 4, 0, 3, vec![ChangeDescriptor::new(4, 0, 3)])]
    #[case::pure_removal(EditMode::ReplaceCharacters, 4, 2, 0, vec![ChangeDescriptor::new(4, 2, 0)])]
    #[case::remove_then_insert(
        EditMode::RemoveThenInsert,
        4,
        2,
        3,
        vec![
            ChangeDescriptor::new(4, 2, 0),
            ChangeDescriptor::new(4, 0, 3).forcing_before_insertion()
        ]
    )]
    #[case::replace_growing(
        EditMode::ReplaceCharacters,
        4,
        2,
        5,
        vec![ChangeDescriptor::new(5, 1, 4).keeping_positions()]
    )]
    #[case::replace_shrinking(
        EditMode::ReplaceCharacters,
        1,
        4,
        1,
        vec![ChangeDescriptor::new(2, 3, 0).keeping_positions()]
    )]
    #[case::replace_same_length(EditMode::ReplaceCharacters, 4, 3, 3, vec![])]
    fn test_descriptors(
        #[case] mode: EditMode,
        #[case] offset: usize,
        #[case] removal_length: usize,
        #[case] insertion_length: usize,
        #[case] expected: Vec<ChangeDescriptor>,
    ) {
        assert_eq!(
            mode.descriptors(offset, removal_length, insertion_length),
            expected
        );
    }

    #[test]
    fn test_inverse_swaps_texts() {
        let change = DocumentChange::new(3, "abc", "XY", EditMode::Normal);
        let inverse = change.inverse();
        assert_eq!(inverse.offset(), 3);
        assert_eq!(inverse.removed_text(), "XY");
        assert_eq!(inverse.inserted_text(), "abc");
        assert_eq!(inverse.inverse(), change);
    }

    #[rstest]
    #[case(EditMode::Normal, AnchorMovement::AfterInsertion, 7)]
    #[case(EditMode::RemoveThenInsert, AnchorMovement::AfterInsertion, 2)]
    #[case(EditMode::RemoveThenInsert, AnchorMovement::BeforeInsertion, 2)]
    #[case(EditMode::ReplaceCharacters, AnchorMovement::Default, 3)]
    fn test_new_offset_inside_range(
        #[case] mode: EditMode,
        #[case] movement: AnchorMovement,
        #[case] expected: usize,
    ) {
        // "ab|cdef|gh" -> "ab|XYZWV|gh", position 3 sits inside the range
        let change = DocumentChange::new(2, "cdef", "XYZWV", mode);
        assert_eq!(change.new_offset(3, movement), expected);
    }

    #[test]
    fn test_lengths_and_insertion_end() {
        let change = DocumentChange::new(10, "", "hello", EditMode::default());
        assert_eq!(change.removal_length(), 0);
        assert_eq!(change.insertion_length(), 5);
        assert_eq!(change.insertion_end(), 15);
    }
}
