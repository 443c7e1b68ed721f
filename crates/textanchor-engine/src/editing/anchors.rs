//! Self-adjusting positions.
//!
//! The index stores each anchor as the distance from the anchor before it, so
//! an edit rewrites only the anchors inside the edited range plus one length
//! on the first anchor after it. Nodes hold a `Weak` to the caller's handle;
//! once every [`Anchor`] clone is dropped the node is folded away the next
//! time an edit touches it, or by a sweep.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use super::change_offset::{AnchorMovement, ChangeDescriptor};
use super::treap::{NodeId, Treap};

/// Node count below which the index never sweeps on its own.
pub const DEFAULT_SWEEP_THRESHOLD: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AnchorState {
    Live(NodeId),
    /// Frozen at the offset it had when it was deleted.
    Deleted(usize),
}

struct AnchorCell {
    tree: Weak<RefCell<AnchorTree>>,
    state: Cell<AnchorState>,
    movement: Cell<AnchorMovement>,
    survives_deletion: Cell<bool>,
}

/// A position in a document that follows edits.
///
/// Cloning shares the anchor. Reading the offset is always legal: once the
/// anchor is deleted it keeps reporting the offset it was deleted at.
#[derive(Clone)]
pub struct Anchor {
    cell: Rc<AnchorCell>,
}

impl Anchor {
    /// Current offset, O(log n).
    pub fn offset(&self) -> usize {
        match self.cell.state.get() {
            AnchorState::Deleted(offset) => offset,
            AnchorState::Live(id) => {
                let Some(tree) = self.cell.tree.upgrade() else {
                    return 0;
                };
                tree.borrow().offset_of(id).unwrap_or(0)
            }
        }
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self.cell.state.get(), AnchorState::Deleted(_))
    }

    pub fn movement(&self) -> AnchorMovement {
        self.cell.movement.get()
    }

    pub fn set_movement(&self, movement: AnchorMovement) {
        self.cell.movement.set(movement);
    }

    pub fn survives_deletion(&self) -> bool {
        self.cell.survives_deletion.get()
    }

    pub fn set_survives_deletion(&self, survives_deletion: bool) {
        self.cell.survives_deletion.set(survives_deletion);
    }
}

impl PartialEq for Anchor {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }
}

impl Eq for Anchor {}

impl fmt::Debug for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Anchor")
            .field("offset", &self.offset())
            .field("deleted", &self.is_deleted())
            .field("movement", &self.movement())
            .field("survives_deletion", &self.survives_deletion())
            .finish()
    }
}

pub(crate) struct AnchorTree {
    nodes: Treap<Weak<AnchorCell>>,
    sweep_threshold: usize,
    next_sweep_at: usize,
}

impl AnchorTree {
    pub(crate) fn new(sweep_threshold: usize) -> Self {
        let sweep_threshold = sweep_threshold.max(1);
        Self {
            nodes: Treap::new(),
            sweep_threshold,
            next_sweep_at: sweep_threshold,
        }
    }

    /// Create an anchor at `offset`. The caller has checked the offset
    /// against the document length.
    pub(crate) fn create(
        tree: &Rc<RefCell<AnchorTree>>,
        offset: usize,
        movement: AnchorMovement,
        survives_deletion: bool,
    ) -> Anchor {
        let cell = Rc::new(AnchorCell {
            tree: Rc::downgrade(tree),
            state: Cell::new(AnchorState::Deleted(offset)),
            movement: Cell::new(movement),
            survives_deletion: Cell::new(survives_deletion),
        });
        let id = tree.borrow_mut().insert(offset, Rc::downgrade(&cell));
        cell.state.set(AnchorState::Live(id));
        Anchor { cell }
    }

    fn insert(&mut self, offset: usize, cell: Weak<AnchorCell>) -> NodeId {
        if self.nodes.len() >= self.next_sweep_at {
            self.sweep();
        }
        let root = self.nodes.take_root();
        let (before, after) = self.nodes.split_by_offset(root, 0, &|end| end <= offset);
        let before_total = self.nodes.total_of(before);
        let node = self.nodes.alloc(cell, offset - before_total);
        if let Some(first) = self.nodes.first(after) {
            let first_offset = before_total + self.nodes.node_len(first);
            self.nodes.set_first_len(after, first_offset - offset);
        }
        let joined = self.nodes.merge(before, Some(node));
        let merged = self.nodes.merge(joined, after);
        self.nodes.set_root(merged);
        self.nodes.id(node)
    }

    pub(crate) fn offset_of(&self, id: NodeId) -> Option<usize> {
        let node = self.nodes.resolve(id)?;
        Some(self.nodes.locate(node).1)
    }

    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Move every anchor through one atomic edit.
    pub(crate) fn apply_change(&mut self, change: &ChangeDescriptor) {
        if change.is_empty() || self.nodes.len() == 0 {
            return;
        }
        let start = change.removal_start;
        let end = change.removal_end();

        let root = self.nodes.take_root();
        let (before, rest) = self.nodes.split_by_offset(root, 0, &|offset| offset < start);
        let before_total = self.nodes.total_of(before);
        let (touched, after) =
            self.nodes
                .split_by_offset(rest, before_total, &|offset| offset <= end);

        let mut survivors = Vec::new();
        let mut old_offset = before_total;
        let mut deleted = 0;
        for node in self.nodes.in_order(touched) {
            old_offset += self.nodes.node_len(node);
            let Some(cell) = self.nodes.value(node).upgrade() else {
                self.nodes.release(node);
                continue;
            };
            let mapped = change.map(old_offset, cell.movement.get());
            let keeps_position = cell.survives_deletion.get() || change.removal_never_deletes;
            if mapped.inside_removed_range && !keeps_position {
                cell.state.set(AnchorState::Deleted(mapped.offset));
                self.nodes.release(node);
                deleted += 1;
                continue;
            }
            survivors.push((mapped.offset, node));
        }
        if deleted > 0 {
            log::trace!("{deleted} anchors deleted by removal at {start}");
        }

        // collapsed anchors can overtake their neighbours
        survivors.sort_by_key(|&(offset, _)| offset);
        let mut previous = before_total;
        let relative: Vec<(u32, usize)> = survivors
            .into_iter()
            .map(|(offset, node)| {
                let len = offset - previous;
                previous = offset;
                (node, len)
            })
            .collect();
        let rebuilt = self.nodes.build(&relative);

        if let Some(first) = self.nodes.first(after) {
            let first_old = old_offset + self.nodes.node_len(first);
            let first_new = first_old - change.removal_length + change.insertion_length;
            self.nodes.set_first_len(after, first_new - previous);
        }

        let joined = self.nodes.merge(before, rebuilt);
        let merged = self.nodes.merge(joined, after);
        self.nodes.set_root(merged);
    }

    /// Fold away every node whose anchor is no longer referenced. Returns the
    /// number of nodes removed.
    pub(crate) fn sweep(&mut self) -> usize {
        let root = self.nodes.take_root();
        let mut kept = Vec::new();
        let mut offset = 0;
        let mut previous = 0;
        let mut removed = 0;
        for node in self.nodes.in_order(root) {
            offset += self.nodes.node_len(node);
            if self.nodes.value(node).strong_count() == 0 {
                self.nodes.release(node);
                removed += 1;
                continue;
            }
            kept.push((node, offset - previous));
            previous = offset;
        }
        let rebuilt = self.nodes.build(&kept);
        self.nodes.set_root(rebuilt);
        self.next_sweep_at = (2 * self.nodes.len()).max(self.sweep_threshold);
        log::debug!(
            "anchor sweep removed {removed} nodes, {} remain",
            self.nodes.len()
        );
        removed
    }

    /// Offsets of every node in order, dead or alive.
    #[cfg(test)]
    pub(crate) fn offsets(&self) -> Vec<usize> {
        let mut offset = 0;
        self.nodes
            .in_order(self.nodes.root())
            .into_iter()
            .map(|node| {
                offset += self.nodes.node_len(node);
                offset
            })
            .collect()
    }
}

impl Drop for AnchorTree {
    fn drop(&mut self) {
        let mut offset = 0;
        for node in self.nodes.in_order(self.nodes.root()) {
            offset += self.nodes.node_len(node);
            if let Some(cell) = self.nodes.value(node).upgrade() {
                cell.state.set(AnchorState::Deleted(offset));
            }
        }
    }
}

impl fmt::Debug for AnchorTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnchorTree")
            .field("nodes", &self.nodes.len())
            .field("sweep_threshold", &self.sweep_threshold)
            .field("next_sweep_at", &self.next_sweep_at)
            .finish()
    }
}
