//! Arena-backed treap shared by the line and anchor indexes.
//!
//! Nodes carry a length and every subtree caches its node count and the sum
//! of its lengths, so both "the k-th node" and "the node covering offset o"
//! are O(log n) descents. A node's *end* is the sum of the lengths of every
//! node up to and including it in order. The line index stores each line's
//! total length; the anchor index stores the distance from the previous
//! anchor, which makes a node's end its absolute offset.
//!
//! Nodes live in a slot vector and are addressed by `u32` index internally.
//! Handles given out to callers are [`NodeId`]s, which pair the index with a
//! generation so a handle to a released slot never resolves to its successor.

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

const PRIORITY_SEED: u64 = 0x7465_7874_616e_6368;

/// Generation-checked handle to a treap node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

struct Slot<T> {
    value: T,
    len: usize,
    total: usize,
    size: usize,
    priority: u32,
    left: Option<u32>,
    right: Option<u32>,
    parent: Option<u32>,
    generation: u32,
    occupied: bool,
}

pub(crate) struct Treap<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    root: Option<u32>,
    rng: SmallRng,
}

impl<T: Default> Treap<T> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: None,
            rng: SmallRng::seed_from_u64(PRIORITY_SEED),
        }
    }

    /// Allocate a detached node.
    pub(crate) fn alloc(&mut self, value: T, len: usize) -> u32 {
        let priority = self.rng.next_u32();
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = value;
            slot.len = len;
            slot.total = len;
            slot.size = 1;
            slot.priority = priority;
            slot.left = None;
            slot.right = None;
            slot.parent = None;
            slot.occupied = true;
            return index;
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            value,
            len,
            total: len,
            size: 1,
            priority,
            left: None,
            right: None,
            parent: None,
            generation: 0,
            occupied: true,
        });
        index
    }

    /// Return a node's slot to the free list. The node must already be
    /// detached from the tree. Outstanding [`NodeId`]s stop resolving.
    pub(crate) fn release(&mut self, index: u32) -> T {
        let slot = &mut self.slots[index as usize];
        debug_assert!(slot.occupied, "releasing a free slot");
        slot.occupied = false;
        slot.generation = slot.generation.wrapping_add(1);
        slot.left = None;
        slot.right = None;
        slot.parent = None;
        self.free.push(index);
        std::mem::take(&mut slot.value)
    }

    pub(crate) fn id(&self, index: u32) -> NodeId {
        NodeId {
            index,
            generation: self.slots[index as usize].generation,
        }
    }

    pub(crate) fn resolve(&self, id: NodeId) -> Option<u32> {
        let slot = self.slots.get(id.index as usize)?;
        (slot.occupied && slot.generation == id.generation).then_some(id.index)
    }

    pub(crate) fn value(&self, index: u32) -> &T {
        &self.slots[index as usize].value
    }

    pub(crate) fn value_mut(&mut self, index: u32) -> &mut T {
        &mut self.slots[index as usize].value
    }

    pub(crate) fn node_len(&self, index: u32) -> usize {
        self.slots[index as usize].len
    }

    pub(crate) fn root(&self) -> Option<u32> {
        self.root
    }

    /// Detach the whole tree so it can be split and merged freely.
    pub(crate) fn take_root(&mut self) -> Option<u32> {
        self.root.take()
    }

    pub(crate) fn set_root(&mut self, root: Option<u32>) {
        if let Some(index) = root {
            self.slots[index as usize].parent = None;
        }
        self.root = root;
    }

    /// Number of nodes in the tree.
    pub(crate) fn len(&self) -> usize {
        self.size_of(self.root)
    }

    /// Sum of all node lengths.
    pub(crate) fn total(&self) -> usize {
        self.total_of(self.root)
    }

    pub(crate) fn size_of(&self, tree: Option<u32>) -> usize {
        tree.map_or(0, |index| self.slots[index as usize].size)
    }

    pub(crate) fn total_of(&self, tree: Option<u32>) -> usize {
        tree.map_or(0, |index| self.slots[index as usize].total)
    }

    fn pull(&mut self, index: u32) {
        let (left, right, len) = {
            let slot = &self.slots[index as usize];
            (slot.left, slot.right, slot.len)
        };
        let size = 1 + self.size_of(left) + self.size_of(right);
        let total = len + self.total_of(left) + self.total_of(right);
        for child in [left, right].into_iter().flatten() {
            self.slots[child as usize].parent = Some(index);
        }
        let slot = &mut self.slots[index as usize];
        slot.size = size;
        slot.total = total;
    }

    /// Concatenate two trees, every node of `left` ordered before `right`.
    pub(crate) fn merge(&mut self, left: Option<u32>, right: Option<u32>) -> Option<u32> {
        match (left, right) {
            (None, tree) | (tree, None) => tree,
            (Some(a), Some(b)) => {
                if self.slots[a as usize].priority > self.slots[b as usize].priority {
                    let a_right = self.slots[a as usize].right;
                    let merged = self.merge(a_right, Some(b));
                    self.slots[a as usize].right = merged;
                    self.pull(a);
                    Some(a)
                } else {
                    let b_left = self.slots[b as usize].left;
                    let merged = self.merge(Some(a), b_left);
                    self.slots[b as usize].left = merged;
                    self.pull(b);
                    Some(b)
                }
            }
        }
    }

    /// Split off the first `count` nodes.
    pub(crate) fn split_by_index(
        &mut self,
        tree: Option<u32>,
        count: usize,
    ) -> (Option<u32>, Option<u32>) {
        let Some(index) = tree else {
            return (None, None);
        };
        let (left, right) = {
            let slot = &self.slots[index as usize];
            (slot.left, slot.right)
        };
        let left_size = self.size_of(left);
        if count <= left_size {
            let (a, b) = self.split_by_index(left, count);
            self.slots[index as usize].left = b;
            self.pull(index);
            (a, Some(index))
        } else {
            let (a, b) = self.split_by_index(right, count - left_size - 1);
            self.slots[index as usize].right = a;
            self.pull(index);
            (Some(index), b)
        }
    }

    /// Split `tree` into the prefix of nodes whose end satisfies `in_left`
    /// and the rest. `base` is the sum of lengths ordered before `tree`;
    /// `in_left` must hold for a prefix of the nodes and fail for the rest.
    pub(crate) fn split_by_offset(
        &mut self,
        tree: Option<u32>,
        base: usize,
        in_left: &impl Fn(usize) -> bool,
    ) -> (Option<u32>, Option<u32>) {
        let Some(index) = tree else {
            return (None, None);
        };
        let (left, right, len) = {
            let slot = &self.slots[index as usize];
            (slot.left, slot.right, slot.len)
        };
        let end = base + self.total_of(left) + len;
        if in_left(end) {
            let (a, b) = self.split_by_offset(right, end, in_left);
            self.slots[index as usize].right = a;
            self.pull(index);
            (Some(index), b)
        } else {
            let (a, b) = self.split_by_offset(left, base, in_left);
            self.slots[index as usize].left = b;
            self.pull(index);
            (a, Some(index))
        }
    }

    /// In-order position and end of an attached node.
    pub(crate) fn locate(&self, index: u32) -> (usize, usize) {
        let slot = &self.slots[index as usize];
        let mut position = self.size_of(slot.left);
        let mut end = self.total_of(slot.left) + slot.len;
        let mut child = index;
        let mut current = slot.parent;
        while let Some(parent) = current {
            let parent_slot = &self.slots[parent as usize];
            if parent_slot.right == Some(child) {
                position += self.size_of(parent_slot.left) + 1;
                end += self.total_of(parent_slot.left) + parent_slot.len;
            }
            child = parent;
            current = parent_slot.parent;
        }
        (position, end)
    }

    /// The node at in-order `position`.
    pub(crate) fn find_by_index(&self, mut position: usize) -> Option<u32> {
        let mut current = self.root;
        while let Some(index) = current {
            let slot = &self.slots[index as usize];
            let left_size = self.size_of(slot.left);
            if position < left_size {
                current = slot.left;
            } else if position == left_size {
                return Some(index);
            } else {
                position -= left_size + 1;
                current = slot.right;
            }
        }
        None
    }

    /// The first node whose end lies past `offset`, or the last node when
    /// none does. `None` only for an empty tree.
    pub(crate) fn find_by_offset(&self, offset: usize) -> Option<u32> {
        let mut current = self.root;
        let mut base = 0;
        let mut found = None;
        while let Some(index) = current {
            let slot = &self.slots[index as usize];
            let end = base + self.total_of(slot.left) + slot.len;
            if end > offset {
                found = Some(index);
                current = slot.left;
            } else {
                base = end;
                current = slot.right;
            }
        }
        found.or_else(|| self.last())
    }

    /// First node of `tree` in order.
    pub(crate) fn first(&self, tree: Option<u32>) -> Option<u32> {
        let mut current = tree?;
        while let Some(left) = self.slots[current as usize].left {
            current = left;
        }
        Some(current)
    }

    pub(crate) fn last(&self) -> Option<u32> {
        let mut current = self.root?;
        while let Some(right) = self.slots[current as usize].right {
            current = right;
        }
        Some(current)
    }

    /// Node indexes of `tree` in order.
    pub(crate) fn in_order(&self, tree: Option<u32>) -> Vec<u32> {
        let mut out = Vec::with_capacity(self.size_of(tree));
        let mut stack = Vec::new();
        let mut current = tree;
        loop {
            while let Some(index) = current {
                stack.push(index);
                current = self.slots[index as usize].left;
            }
            let Some(index) = stack.pop() else {
                break;
            };
            out.push(index);
            current = self.slots[index as usize].right;
        }
        out
    }

    /// Build a tree in O(n) from allocated nodes given in order, assigning
    /// each its new length. The nodes' previous links are discarded.
    pub(crate) fn build(&mut self, nodes: &[(u32, usize)]) -> Option<u32> {
        let mut spine: Vec<u32> = Vec::new();
        for &(index, len) in nodes {
            {
                let slot = &mut self.slots[index as usize];
                slot.len = len;
                slot.left = None;
                slot.right = None;
                slot.parent = None;
            }
            let priority = self.slots[index as usize].priority;
            let mut popped = None;
            while let Some(&top) = spine.last() {
                if self.slots[top as usize].priority >= priority {
                    break;
                }
                self.pull(top);
                popped = spine.pop();
            }
            self.slots[index as usize].left = popped;
            if let Some(&top) = spine.last() {
                self.slots[top as usize].right = Some(index);
            }
            spine.push(index);
        }
        let mut root = None;
        while let Some(index) = spine.pop() {
            self.pull(index);
            root = Some(index);
        }
        root
    }

    /// Set the length of the first node of `tree`.
    pub(crate) fn set_first_len(&mut self, tree: Option<u32>, len: usize) {
        let mut path = Vec::new();
        let mut current = tree;
        while let Some(index) = current {
            path.push(index);
            current = self.slots[index as usize].left;
        }
        let Some(&first) = path.last() else {
            return;
        };
        self.slots[first as usize].len = len;
        for &index in path.iter().rev() {
            self.pull(index);
        }
    }

    /// Set the length of an attached node and refresh its ancestors.
    pub(crate) fn set_len(&mut self, index: u32, len: usize) {
        self.slots[index as usize].len = len;
        let mut current = Some(index);
        while let Some(node) = current {
            self.pull(node);
            current = self.slots[node as usize].parent;
        }
    }

    /// Insert a detached node so it ends up at in-order `position`.
    pub(crate) fn insert_at(&mut self, position: usize, index: u32) {
        let root = self.take_root();
        let (before, after) = self.split_by_index(root, position);
        let joined = self.merge(before, Some(index));
        let merged = self.merge(joined, after);
        self.set_root(merged);
    }

    /// Detach the node at in-order `position` from the tree.
    pub(crate) fn detach_at(&mut self, position: usize) -> Option<u32> {
        let root = self.take_root();
        let (before, rest) = self.split_by_index(root, position);
        let (node, after) = self.split_by_index(rest, 1);
        let merged = self.merge(before, after);
        self.set_root(merged);
        if let Some(index) = node {
            self.slots[index as usize].parent = None;
        }
        node
    }

    /// Release every node and leave the tree empty.
    pub(crate) fn clear(&mut self) -> Vec<T> {
        let root = self.take_root();
        let indexes = self.in_order(root);
        indexes.into_iter().map(|index| self.release(index)).collect()
    }

    /// Number of allocated slots, live or free.
    #[cfg(test)]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }
}

impl<T: Default> Default for Treap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Treap<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut lengths = Vec::new();
        let mut stack = Vec::new();
        let mut current = self.root;
        loop {
            while let Some(index) = current {
                stack.push(index);
                current = self.slots[index as usize].left;
            }
            let Some(index) = stack.pop() else {
                break;
            };
            let slot = &self.slots[index as usize];
            lengths.push((slot.len, &slot.value));
            current = slot.right;
        }
        f.debug_struct("Treap")
            .field("nodes", &lengths)
            .field("free", &self.free.len())
            .finish()
    }
}
