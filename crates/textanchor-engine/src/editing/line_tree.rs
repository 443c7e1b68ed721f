//! Line index: one treap node per line, keyed by line number and by offset.

use super::treap::{NodeId, Treap};

/// Stable identity of a line. Survives every edit that does not merge the
/// line into its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineId(NodeId);

/// Snapshot of one line at the time it was queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentLine {
    pub id: LineId,
    /// 1-based.
    pub line_number: usize,
    pub offset: usize,
    /// Length of the content, excluding the delimiter.
    pub length: usize,
    /// 0 for the last line, 1 for `\n` or a lone `\r`, 2 for `\r\n`.
    pub delimiter_length: usize,
}

impl DocumentLine {
    /// Offset just past the content, where the delimiter starts.
    pub fn end_offset(&self) -> usize {
        self.offset + self.length
    }

    pub fn total_length(&self) -> usize {
        self.length + self.delimiter_length
    }
}

#[derive(Debug, Default)]
struct LineNode {
    delimiter_length: usize,
}

/// Every line of the document in order. Node lengths are total line lengths
/// (content plus delimiter), so the tree's total is the document length.
/// There is always at least one line.
#[derive(Debug)]
pub(crate) struct LineTree {
    nodes: Treap<LineNode>,
}

impl LineTree {
    pub(crate) fn new(text: &str) -> Self {
        let mut tree = Self {
            nodes: Treap::new(),
        };
        tree.rebuild(text);
        tree
    }

    /// Replace every line with a fresh scan of `text`. Old ids stop resolving.
    pub(crate) fn rebuild(&mut self, text: &str) {
        self.nodes.clear();
        let mut entries = Vec::new();
        let mut start = 0;
        while let Some((at, delimiter_length)) = next_line_break(text, start) {
            let end = at + delimiter_length;
            entries.push((end - start, delimiter_length));
            start = end;
        }
        entries.push((text.len() - start, 0));

        let nodes: Vec<(u32, usize)> = entries
            .into_iter()
            .map(|(total, delimiter_length)| {
                (self.nodes.alloc(LineNode { delimiter_length }, total), total)
            })
            .collect();
        let root = self.nodes.build(&nodes);
        self.nodes.set_root(root);
        log::trace!("line index rebuilt with {} lines", nodes.len());
    }

    pub(crate) fn line_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn total_length(&self) -> usize {
        self.nodes.total()
    }

    /// Line snapshot for a node.
    pub(crate) fn line(&self, node: u32) -> DocumentLine {
        let (position, end) = self.nodes.locate(node);
        let total = self.nodes.node_len(node);
        let delimiter_length = self.nodes.value(node).delimiter_length;
        DocumentLine {
            id: self.id(node),
            line_number: position + 1,
            offset: end - total,
            length: total - delimiter_length,
            delimiter_length,
        }
    }

    /// Id of a node, readable while its lengths are being updated.
    pub(crate) fn id(&self, node: u32) -> LineId {
        LineId(self.nodes.id(node))
    }

    pub(crate) fn node(&self, id: LineId) -> Option<u32> {
        self.nodes.resolve(id.0)
    }

    /// Node of the line containing `offset`. An offset at a line boundary
    /// belongs to the line starting there; the document end belongs to the
    /// last line.
    pub(crate) fn node_at_offset(&self, offset: usize) -> u32 {
        self.nodes
            .find_by_offset(offset)
            .expect("line tree always holds at least one line")
    }

    pub(crate) fn node_by_number(&self, line_number: usize) -> Option<u32> {
        line_number
            .checked_sub(1)
            .and_then(|position| self.nodes.find_by_index(position))
    }

    pub(crate) fn next_node(&self, node: u32) -> Option<u32> {
        let (position, _) = self.nodes.locate(node);
        self.nodes.find_by_index(position + 1)
    }

    pub(crate) fn previous_node(&self, node: u32) -> Option<u32> {
        let (position, _) = self.nodes.locate(node);
        position
            .checked_sub(1)
            .and_then(|position| self.nodes.find_by_index(position))
    }

    pub(crate) fn set_total_length(&mut self, node: u32, total: usize) {
        self.nodes.set_len(node, total);
    }

    pub(crate) fn set_delimiter_length(&mut self, node: u32, delimiter_length: usize) {
        self.nodes.value_mut(node).delimiter_length = delimiter_length;
    }

    /// Insert a new line of `total` bytes with no delimiter after `node`.
    pub(crate) fn insert_after(&mut self, node: u32, total: usize) -> u32 {
        let (position, _) = self.nodes.locate(node);
        let new_node = self.nodes.alloc(LineNode::default(), total);
        self.nodes.insert_at(position + 1, new_node);
        new_node
    }

    pub(crate) fn remove(&mut self, node: u32) {
        let (position, _) = self.nodes.locate(node);
        if let Some(detached) = self.nodes.detach_at(position) {
            self.nodes.release(detached);
        }
    }

    /// Snapshots of every line, first to last.
    #[cfg(test)]
    pub(crate) fn lines(&self) -> Vec<DocumentLine> {
        self.nodes
            .in_order(self.nodes.root())
            .into_iter()
            .map(|node| self.line(node))
            .collect()
    }
}

/// The next line break at or after `from`: its offset and length.
/// `\r\n` is one two-byte break; a lone `\r` or `\n` is a one-byte break.
pub(crate) fn next_line_break(text: &str, from: usize) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let relative = bytes
        .get(from..)?
        .iter()
        .position(|&byte| byte == b'\n' || byte == b'\r')?;
    let at = from + relative;
    let length = if bytes[at] == b'\r' && bytes.get(at + 1) == Some(&b'\n') {
        2
    } else {
        1
    };
    Some((at, length))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn shape(tree: &LineTree) -> Vec<(usize, usize, usize)> {
        tree.lines()
            .iter()
            .map(|line| (line.offset, line.length, line.delimiter_length))
            .collect()
    }

    #[rstest]
    #[case::empty("", vec![(0, 0, 0)])]
    #[case::single("abc", vec![(0, 3, 0)])]
    #[case::trailing_newline("abc\n", vec![(0, 3, 1), (4, 0, 0)])]
    #[case::crlf("a\r\nb", vec![(0, 1, 2), (3, 1, 0)])]
    #[case::lone_cr("a\rb", vec![(0, 1, 1), (2, 1, 0)])]
    #[case::cr_then_lf_lines("\r\r\n\n", vec![(0, 0, 1), (1, 0, 2), (3, 0, 1), (4, 0, 0)])]
    fn test_rebuild_splits_on_every_terminator(
        #[case] text: &str,
        #[case] expected: Vec<(usize, usize, usize)>,
    ) {
        let tree = LineTree::new(text);
        assert_eq!(shape(&tree), expected);
        assert_eq!(tree.total_length(), text.len());
    }

    #[rstest]
    #[case(0, 1)]
    #[case(2, 1)]
    #[case(3, 2)]
    #[case(4, 2)]
    #[case::line_two_delimiter(5, 2)]
    #[case(6, 3)]
    fn test_node_at_offset(#[case] offset: usize, #[case] line_number: usize) {
        let tree = LineTree::new("ab\ncd\n");
        let line = tree.line(tree.node_at_offset(offset));
        assert_eq!(line.line_number, line_number);
    }

    #[test]
    fn test_insert_after_and_remove_keep_ids() {
        let mut tree = LineTree::new("one\ntwo");
        let first = tree.node_by_number(1).map(|node| tree.line(node).id);
        let second = tree.node_by_number(2).map(|node| tree.line(node).id);

        let node = tree.node_at_offset(0);
        tree.set_total_length(node, 2);
        let inserted = tree.insert_after(node, 2);
        tree.set_delimiter_length(inserted, 1);
        assert_eq!(tree.line_count(), 3);
        assert_eq!(tree.line(inserted).line_number, 2);
        assert_eq!(tree.line(inserted).offset, 2);

        tree.remove(inserted);
        assert_eq!(tree.line_count(), 2);
        assert_eq!(tree.node_by_number(1).map(|node| tree.line(node).id), first);
        assert_eq!(tree.node_by_number(2).map(|node| tree.line(node).id), second);
    }

    #[test]
    fn test_neighbours() {
        let tree = LineTree::new("a\nb\nc");
        let middle = tree.node_at_offset(2);
        let next = tree.next_node(middle).map(|node| tree.line(node).offset);
        let previous = tree.previous_node(middle).map(|node| tree.line(node).offset);
        assert_eq!(next, Some(4));
        assert_eq!(previous, Some(0));
        assert_eq!(tree.previous_node(tree.node_at_offset(0)), None);
        assert_eq!(tree.next_node(tree.node_at_offset(5)), None);
    }

    #[test]
    fn test_rebuild_invalidates_old_ids() {
        let mut tree = LineTree::new("x\ny");
        let id = tree.line(tree.node_at_offset(0)).id;
        tree.rebuild("x\ny");
        assert_eq!(tree.node(id), None);
    }

    #[rstest]
    #[case("abc", 0, None)]
    #[case("a\nb", 0, Some((1, 1)))]
    #[case("a\r\nb", 0, Some((1, 2)))]
    #[case("a\r\nb", 2, Some((2, 1)))]
    #[case("a\rb\n", 2, Some((3, 1)))]
    #[case("ab", 5, None)]
    fn test_next_line_break(
        #[case] text: &str,
        #[case] from: usize,
        #[case] expected: Option<(usize, usize)>,
    ) {
        assert_eq!(next_line_break(text, from), expected);
    }
}
