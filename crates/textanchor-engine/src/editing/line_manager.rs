//! Incremental maintenance of the line index.
//!
//! An edit reaches the line index as a removal followed by an insertion, each
//! applied right after the same step has been applied to the text buffer, so
//! delimiters are always classified against the current text. Trackers hear
//! about every structural step as it happens.

use std::cell::RefCell;
use std::rc::Rc;

use super::line_tree::{LineTree, next_line_break};
use super::listener::LineTracker;
use super::text_buffer::TextBuffer;

pub(crate) struct LineManager<'a> {
    lines: &'a mut LineTree,
    buffer: &'a TextBuffer,
    trackers: &'a [Rc<RefCell<dyn LineTracker>>],
}

impl<'a> LineManager<'a> {
    pub(crate) fn new(
        lines: &'a mut LineTree,
        buffer: &'a TextBuffer,
        trackers: &'a [Rc<RefCell<dyn LineTracker>>],
    ) -> Self {
        Self {
            lines,
            buffer,
            trackers,
        }
    }

    /// Account for `length` bytes removed at `offset`. The buffer no longer
    /// contains them.
    pub(crate) fn remove(&mut self, offset: usize, length: usize) {
        self.remove_range(offset, length);
        self.join_split_crlf(offset);
    }

    fn remove_range(&mut self, offset: usize, length: usize) {
        if length == 0 {
            return;
        }
        let start_node = self.lines.node_at_offset(offset);
        let start = self.lines.line(start_node);
        let start_total = start.total_length();

        if offset > start.end_offset() {
            // removal starts between the \r and \n of a \r\n delimiter
            self.set_line_length(start_node, start_total - 1);
            self.remove_range(offset, length - 1);
            return;
        }
        if offset + length < start.offset + start_total {
            self.set_line_length(start_node, start_total - length);
            return;
        }

        let removed_in_start = start.offset + start_total - offset;
        let end_node = self.lines.node_at_offset(offset + length);
        if end_node == start_node {
            // removing up to the end of the last line
            self.set_line_length(start_node, start_total - length);
            return;
        }
        let end = self.lines.line(end_node);
        let left_in_end = end.offset + end.total_length() - (offset + length);

        let mut next = self.lines.next_node(start_node);
        while let Some(node) = next {
            next = self.lines.next_node(node);
            self.remove_line(node);
            if node == end_node {
                break;
            }
        }
        self.set_line_length(start_node, start_total - removed_in_start + left_in_end);
    }

    /// Account for `text` inserted at `offset`. The buffer already contains it.
    pub(crate) fn insert(&mut self, offset: usize, text: &str) {
        if text.is_empty() {
            return;
        }
        let mut node = self.lines.node_at_offset(offset);
        let line = self.lines.line(node);
        if offset > line.end_offset() {
            // inserting between the \r and \n of a \r\n delimiter
            self.set_line_length(node, line.total_length() - 1);
            let split = self.insert_line_after(node, 1);
            node = self.set_line_length(split, 1);
        }

        let mut last_delimiter_end = 0;
        while let Some((at, delimiter_length)) = next_line_break(text, last_delimiter_end) {
            let line_break_end = offset + at + delimiter_length;
            let line = self.lines.line(node);
            let length_after_insertion =
                line.offset + line.total_length() - (offset + last_delimiter_end);
            node = self.set_line_length(node, line_break_end - line.offset);
            let new_node = self.insert_line_after(node, length_after_insertion);
            node = self.set_line_length(new_node, length_after_insertion);
            last_delimiter_end = at + delimiter_length;
        }
        if last_delimiter_end != text.len() {
            let total = self.lines.line(node).total_length();
            self.set_line_length(node, total + text.len() - last_delimiter_end);
        }

        self.join_split_crlf(offset);
        self.join_split_crlf(offset + text.len());
    }

    /// Give a line a new total length and reclassify its delimiter from the
    /// buffer. A line left holding only the `\n` of a `\r\n` whose `\r` ends
    /// the previous line is merged into it. Returns the node that now holds
    /// the text.
    fn set_line_length(&mut self, node: u32, new_total: usize) -> u32 {
        let line = self.lines.line(node);
        if new_total != line.total_length() {
            self.notify(|tracker| tracker.reset_length(line.id, new_total));
            self.lines.set_total_length(node, new_total);
        }

        let delimiter_length = if new_total == 0 {
            0
        } else {
            match self.buffer.byte_at(line.offset + new_total - 1) {
                Some(b'\r') => 1,
                Some(b'\n') => {
                    let preceded_by_cr = line.offset + new_total >= 2
                        && self.buffer.byte_at(line.offset + new_total - 2) == Some(b'\r');
                    if new_total >= 2 && preceded_by_cr {
                        2
                    } else if new_total == 1 && preceded_by_cr {
                        if let Some(previous) = self.lines.previous_node(node) {
                            self.remove_line(node);
                            let previous_total = self.lines.line(previous).total_length();
                            return self.set_line_length(previous, previous_total + 1);
                        }
                        1
                    } else {
                        1
                    }
                }
                _ => 0,
            }
        };
        self.lines.set_delimiter_length(node, delimiter_length);
        node
    }

    fn insert_line_after(&mut self, node: u32, total: usize) -> u32 {
        let new_node = self.lines.insert_after(node, total);
        let original = self.lines.id(node);
        let new_line = self.lines.id(new_node);
        self.notify(|tracker| tracker.after_inserting(original, new_line));
        new_node
    }

    fn remove_line(&mut self, node: u32) {
        let id = self.lines.id(node);
        self.notify(|tracker| tracker.before_removing(id));
        self.lines.remove(node);
    }

    /// Merge the two lines meeting at `at` when a `\r` ends the first and the
    /// second is the lone `\n` that completes it.
    fn join_split_crlf(&mut self, at: usize) {
        if at == 0
            || self.buffer.byte_at(at - 1) != Some(b'\r')
            || self.buffer.byte_at(at) != Some(b'\n')
        {
            return;
        }
        let node = self.lines.node_at_offset(at);
        let line = self.lines.line(node);
        if line.offset == at {
            log::trace!("joining \\r\\n split across lines at {at}");
            self.set_line_length(node, line.total_length());
        }
    }

    fn notify(&self, mut call: impl FnMut(&mut dyn LineTracker)) {
        for tracker in self.trackers {
            call(&mut *tracker.borrow_mut());
        }
    }
}
