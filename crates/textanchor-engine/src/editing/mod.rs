/*!
 * # Editing Core
 *
 * The positional data model behind a text editor: a mutable buffer and two
 * indexes that stay consistent with it across every edit.
 *
 * ## Architecture Overview
 *
 * ### 1. Single Source of Truth: xi-rope Buffer
 * - The whole document lives in one **`xi_rope::Rope`**
 * - Edits are compiled into **Deltas** and applied, O(log n) each
 * - Offsets everywhere are UTF-8 byte offsets on character boundaries
 *
 * ### 2. Line Index
 * - One balanced-tree node per line, aggregating line counts and lengths
 * - Line number to offset and back in O(log n)
 * - `\n`, `\r\n` and a lone `\r` all end a line; `\r\n` is never split
 *   across two lines
 * - **Line trackers** are told about every line that is split off, merged
 *   away or resized, and about every committed change
 *
 * ### 3. Anchors
 * - Caller-held positions that follow the text through edits
 * - Stored as distances from the previous anchor so an edit rewrites only
 *   the anchors it touches
 * - Tie-breaks at an insertion point follow each anchor's
 *   [`AnchorMovement`]; anchors inside removed text are deleted unless they
 *   survive deletion
 * - Dropped anchors are reclaimed without an explicit free
 *
 * ### 4. Changes
 * - Every edit is reported as a [`DocumentChange`]: offset, removed text,
 *   inserted text and [`EditMode`], enough to invert it
 * - [`ChangeDescriptor`]s describe how positions move through it
 *
 * ## Module Structure
 *
 * - **`document`**: the [`Document`] facade
 * - **`text_buffer`**: rope wrapper
 * - **`line_tree`** / **`line_manager`**: the line index and its incremental update
 * - **`anchors`**: the anchor index and [`Anchor`] handles
 * - **`change_offset`** / **`change`**: offset mapping and change records
 * - **`listener`** / **`view`**: the tracker contract and read-only view
 * - **`treap`**: the balanced tree both indexes are built on
 *
 * ## Usage Pattern
 *
 * ```rust
 * use textanchor_engine::editing::*;
 *
 * let mut doc = Document::from_text("fn main() {\r\n}\r\n");
 * let brace = doc.create_anchor(10).unwrap();
 *
 * doc.insert(0, "// entry point\n").unwrap();
 * assert_eq!(brace.offset(), 25);
 * assert_eq!(doc.location_of(brace.offset()).unwrap(), TextLocation::new(2, 11));
 *
 * doc.remove(15, 11).unwrap();
 * assert!(brace.is_deleted());
 * ```
 */

mod anchors;
mod change;
mod change_offset;
mod document;
mod line_manager;
mod line_tree;
mod listener;
mod text_buffer;
mod treap;
mod view;

pub use anchors::{Anchor, DEFAULT_SWEEP_THRESHOLD};
pub use change::{DocumentChange, EditMode};
pub use change_offset::{AnchorMovement, ChangeDescriptor, MappedOffset, map_offset};
pub use document::{Document, DocumentOptions};
pub use line_tree::{DocumentLine, LineId};
pub use listener::LineTracker;
pub use view::{DocumentView, TextLocation};
