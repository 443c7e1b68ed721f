//! Replays parsed commands against a document and renders its state.

use anyhow::{Context, Result, bail};
use std::cell::RefCell;
use std::fmt::Write as _;
use std::rc::Rc;
use textanchor_engine::{
    Anchor, AnchorMovement, Document, DocumentChange, DocumentView, LineTracker, io,
};

use crate::script::Command;

/// Keeps every committed change so the session can undo them.
#[derive(Default)]
struct History {
    changes: Vec<DocumentChange>,
}

impl LineTracker for History {
    fn after_change(&mut self, _document: &dyn DocumentView, changes: &[DocumentChange]) {
        self.changes.extend_from_slice(changes);
    }
}

pub struct Session {
    document: Document,
    anchors: Vec<(String, Anchor)>,
    history: Rc<RefCell<History>>,
    output: String,
}

impl Session {
    pub fn new(mut document: Document) -> Self {
        let history = Rc::new(RefCell::new(History::default()));
        document.add_line_tracker(history.clone());
        Self {
            document,
            anchors: Vec::new(),
            history,
            output: String::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Everything printed so far.
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn run(&mut self, commands: &[Command]) -> Result<()> {
        for (index, command) in commands.iter().enumerate() {
            self.execute(command)
                .with_context(|| format!("command {} ({command:?}) failed", index + 1))?;
        }
        if self.document.is_updating() {
            log::warn!("script ended inside a batch, closing it");
            while self.document.is_updating() {
                self.document.end_update()?;
            }
        }
        Ok(())
    }

    pub fn execute(&mut self, command: &Command) -> Result<()> {
        log::debug!("executing {command:?}");
        match command {
            Command::Insert { offset, text } => self.document.insert(*offset, text)?,
            Command::Remove { offset, length } => self.document.remove(*offset, *length)?,
            Command::Replace {
                offset,
                length,
                mode,
                text,
            } => self.document.replace(*offset, *length, text, *mode)?,
            Command::Anchor {
                name,
                offset,
                movement,
                survives_deletion,
            } => {
                let anchor =
                    self.document
                        .create_anchor_with(*offset, *movement, *survives_deletion)?;
                self.anchors.retain(|(existing, _)| existing != name);
                self.anchors.push((name.clone(), anchor));
            }
            Command::Begin => self.document.begin_update(),
            Command::End => self.document.end_update()?,
            Command::Undo => self.undo()?,
            Command::Sweep => {
                let removed = self.document.sweep_anchors();
                log::info!("sweep reclaimed {removed} anchors");
            }
            Command::Print => {
                let rendered = self.render()?;
                self.output.push_str(&rendered);
            }
            Command::Save(path) => io::write_document(path, &self.document)
                .with_context(|| format!("saving {}", path.display()))?,
        }
        Ok(())
    }

    /// Revert the most recent change that has been reported.
    fn undo(&mut self) -> Result<()> {
        if self.document.is_updating() {
            bail!("cannot undo inside a batch");
        }
        let Some(change) = self.history.borrow().changes.last().cloned() else {
            bail!("nothing to undo");
        };
        self.document.apply_change(&change.inverse())?;
        // drop the inverse, recorded by the tracker, and the change it undid
        let mut history = self.history.borrow_mut();
        history.changes.pop();
        history.changes.pop();
        Ok(())
    }

    /// Lines with their delimiters, then every named anchor.
    pub fn render(&self) -> Result<String> {
        let mut out = String::new();
        writeln!(
            out,
            "{} bytes, {} lines, version {}",
            self.document.len(),
            self.document.line_count(),
            self.document.version()
        )?;
        for line in self.document.lines() {
            let delimiter = self
                .document
                .text_range(line.end_offset(), line.delimiter_length)?;
            let delimiter = match delimiter.as_str() {
                "\r\n" => " CRLF",
                "\n" => " LF",
                "\r" => " CR",
                _ => "",
            };
            writeln!(
                out,
                "{:>4} @{:<5} {:?}{delimiter}",
                line.line_number,
                line.offset,
                self.document.line_text(&line)?
            )?;
        }
        for (name, anchor) in &self.anchors {
            let movement = match anchor.movement() {
                AnchorMovement::Default => "default",
                AnchorMovement::BeforeInsertion => "before",
                AnchorMovement::AfterInsertion => "after",
            };
            if anchor.is_deleted() {
                writeln!(out, "  {name} @{} deleted", anchor.offset())?;
            } else {
                let location = self.document.anchor_location(anchor)?;
                writeln!(out, "  {name} @{} {location} {movement}", anchor.offset())?;
            }
        }
        Ok(out)
    }
}
