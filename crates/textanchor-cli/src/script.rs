//! Edit script parsing.
//!
//! One command per line, arguments separated by whitespace. Text arguments
//! run to the end of the line and understand `\n`, `\r`, `\t`, `\s` (space)
//! and `\\` escapes. Blank lines and lines starting with `#` are skipped.
//!
//! ```text
//! anchor brace 10 after survive
//! insert 0 // entry point\n
//! replace 0 4 replace-characters \t
//! remove 15 11
//! begin
//! insert 0 x
//! end
//! undo
//! print
//! save out.txt
//! ```

use anyhow::{Context, Result, anyhow, bail};
use std::path::PathBuf;
use textanchor_engine::{AnchorMovement, EditMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Insert {
        offset: usize,
        text: String,
    },
    Remove {
        offset: usize,
        length: usize,
    },
    Replace {
        offset: usize,
        length: usize,
        mode: EditMode,
        text: String,
    },
    Anchor {
        name: String,
        offset: usize,
        movement: AnchorMovement,
        survives_deletion: bool,
    },
    Begin,
    End,
    Undo,
    Sweep,
    Print,
    Save(PathBuf),
}

/// Parse a whole script. Errors name the 1-based line they came from.
pub fn parse_script(source: &str) -> Result<Vec<Command>> {
    source
        .lines()
        .enumerate()
        .filter_map(|(index, line)| {
            parse_line(line)
                .with_context(|| format!("line {}: {line:?}", index + 1))
                .transpose()
        })
        .collect()
}

/// Parse one line; `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str) -> Result<Option<Command>> {
    let line = line.trim_start();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (keyword, rest) = split_word(line);

    let command = match keyword {
        "insert" => {
            let (offset, text) = split_word(rest);
            Command::Insert {
                offset: number(offset, "offset")?,
                text: unescape(text)?,
            }
        }
        "remove" => {
            let mut words = rest.split_whitespace();
            let offset = number(words.next().unwrap_or_default(), "offset")?;
            let length = number(words.next().unwrap_or_default(), "length")?;
            Command::Remove { offset, length }
        }
        "replace" => {
            let (offset, rest) = split_word(rest);
            let (length, rest) = split_word(rest);
            let (mode, text) = split_word(rest);
            Command::Replace {
                offset: number(offset, "offset")?,
                length: number(length, "length")?,
                mode: edit_mode(mode)?,
                text: unescape(text)?,
            }
        }
        "anchor" => {
            let mut words = rest.split_whitespace();
            let name = words
                .next()
                .ok_or_else(|| anyhow!("anchor needs a name"))?
                .to_string();
            let offset = number(words.next().unwrap_or_default(), "offset")?;
            let mut movement = AnchorMovement::Default;
            let mut survives_deletion = false;
            for word in words {
                match word {
                    "default" => movement = AnchorMovement::Default,
                    "before" => movement = AnchorMovement::BeforeInsertion,
                    "after" => movement = AnchorMovement::AfterInsertion,
                    "survive" => survives_deletion = true,
                    other => bail!("unknown anchor option '{other}'"),
                }
            }
            Command::Anchor {
                name,
                offset,
                movement,
                survives_deletion,
            }
        }
        "begin" => Command::Begin,
        "end" => Command::End,
        "undo" => Command::Undo,
        "sweep" => Command::Sweep,
        "print" => Command::Print,
        "save" => {
            let path = rest.trim();
            if path.is_empty() {
                bail!("save needs a path");
            }
            Command::Save(PathBuf::from(path))
        }
        other => bail!("unknown command '{other}'"),
    };
    Ok(Some(command))
}

/// First whitespace-separated word and the remainder after one separator.
fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(at) => {
            let separator = text[at..].chars().next().map_or(1, char::len_utf8);
            (&text[..at], &text[at + separator..])
        }
        None => (text, ""),
    }
}

fn number(word: &str, what: &str) -> Result<usize> {
    if word.is_empty() {
        bail!("missing {what}");
    }
    word.parse()
        .with_context(|| format!("{what} '{word}' is not a number"))
}

fn edit_mode(word: &str) -> Result<EditMode> {
    match word {
        "normal" => Ok(EditMode::Normal),
        "remove-then-insert" => Ok(EditMode::RemoveThenInsert),
        "replace-characters" => Ok(EditMode::ReplaceCharacters),
        "" => bail!("missing edit mode"),
        other => bail!("unknown edit mode '{other}'"),
    }
}

pub fn unescape(text: &str) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('s') => out.push(' '),
            Some('\\') => out.push('\\'),
            Some(other) => bail!("unknown escape '\\{other}'"),
            None => bail!("dangling '\\' at end of text"),
        }
    }
    Ok(out)
}
