use crate::editing::{Document, DocumentOptions};
use crate::error::EditError;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid document: {0}")]
    Edit(#[from] EditError),
}

/// Read a file into a new document
pub fn read_document(path: &Path) -> Result<Document, IoError> {
    read_document_with(path, DocumentOptions::default())
}

/// Read a file into a new document with the given options
pub fn read_document_with(path: &Path, options: DocumentOptions) -> Result<Document, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    let bytes = fs::read(path)?;
    let text = std::str::from_utf8(&bytes).map_err(EditError::from)?;
    log::debug!("loaded {} ({} bytes)", path.display(), bytes.len());
    Ok(Document::with_options(text, options))
}

/// Write a document's bytes to a file, verbatim
pub fn write_document(path: &Path, document: &Document) -> Result<(), IoError> {
    // Create parent directories if they don't exist
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, document.to_bytes())?;
    Ok(())
}
