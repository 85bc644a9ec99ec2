//! Text buffer implementations.

use super::{EditorPosition, TextBuffer};
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// A note file on disk, loaded whole and written back whole.
///
/// Call [`TextBuffer::reload`] before editing to work on the current file
/// contents rather than the copy read at open time.
#[derive(Debug, Clone)]
pub struct FileBuffer {
    path: PathBuf,
    text: String,
}

impl FileBuffer {
    /// Opens `path`, treating a missing file as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let text = read_note(&path).await?;
        Ok(Self { path, text })
    }

    /// Returns the backing path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TextBuffer for FileBuffer {
    fn text(&self) -> &str {
        &self.text
    }

    fn set_text(&mut self, text: String) {
        self.text = text;
    }

    async fn save(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::OperationFailed {
                    operation: "create_note_dir".to_string(),
                    cause: e.to_string(),
                })?;
        }
        tokio::fs::write(&self.path, self.text.as_bytes())
            .await
            .map_err(|e| Error::OperationFailed {
                operation: "save_note".to_string(),
                cause: format!("{}: {e}", self.path.display()),
            })?;
        tracing::debug!(path = %self.path.display(), bytes = self.text.len(), "Saved note");
        Ok(())
    }

    async fn reload(&mut self) -> Result<()> {
        self.text = read_note(&self.path).await?;
        Ok(())
    }
}

/// Reads a note file, treating a missing file as empty.
async fn read_note(path: &Path) -> Result<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(Error::OperationFailed {
            operation: "open_note".to_string(),
            cause: format!("{}: {e}", path.display()),
        }),
    }
}

/// An in-memory buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryBuffer {
    text: String,
    saves: usize,
}

impl MemoryBuffer {
    /// Creates a buffer holding `text`.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            saves: 0,
        }
    }

    /// Number of times [`TextBuffer::save`] was called.
    #[must_use]
    pub const fn saves(&self) -> usize {
        self.saves
    }
}

impl TextBuffer for MemoryBuffer {
    fn text(&self) -> &str {
        &self.text
    }

    fn set_text(&mut self, text: String) {
        self.text = text;
    }

    async fn save(&mut self) -> Result<()> {
        self.saves += 1;
        Ok(())
    }

    async fn reload(&mut self) -> Result<()> {
        Ok(())
    }
}
