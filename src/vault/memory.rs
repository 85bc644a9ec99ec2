//! In-memory vault.

use super::{NoteFile, NoteSource, is_markdown};
use crate::{Error, Result};
use std::collections::BTreeMap;

/// A vault held entirely in memory.
///
/// Used by tests and by callers that already have note text at hand.
#[derive(Debug, Clone, Default)]
pub struct MemoryVault {
    notes: BTreeMap<String, (NoteFile, String)>,
}

impl MemoryVault {
    /// Creates an empty vault.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a note.
    pub fn insert(
        &mut self,
        path: impl Into<String>,
        ctime: i64,
        mtime: i64,
        content: impl Into<String>,
    ) {
        let file = NoteFile::new(path, ctime, mtime);
        self.notes.insert(file.path.clone(), (file, content.into()));
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with_note(
        mut self,
        path: impl Into<String>,
        ctime: i64,
        mtime: i64,
        content: impl Into<String>,
    ) -> Self {
        self.insert(path, ctime, mtime, content);
        self
    }

    /// Returns the number of notes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Returns true if the vault holds no notes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

impl NoteSource for MemoryVault {
    async fn list_notes(&self) -> Result<Vec<NoteFile>> {
        Ok(self
            .notes
            .values()
            .filter(|(file, _)| is_markdown(&file.path))
            .map(|(file, _)| file.clone())
            .collect())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let path = path.trim_end_matches('/');
        if path.is_empty() {
            return Ok(true);
        }
        let folder = format!("{path}/");
        Ok(self
            .notes
            .keys()
            .any(|key| key == path || key.starts_with(&folder)))
    }

    async fn read(&self, note: &NoteFile) -> Result<String> {
        self.notes
            .get(&note.path)
            .map(|(_, content)| content.clone())
            .ok_or_else(|| Error::OperationFailed {
                operation: "read_note".to_string(),
                cause: format!("{}: not found", note.path),
            })
    }
}
