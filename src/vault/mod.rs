//! Note source abstraction.
//!
//! A vault is a directory tree of markdown notes. The context assembler only
//! needs three capabilities from it: list every note with its timestamps,
//! check whether a folder exists, and read a note's text.

mod fs;
mod memory;

pub use fs::FsVault;
pub use memory::MemoryVault;

use crate::Result;
use crate::models::NoteSort;
use std::future::Future;

/// A markdown note known to a vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteFile {
    /// Vault-relative path with `/` separators, e.g. `Journal/Daily/2024-06-14.md`.
    pub path: String,
    /// File name without extension.
    pub basename: String,
    /// Creation time in milliseconds since the Unix epoch.
    pub ctime: i64,
    /// Modification time in milliseconds since the Unix epoch.
    pub mtime: i64,
}

impl NoteFile {
    /// Creates a note file, deriving the basename from the path.
    #[must_use]
    pub fn new(path: impl Into<String>, ctime: i64, mtime: i64) -> Self {
        let path = path.into();
        let basename = basename_of(&path).to_string();
        Self {
            path,
            basename,
            ctime,
            mtime,
        }
    }

    /// Returns the timestamp selected by `sort`.
    #[must_use]
    pub const fn timestamp(&self, sort: NoteSort) -> i64 {
        match sort {
            NoteSort::Created => self.ctime,
            NoteSort::Modified => self.mtime,
        }
    }
}

/// Trait for note sources.
///
/// Implementations are read-only from delulu's point of view.
pub trait NoteSource: Send + Sync {
    /// Lists every markdown note in the vault.
    fn list_notes(&self) -> impl Future<Output = Result<Vec<NoteFile>>> + Send;

    /// Checks whether a vault-relative path exists.
    fn exists(&self, path: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Reads the full text of a note.
    fn read(&self, note: &NoteFile) -> impl Future<Output = Result<String>> + Send;
}

/// Returns the file name of `path` with its final extension removed.
fn basename_of(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(dot) => &name[..dot],
    }
}

/// Returns true if `path` names a markdown note.
fn is_markdown(path: &str) -> bool {
    path.rsplit('/')
        .next()
        .and_then(|name| name.rsplit_once('.'))
        .is_some_and(|(stem, ext)| !stem.is_empty() && ext.eq_ignore_ascii_case("md"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basename() {
        assert_eq!(basename_of("Journal/Daily/2024-06-14.md"), "2024-06-14");
        assert_eq!(basename_of("Readme.md"), "Readme");
        assert_eq!(basename_of("a/b.c.md"), "b.c");
        assert_eq!(basename_of("a/.hidden"), ".hidden");
    }

    #[test]
    fn test_is_markdown() {
        assert!(is_markdown("Journal/today.md"));
        assert!(is_markdown("Journal/today.MD"));
        assert!(!is_markdown("Journal/image.png"));
        assert!(!is_markdown("Journal/.md"));
        assert!(!is_markdown("Journal/noext"));
    }

    #[test]
    fn test_note_file_basename() {
        let file = NoteFile::new("Yearly/2024 Yearly.md", 1, 2);
        assert_eq!(file.basename, "2024 Yearly");
        assert_eq!(file.timestamp(NoteSort::Created), 1);
        assert_eq!(file.timestamp(NoteSort::Modified), 2);
    }
}
