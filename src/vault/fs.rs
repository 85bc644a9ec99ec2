//! Filesystem-backed vault.

use super::{NoteFile, NoteSource, is_markdown};
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;

/// A vault rooted at a directory on disk.
///
/// Hidden entries (names starting with `.`) are skipped, which keeps editor
/// metadata folders out of the listing.
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    /// Creates a vault rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, relative: &str) -> PathBuf {
        relative
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |path, part| path.join(part))
    }

    /// Lists one directory, queueing subdirectories onto `pending`.
    async fn scan_dir(
        dir: &Path,
        prefix: &str,
        pending: &mut Vec<(PathBuf, String)>,
        notes: &mut Vec<NoteFile>,
    ) -> std::io::Result<()> {
        let mut entries = fs::read_dir(dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            let relative = format!("{prefix}{name}");
            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(e) => {
                    tracing::warn!(
                        path = %entry.path().display(),
                        error = %e,
                        "Skipping unreadable vault entry"
                    );
                    continue;
                },
            };

            if metadata.is_dir() {
                pending.push((entry.path(), format!("{relative}/")));
            } else if metadata.is_file() && is_markdown(&relative) {
                let mtime = metadata.modified().map_or(0, to_millis);
                // Not every filesystem records birth time.
                let ctime = metadata.created().map_or(mtime, to_millis);
                notes.push(NoteFile::new(relative, ctime, mtime));
            }
        }

        Ok(())
    }
}

impl NoteSource for FsVault {
    /// Walks the vault.
    ///
    /// Only an unreadable root is an error; unreadable subdirectories are
    /// logged and skipped.
    async fn list_notes(&self) -> Result<Vec<NoteFile>> {
        let mut notes = Vec::new();
        let mut pending = Vec::new();

        Self::scan_dir(&self.root, "", &mut pending, &mut notes)
            .await
            .map_err(|e| io_error("list_vault", &self.root, &e))?;

        while let Some((dir, prefix)) = pending.pop() {
            if let Err(e) = Self::scan_dir(&dir, &prefix, &mut pending, &mut notes).await {
                tracing::warn!(
                    path = %dir.display(),
                    error = %e,
                    "Skipping unreadable vault folder"
                );
            }
        }

        tracing::debug!(root = %self.root.display(), count = notes.len(), "Listed vault notes");
        Ok(notes)
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let full = self.resolve(path);
        fs::try_exists(&full)
            .await
            .map_err(|e| io_error("check_path", &full, &e))
    }

    /// Reads a note, replacing invalid UTF-8 with U+FFFD.
    async fn read(&self, note: &NoteFile) -> Result<String> {
        let full = self.resolve(&note.path);
        let bytes = fs::read(&full)
            .await
            .map_err(|e| io_error("read_note", &full, &e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn to_millis(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

fn io_error(operation: &str, path: &Path, e: &std::io::Error) -> Error {
    Error::OperationFailed {
        operation: operation.to_string(),
        cause: format!("{}: {e}", path.display()),
    }
}
