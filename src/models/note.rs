//! Note snapshot type.

use super::JournalSource;

/// A snapshot of one vault note.
///
/// Timestamps are milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentNote {
    /// File name without extension.
    pub title: String,
    /// Creation time.
    pub ctime: i64,
    /// Last modification time.
    pub mtime: i64,
    /// Body text, absent until loaded.
    pub content: Option<String>,
    /// Journal folder this note was fetched from, if any.
    pub source: Option<JournalSource>,
}

impl RecentNote {
    /// Creates a note without content.
    #[must_use]
    pub fn new(title: impl Into<String>, ctime: i64, mtime: i64) -> Self {
        Self {
            title: title.into(),
            ctime,
            mtime,
            content: None,
            source: None,
        }
    }

    /// Sets the content.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Tags the note with the journal folder it came from.
    #[must_use]
    pub const fn with_source(mut self, source: JournalSource) -> Self {
        self.source = Some(source);
        self
    }
}
