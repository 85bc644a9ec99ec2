//! Journal context assembly.
//!
//! Collects the newest notes from the daily, monthly and yearly folders plus
//! the most recently modified notes in the whole vault, and renders them into
//! the user message sent to the model.
//!
//! # Selection
//!
//! | Source | Sorted by | Kept |
//! |--------|-----------|------|
//! | Daily folder | creation time | 3 |
//! | Monthly folder | creation time | 1 |
//! | Yearly folder | creation time | 1 |
//! | Whole vault | modification time | 100 |
//!
//! A folder whose setting is empty, or that does not exist in the vault,
//! contributes nothing.

mod format;

pub use format::{format_local_date, format_notes_for_prompt, strip_code_blocks};

use crate::config::{DeluluConfig, SectionMatching};
use crate::models::{JournalSource, Location, NoteSort, RecentNote};
use crate::vault::{NoteFile, NoteSource};
use crate::Result;
use futures::{StreamExt, stream};
use std::cmp::Reverse;
use tracing::instrument;

/// Number of recently modified notes listed after the journal.
pub const RECENT_NOTES_LIMIT: usize = 100;

/// Upper bound on note reads in flight at once.
const MAX_CONCURRENT_READS: usize = 32;

/// Builds the journal context for one generation request.
pub struct ContextAssembler<'a, S: NoteSource> {
    source: &'a S,
    daily_location: String,
    monthly_location: String,
    yearly_location: String,
    section_matching: SectionMatching,
}

impl<'a, S: NoteSource> ContextAssembler<'a, S> {
    /// Creates an assembler reading folder settings from `config`.
    #[must_use]
    pub fn new(source: &'a S, config: &DeluluConfig) -> Self {
        Self {
            source,
            daily_location: config.daily_note_location.clone(),
            monthly_location: config.monthly_note_location.clone(),
            yearly_location: config.yearly_note_location.clone(),
            section_matching: config.section_matching,
        }
    }

    /// Returns the configured folder for a journal source.
    #[must_use]
    pub fn location_for(&self, source: JournalSource) -> &str {
        match source {
            JournalSource::Daily => &self.daily_location,
            JournalSource::Monthly => &self.monthly_location,
            JournalSource::Yearly => &self.yearly_location,
        }
    }

    /// Gathers the journal and recent notes and renders the user message.
    #[instrument(skip(self), fields(operation = "gather_context"))]
    pub async fn gather_context(&self) -> Result<String> {
        let journal = self.gather_journal().await?;
        let recent = self.recent_notes(RECENT_NOTES_LIMIT).await?;

        tracing::debug!(
            journal = journal.len(),
            recent = recent.len(),
            "Assembled journal context"
        );
        Ok(format_notes_for_prompt(&journal, &recent, self.section_matching))
    }

    /// Collects daily, then monthly, then yearly notes with code blocks removed.
    pub async fn gather_journal(&self) -> Result<Vec<RecentNote>> {
        let mut journal = Vec::new();

        for &source in JournalSource::all() {
            let location = self.location_for(source);
            if location.is_empty() {
                tracing::debug!(source = %source, "Journal folder not configured, skipping");
                continue;
            }

            let notes = self
                .notes_from_location(
                    &Location::folder(location),
                    source.note_limit(),
                    NoteSort::Created,
                )
                .await?;
            journal.extend(notes.into_iter().map(|note| note.with_source(source)));
        }

        for note in &mut journal {
            if let Some(content) = note.content.as_mut() {
                *content = strip_code_blocks(content);
            }
        }

        Ok(journal)
    }

    /// Lists up to `count` notes under `location`, newest first by `sort`.
    ///
    /// Notes are ordered and truncated on their listed timestamps before any
    /// content is read; the survivors are read concurrently. A note that
    /// cannot be read is kept without content.
    pub async fn notes_from_location(
        &self,
        location: &Location,
        count: usize,
        sort: NoteSort,
    ) -> Result<Vec<RecentNote>> {
        let files = self.list_location(location, count, sort).await?;

        let notes = stream::iter(files)
            .map(|file| async move {
                let note = RecentNote::new(file.basename.clone(), file.ctime, file.mtime);
                match self.source.read(&file).await {
                    Ok(content) => note.with_content(content),
                    Err(e) => {
                        tracing::warn!(
                            path = %file.path,
                            error = %e,
                            "Skipping unreadable note content"
                        );
                        note
                    },
                }
            })
            .buffered(MAX_CONCURRENT_READS)
            .collect()
            .await;

        Ok(notes)
    }

    /// Lists up to `count` notes from the whole vault by modification time,
    /// without reading their content.
    pub async fn recent_notes(&self, count: usize) -> Result<Vec<RecentNote>> {
        let files = self
            .list_location(&Location::All, count, NoteSort::Modified)
            .await?;
        Ok(files
            .into_iter()
            .map(|file| RecentNote::new(file.basename, file.ctime, file.mtime))
            .collect())
    }

    async fn list_location(
        &self,
        location: &Location,
        count: usize,
        sort: NoteSort,
    ) -> Result<Vec<NoteFile>> {
        let mut files = self.source.list_notes().await?;

        if let Location::Folder(prefix) = location {
            if prefix.is_empty() {
                return Ok(Vec::new());
            }
            if !self.source.exists(prefix).await? {
                tracing::debug!(location = %prefix, "Journal folder does not exist in vault");
                return Ok(Vec::new());
            }
            files.retain(|file| file.path.starts_with(prefix.as_str()));
        }

        files.sort_by_key(|file| Reverse(file.timestamp(sort)));
        files.truncate(count);
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::MemoryVault;

    fn config() -> DeluluConfig {
        let mut config = DeluluConfig::default();
        config.daily_note_location = "Journal/Daily".to_string();
        config.monthly_note_location = "Journal/Monthly".to_string();
        config.yearly_note_location = "Journal/Yearly".to_string();
        config
    }

    fn vault() -> MemoryVault {
        MemoryVault::new()
            .with_note("Journal/Daily/d1.md", 100, 900, "one")
            .with_note("Journal/Daily/d2.md", 200, 800, "two")
            .with_note("Journal/Daily/d3.md", 300, 700, "three")
            .with_note("Journal/Daily/d4.md", 400, 600, "four")
            .with_note("Journal/Monthly/2024-05 Monthly.md", 50, 50, "may")
            .with_note("Journal/Monthly/2024-06 Monthly.md", 60, 60, "june")
            .with_note("Journal/Yearly/2024 Yearly.md", 10, 10, "year")
            .with_note("Projects/garden.md", 5, 1000, "tomatoes")
    }

    fn titles(notes: &[RecentNote]) -> Vec<&str> {
        notes.iter().map(|n| n.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_per_folder_truncation() {
        let vault = vault();
        let config = config();
        let assembler = ContextAssembler::new(&vault, &config);

        let journal = assembler.gather_journal().await.unwrap();
        assert_eq!(
            titles(&journal),
            vec!["d4", "d3", "d2", "2024-06 Monthly", "2024 Yearly"]
        );
        assert_eq!(journal[0].source, Some(JournalSource::Daily));
        assert_eq!(journal[3].source, Some(JournalSource::Monthly));
        assert_eq!(journal[4].source, Some(JournalSource::Yearly));
    }

    #[tokio::test]
    async fn test_empty_settings_contribute_nothing() {
        let vault = vault();
        let config = DeluluConfig::default();
        let assembler = ContextAssembler::new(&vault, &config);

        assert!(assembler.gather_journal().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_folder_is_empty_not_error() {
        let vault = vault();
        let mut config = DeluluConfig::default();
        config.daily_note_location = "Journal/Weekly".to_string();
        let assembler = ContextAssembler::new(&vault, &config);

        assert!(assembler.gather_journal().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_recent_listing_sorted_by_mtime() {
        let vault = vault();
        let config = config();
        let assembler = ContextAssembler::new(&vault, &config);

        let recent = assembler
            .notes_from_location(&Location::All, 3, NoteSort::Modified)
            .await
            .unwrap();
        assert_eq!(titles(&recent), vec!["garden", "d1", "d2"]);
        assert_eq!(recent[0].content.as_deref(), Some("tomatoes"));
        assert_eq!(recent[0].source, None);
    }

    #[tokio::test]
    async fn test_journal_strips_code_blocks() {
        let vault = MemoryVault::new().with_note(
            "Daily/today.md",
            1,
            1,
            "before\n```rust\nfn main() {}\n```\nafter",
        );
        let mut config = DeluluConfig::default();
        config.daily_note_location = "Daily".to_string();
        let assembler = ContextAssembler::new(&vault, &config);

        let journal = assembler.gather_journal().await.unwrap();
        assert_eq!(journal[0].content.as_deref(), Some("before\n\nafter"));
    }

    #[tokio::test]
    async fn test_prefix_match_is_raw_string_prefix() {
        let vault = MemoryVault::new()
            .with_note("Daily/a.md", 1, 1, "a")
            .with_note("Daily Archive/b.md", 2, 2, "b");
        let mut config = DeluluConfig::default();
        config.daily_note_location = "Daily".to_string();
        let assembler = ContextAssembler::new(&vault, &config);

        let journal = assembler.gather_journal().await.unwrap();
        assert_eq!(titles(&journal), vec!["b", "a"]);
    }

    /// Vault whose reads fail for one path.
    struct BrokenReads {
        inner: MemoryVault,
        broken: &'static str,
    }

    impl NoteSource for BrokenReads {
        async fn list_notes(&self) -> Result<Vec<NoteFile>> {
            self.inner.list_notes().await
        }

        async fn exists(&self, path: &str) -> Result<bool> {
            self.inner.exists(path).await
        }

        async fn read(&self, note: &NoteFile) -> Result<String> {
            if note.path == self.broken {
                return Err(crate::Error::OperationFailed {
                    operation: "read_note".to_string(),
                    cause: "stream did not contain valid UTF-8".to_string(),
                });
            }
            self.inner.read(note).await
        }
    }

    #[tokio::test]
    async fn test_recent_listing_does_not_read_content() {
        let vault = BrokenReads {
            inner: vault(),
            broken: "Projects/garden.md",
        };
        let config = config();
        let assembler = ContextAssembler::new(&vault, &config);

        let recent = assembler.recent_notes(2).await.unwrap();
        assert_eq!(titles(&recent), vec!["garden", "d1"]);
        assert!(recent.iter().all(|note| note.content.is_none()));

        let context = assembler.gather_context().await.unwrap();
        assert!(context.contains("- garden (Modified: "));
    }

    #[tokio::test]
    async fn test_unreadable_journal_note_keeps_title() {
        let vault = BrokenReads {
            inner: vault(),
            broken: "Journal/Daily/d4.md",
        };
        let config = config();
        let assembler = ContextAssembler::new(&vault, &config);

        let journal = assembler.gather_journal().await.unwrap();
        assert_eq!(titles(&journal)[..3], ["d4", "d3", "d2"]);
        assert_eq!(journal[0].content, None);
        assert_eq!(journal[1].content.as_deref(), Some("three"));
    }
}
