//! Generate CLI command.

// CLI commands are allowed to use println! for output
#![allow(clippy::print_stdout)]

use crate::config::DeluluConfig;
use crate::editor::{EditorPosition, FileBuffer, TextBuffer};
use crate::llm::OpenAiClient;
use crate::services::{GenerationOutcome, GenerationService, StderrNotifier};
use crate::vault::FsVault;
use secrecy::ExposeSecret;
use std::path::{Path, PathBuf};

/// Resolves the target note: relative paths are taken inside the vault.
#[must_use]
pub fn resolve_note_path(vault: &Path, note: &Path) -> PathBuf {
    if note.is_absolute() {
        note.to_path_buf()
    } else {
        vault.join(note)
    }
}

/// Turns optional `--line`/`--ch` flags into a cursor.
///
/// No flags means the end of the document; a line without a column means the
/// end of that line.
#[must_use]
pub fn resolve_cursor(text: &str, line: Option<usize>, ch: Option<usize>) -> EditorPosition {
    match (line, ch) {
        (None, None) => EditorPosition::end_of(text),
        (Some(line), ch) => EditorPosition::new(line, ch.unwrap_or(usize::MAX)),
        (None, Some(ch)) => EditorPosition::new(EditorPosition::end_of(text).line, ch),
    }
}

/// Generate command.
pub async fn cmd_generate(
    config: &DeluluConfig,
    vault: &Path,
    note: &Path,
    line: Option<usize>,
    ch: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let note_path = resolve_note_path(vault, note);
    let mut buffer = FileBuffer::open(&note_path).await?;
    let cursor = resolve_cursor(buffer.text(), line, ch);

    if config.api_key.expose_secret().is_empty() {
        tracing::warn!("No API key configured; set one with `delulu config set apiKey <key>`");
    }

    let source = FsVault::new(vault);
    let client = OpenAiClient::from_config(config);
    let notifier = StderrNotifier;
    let service = GenerationService::new(config, &source, &client, &notifier);

    match service.generate(&mut buffer, cursor).await {
        GenerationOutcome::Delivered { position, text } => {
            println!(
                "Inserted {} characters at {position} in {}",
                text.chars().count(),
                note_path.display()
            );
            Ok(())
        },
        GenerationOutcome::Failed { error, .. } => Err(error.into()),
    }
}
