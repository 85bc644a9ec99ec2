//! # Delulu
//!
//! Daily horoscopes conjured from your recent journal notes.
//!
//! Delulu reads the most recent daily, monthly and yearly notes from a markdown
//! vault, renders them into a prompt, asks a chat-completion endpoint for a
//! personalized horoscope and splices the answer into a note at the cursor.
//!
//! ## Pipeline
//!
//! ```text
//! NoteSource ──► ContextAssembler ──► prompt ──┐
//!                                              ├──► CompletionProvider ──► TextBuffer
//! settings ──► SystemMessage (template) ───────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use delulu::{DeluluConfig, FsVault, GenerationService, OpenAiClient};
//!
//! let config = DeluluConfig::load_default();
//! let vault = FsVault::new("/path/to/vault");
//! let client = OpenAiClient::from_config(&config);
//! let service = GenerationService::new(&config, &vault, &client, &notifier);
//! let outcome = service.generate(&mut buffer, cursor).await;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod cli;
pub mod config;
pub mod context;
pub mod editor;
pub mod llm;
pub mod models;
pub mod observability;
pub mod rendering;
pub mod services;
pub mod vault;

// Re-exports for convenience
pub use config::{DeluluConfig, SectionMatching};
pub use context::ContextAssembler;
pub use editor::{EditorPosition, FileBuffer, MemoryBuffer, TextBuffer};
pub use llm::{CompletionProvider, OpenAiClient};
pub use models::{JournalSource, Location, NoteSort, RecentNote};
pub use rendering::{Binding, Bindings, SystemMessage, UnknownPlaceholderPolicy};
pub use services::{
    GenerationOutcome, GenerationService, Notifier, PendingGeneration, RecordingNotifier,
    StderrNotifier,
};
pub use vault::{FsVault, MemoryVault, NoteFile, NoteSource};

/// Error type for delulu operations.
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Unknown config key, bad `config set` value, placeholder missing at delivery |
/// | `OperationFailed` | Vault I/O, config file I/O, network or non-JSON completion response |
/// | `UnexpectedResponse` | Completion JSON lacks `choices[0].message.content` |
/// | `UnknownPlaceholder` | System message references a `{{name}}` outside the binding set |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - Vault files cannot be listed or read
    /// - The config file cannot be read, parsed or written
    /// - The completion request fails in transport or the body is not JSON
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// The completion endpoint answered with JSON of the wrong shape.
    #[error("Unexpected response structure from API: {0}")]
    UnexpectedResponse(String),

    /// A template placeholder names no known binding.
    #[error("unknown template variable: {0}")]
    UnknownPlaceholder(String),
}

/// Result type alias for delulu operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current Unix timestamp in milliseconds.
///
/// Falls back to 0 if the system clock is before the Unix epoch.
#[must_use]
pub fn current_timestamp_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
