//! Data models for delulu.
//!
//! Value types shared by the vault, the context assembler and the CLI.

mod journal;
mod note;

pub use journal::{JournalSource, Location, NoteSort};
pub use note::RecentNote;
