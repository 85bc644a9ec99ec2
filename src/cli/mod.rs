//! CLI command implementations.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `generate` | Conjure a horoscope into a note at a cursor position |
//! | `context` | Print the journal context sent as the user message |
//! | `system-message` | Print the rendered system message |
//! | `config` | Show, change or locate persisted settings |
//!
//! # Example Usage
//!
//! ```bash
//! delulu config set dailyNoteLocation "Journal/Daily"
//! delulu generate --vault ~/Notes "Journal/Daily/2024-06-01.md" --line 3 --ch 0
//! ```

mod config;
mod context;
mod generate;

pub use config::{
    ConfigAction, cmd_config, persist_setting, render_settings, resolve_config_path,
};
pub use context::{cmd_context, cmd_system_message};
pub use generate::{cmd_generate, resolve_cursor, resolve_note_path};
