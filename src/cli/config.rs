//! Config CLI command.

// CLI commands are allowed to use println! for output
#![allow(clippy::print_stdout)]

use crate::config::DeluluConfig;
use crate::{Error, Result};
use clap::Subcommand;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Config subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum ConfigAction {
    /// Print every setting (the API key is masked).
    Show,
    /// Change one setting and save it.
    Set {
        /// Setting key, e.g. `dailyNoteLocation`.
        key: String,
        /// New value.
        value: String,
    },
    /// Print the configuration file path.
    Path,
}

/// Picks the file settings are read from and written to.
///
/// An explicit path wins, then `DELULU_CONFIG_PATH`, then the platform
/// default.
#[must_use]
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var("DELULU_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    DeluluConfig::default_path()
}

/// Formats settings one per line as `key = value`.
#[must_use]
pub fn render_settings(config: &DeluluConfig) -> String {
    let settings = config.describe();
    let width = settings.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut out = String::new();
    for (key, value) in settings {
        let shown = if value.is_empty() { "(empty)" } else { value.as_str() };
        let _ = writeln!(out, "{key:<width$} = {shown}");
    }
    out
}

/// Sets `key` in the file at `path` and writes it back.
///
/// Only the file contents are touched; environment overrides never leak
/// into the saved file. A missing file starts from defaults.
///
/// # Errors
///
/// Returns an error for an invalid key or value, or if the file cannot be
/// read or written.
pub fn persist_setting(path: &Path, key: &str, value: &str) -> Result<DeluluConfig> {
    let mut config = if path.exists() {
        DeluluConfig::load_from_file(path)?
    } else {
        DeluluConfig::default()
    };
    config.set(key, value)?;
    config.save_to_file(path)?;
    tracing::info!(key, path = %path.display(), "Setting saved");
    Ok(config)
}

/// Config command.
pub fn cmd_config(
    config: &DeluluConfig,
    action: ConfigAction,
    config_path: Option<&Path>,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let path = resolve_config_path(config_path);

    match action {
        ConfigAction::Show => {
            match &path {
                Some(path) if path.exists() => println!("Config file: {}", path.display()),
                Some(path) => println!("Config file: {} (not created yet)", path.display()),
                None => println!("Config file: (none - using defaults)"),
            }
            println!();
            print!("{}", render_settings(config));
        },
        ConfigAction::Set { key, value } => {
            let path = path.ok_or_else(|| {
                Error::InvalidInput("no configuration directory available".to_string())
            })?;
            persist_setting(&path, &key, &value)?;
            println!("Saved {key} to {}", path.display());
        },
        ConfigAction::Path => {
            let path = path.ok_or_else(|| {
                Error::InvalidInput("no configuration directory available".to_string())
            })?;
            println!("{}", path.display());
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_persist_setting_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("delulu").join("config.toml");

        persist_setting(&path, "dailyNoteLocation", "Journal/Daily").unwrap();
        persist_setting(&path, "horoscopeLength", "3").unwrap();

        let loaded = DeluluConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.daily_note_location, "Journal/Daily");
        assert_eq!(loaded.horoscope_length, 3);
        assert_eq!(loaded.model, crate::config::DEFAULT_MODEL);
    }

    #[test]
    fn test_persist_setting_rejects_unknown_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let err = persist_setting(&path, "favoriteColor", "blue").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_resolve_config_path_prefers_explicit() {
        let explicit = Path::new("/tmp/custom.toml");
        assert_eq!(
            resolve_config_path(Some(explicit)),
            Some(PathBuf::from("/tmp/custom.toml"))
        );
    }

    #[test]
    fn test_render_settings_masks_key() {
        let mut config = DeluluConfig::default();
        config.set("apiKey", "sk-secret-1234").unwrap();

        let rendered = render_settings(&config);
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("1234"));
        assert!(rendered.contains("systemMessage"));
        assert!(rendered.contains("(empty)"));
    }
}
