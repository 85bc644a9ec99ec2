//! Configuration management.
//!
//! Settings are loaded once at startup by merging a [`ConfigFile`] (every key
//! optional) over [`DeluluConfig::default`], one field at a time. Values that
//! are present are taken as-is. The `config set` command mutates one key and
//! writes the whole file back.

use crate::rendering::UnknownPlaceholderPolicy;
use crate::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default chat-completion endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Default model.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo-1106";

/// Allowed horoscope lengths, in paragraphs.
pub const HOROSCOPE_LENGTH_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// Main configuration for delulu.
#[derive(Debug, Clone)]
pub struct DeluluConfig {
    /// API key sent as a bearer token.
    pub api_key: SecretString,
    /// Chat-completion endpoint URL.
    pub endpoint: String,
    /// Model identifier.
    pub model: String,
    /// System message template. Empty means the built-in instruction.
    pub system_message: String,
    /// Vault folder holding daily notes. Empty disables it.
    pub daily_note_location: String,
    /// Vault folder holding monthly notes. Empty disables it.
    pub monthly_note_location: String,
    /// Vault folder holding yearly notes. Empty disables it.
    pub yearly_note_location: String,
    /// Maximum horoscope length in paragraphs (1-5).
    pub horoscope_length: u8,
    /// Personal details available to the system message template.
    pub personalization: Personalization,
    /// What to do with `{{name}}` placeholders that name no binding.
    pub unknown_placeholders: UnknownPlaceholderPolicy,
    /// How the month and year context sections pick their notes.
    pub section_matching: SectionMatching,
}

/// Personal details used by the system message template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Personalization {
    /// Western zodiac sign.
    pub zodiac_sign: String,
    /// Date of birth, `MM/DD/YYYY` or `YYYY-MM-DD`.
    pub date_of_birth: String,
    /// Time of birth.
    pub time_of_birth: String,
    /// Sun sign.
    pub sun_sign: String,
    /// Moon sign.
    pub moon_sign: String,
    /// Rising sign.
    pub rising_sign: String,
    /// Chinese zodiac animal.
    pub chinese_zodiac_animal: String,
    /// Element.
    pub element: String,
    /// Numerology numbers.
    pub numerology_numbers: String,
}

/// How the "Current Month Note" and "Current Year Note" sections select notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SectionMatching {
    /// Titles containing `Monthly` / `Yearly`, wherever the note came from.
    #[default]
    Title,
    /// Notes fetched from the monthly / yearly folder.
    Source,
}

impl SectionMatching {
    /// Parses a policy string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "title" => Some(Self::Title),
            "source" | "folder" => Some(Self::Source),
            _ => None,
        }
    }

    /// Returns the policy as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Source => "source",
        }
    }
}

/// Configuration file structure.
///
/// Keys use the same camelCase names as the settings surface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigFile {
    /// API key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Endpoint URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Model identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// System message template.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,
    /// Daily notes folder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_note_location: Option<String>,
    /// Monthly notes folder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_note_location: Option<String>,
    /// Yearly notes folder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yearly_note_location: Option<String>,
    /// Horoscope length in paragraphs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horoscope_length: Option<u8>,
    /// Zodiac sign.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zodiac_sign: Option<String>,
    /// Date of birth.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    /// Time of birth.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_of_birth: Option<String>,
    /// Sun sign.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sun_sign: Option<String>,
    /// Moon sign.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moon_sign: Option<String>,
    /// Rising sign.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rising_sign: Option<String>,
    /// Chinese zodiac animal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chinese_zodiac_animal: Option<String>,
    /// Element.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
    /// Numerology numbers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numerology_numbers: Option<String>,
    /// Unknown placeholder policy (`fail` or `literal`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unknown_placeholders: Option<String>,
    /// Section matching policy (`title` or `source`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_matching: Option<String>,
}

/// Every key accepted by [`DeluluConfig::set`], in display order.
pub const CONFIG_KEYS: &[&str] = &[
    "apiKey",
    "endpoint",
    "model",
    "systemMessage",
    "dailyNoteLocation",
    "monthlyNoteLocation",
    "yearlyNoteLocation",
    "horoscopeLength",
    "zodiacSign",
    "dateOfBirth",
    "timeOfBirth",
    "sunSign",
    "moonSign",
    "risingSign",
    "chineseZodiacAnimal",
    "element",
    "numerologyNumbers",
    "unknownPlaceholders",
    "sectionMatching",
];

impl Default for DeluluConfig {
    fn default() -> Self {
        Self {
            api_key: SecretString::from(String::new()),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            system_message: String::new(),
            daily_note_location: String::new(),
            monthly_note_location: String::new(),
            yearly_note_location: String::new(),
            horoscope_length: 1,
            personalization: Personalization::default(),
            unknown_placeholders: UnknownPlaceholderPolicy::default(),
            section_matching: SectionMatching::default(),
        }
    }
}

impl DeluluConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// Files ending in `.json` are read as JSON (the layout of a note app plugin
    /// `data.json`), anything else as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        let file = parse_config_file(path, &contents)?;
        tracing::debug!(path = %path.display(), "Loaded configuration file");
        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/delulu/` on macOS)
    /// 2. XDG config dir (`~/.config/delulu/` for Unix compatibility)
    ///
    /// Returns default configuration if no config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        for path in candidate_paths() {
            if !path.exists() {
                continue;
            }
            match Self::load_from_file(&path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable config file");
                },
            }
        }

        Self::default()
    }

    /// Returns the path new configuration is written to.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        candidate_paths().into_iter().find(|p| p.exists()).or_else(|| {
            directories::BaseDirs::new()
                .map(|dirs| dirs.config_dir().join("delulu").join("config.toml"))
        })
    }

    /// Converts a `ConfigFile` to `DeluluConfig`.
    #[must_use]
    pub fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(api_key) = file.api_key {
            config.api_key = SecretString::from(api_key);
        }
        if let Some(endpoint) = file.endpoint {
            config.endpoint = endpoint;
        }
        if let Some(model) = file.model {
            config.model = model;
        }
        if let Some(system_message) = file.system_message {
            config.system_message = system_message;
        }
        if let Some(location) = file.daily_note_location {
            config.daily_note_location = location;
        }
        if let Some(location) = file.monthly_note_location {
            config.monthly_note_location = location;
        }
        if let Some(location) = file.yearly_note_location {
            config.yearly_note_location = location;
        }
        if let Some(length) = file.horoscope_length {
            config.horoscope_length = length;
        }

        let p = &mut config.personalization;
        if let Some(v) = file.zodiac_sign {
            p.zodiac_sign = v;
        }
        if let Some(v) = file.date_of_birth {
            p.date_of_birth = v;
        }
        if let Some(v) = file.time_of_birth {
            p.time_of_birth = v;
        }
        if let Some(v) = file.sun_sign {
            p.sun_sign = v;
        }
        if let Some(v) = file.moon_sign {
            p.moon_sign = v;
        }
        if let Some(v) = file.rising_sign {
            p.rising_sign = v;
        }
        if let Some(v) = file.chinese_zodiac_animal {
            p.chinese_zodiac_animal = v;
        }
        if let Some(v) = file.element {
            p.element = v;
        }
        if let Some(v) = file.numerology_numbers {
            p.numerology_numbers = v;
        }

        if let Some(policy) = file.unknown_placeholders {
            match UnknownPlaceholderPolicy::parse(&policy) {
                Some(policy) => config.unknown_placeholders = policy,
                None => {
                    tracing::warn!(value = %policy, "Unknown unknownPlaceholders value, using default");
                },
            }
        }
        if let Some(matching) = file.section_matching {
            match SectionMatching::parse(&matching) {
                Some(matching) => config.section_matching = matching,
                None => {
                    tracing::warn!(value = %matching, "Unknown sectionMatching value, using default");
                },
            }
        }

        config
    }

    /// Converts this configuration back into its file form.
    #[must_use]
    pub fn to_config_file(&self) -> ConfigFile {
        let p = &self.personalization;
        ConfigFile {
            api_key: Some(self.api_key.expose_secret().to_string()),
            endpoint: Some(self.endpoint.clone()),
            model: Some(self.model.clone()),
            system_message: Some(self.system_message.clone()),
            daily_note_location: Some(self.daily_note_location.clone()),
            monthly_note_location: Some(self.monthly_note_location.clone()),
            yearly_note_location: Some(self.yearly_note_location.clone()),
            horoscope_length: Some(self.horoscope_length),
            zodiac_sign: Some(p.zodiac_sign.clone()),
            date_of_birth: Some(p.date_of_birth.clone()),
            time_of_birth: Some(p.time_of_birth.clone()),
            sun_sign: Some(p.sun_sign.clone()),
            moon_sign: Some(p.moon_sign.clone()),
            rising_sign: Some(p.rising_sign.clone()),
            chinese_zodiac_animal: Some(p.chinese_zodiac_animal.clone()),
            element: Some(p.element.clone()),
            numerology_numbers: Some(p.numerology_numbers.clone()),
            unknown_placeholders: Some(self.unknown_placeholders.as_str().to_string()),
            section_matching: Some(self.section_matching.as_str().to_string()),
        }
    }

    /// Writes the full configuration to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let file = self.to_config_file();
        let contents = if is_json(path) {
            serde_json::to_string_pretty(&file).map_err(|e| e.to_string())
        } else {
            toml::to_string_pretty(&file).map_err(|e| e.to_string())
        }
        .map_err(|cause| Error::OperationFailed {
            operation: "serialize_config".to_string(),
            cause,
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
                operation: "create_config_dir".to_string(),
                cause: e.to_string(),
            })?;
        }
        std::fs::write(path, contents).map_err(|e| Error::OperationFailed {
            operation: "write_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        tracing::info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Sets one setting by its camelCase key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an unknown key, a horoscope length
    /// outside 1-5, or an unknown policy name.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let text = value.to_string();
        match key {
            "apiKey" => self.api_key = SecretString::from(text),
            "endpoint" => self.endpoint = text,
            "model" => self.model = text,
            "systemMessage" => self.system_message = text,
            "dailyNoteLocation" => self.daily_note_location = text,
            "monthlyNoteLocation" => self.monthly_note_location = text,
            "yearlyNoteLocation" => self.yearly_note_location = text,
            "horoscopeLength" => self.horoscope_length = parse_horoscope_length(value)?,
            "zodiacSign" => self.personalization.zodiac_sign = text,
            "dateOfBirth" => self.personalization.date_of_birth = text,
            "timeOfBirth" => self.personalization.time_of_birth = text,
            "sunSign" => self.personalization.sun_sign = text,
            "moonSign" => self.personalization.moon_sign = text,
            "risingSign" => self.personalization.rising_sign = text,
            "chineseZodiacAnimal" => self.personalization.chinese_zodiac_animal = text,
            "element" => self.personalization.element = text,
            "numerologyNumbers" => self.personalization.numerology_numbers = text,
            "unknownPlaceholders" => {
                self.unknown_placeholders =
                    UnknownPlaceholderPolicy::parse(value).ok_or_else(|| {
                        Error::InvalidInput(format!(
                            "unknownPlaceholders must be 'fail' or 'literal', got '{value}'"
                        ))
                    })?;
            },
            "sectionMatching" => {
                self.section_matching = SectionMatching::parse(value).ok_or_else(|| {
                    Error::InvalidInput(format!(
                        "sectionMatching must be 'title' or 'source', got '{value}'"
                    ))
                })?;
            },
            _ => {
                return Err(Error::InvalidInput(format!(
                    "unknown setting '{key}' (expected one of: {})",
                    CONFIG_KEYS.join(", ")
                )));
            },
        }
        Ok(())
    }

    /// Returns every setting as `(key, display value)` with the API key masked.
    #[must_use]
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        let p = self.to_config_file();
        let masked = mask_secret(self.api_key.expose_secret());
        let value = |v: Option<String>| v.unwrap_or_default();
        vec![
            ("apiKey", masked),
            ("endpoint", value(p.endpoint)),
            ("model", value(p.model)),
            ("systemMessage", value(p.system_message)),
            ("dailyNoteLocation", value(p.daily_note_location)),
            ("monthlyNoteLocation", value(p.monthly_note_location)),
            ("yearlyNoteLocation", value(p.yearly_note_location)),
            ("horoscopeLength", self.horoscope_length.to_string()),
            ("zodiacSign", value(p.zodiac_sign)),
            ("dateOfBirth", value(p.date_of_birth)),
            ("timeOfBirth", value(p.time_of_birth)),
            ("sunSign", value(p.sun_sign)),
            ("moonSign", value(p.moon_sign)),
            ("risingSign", value(p.rising_sign)),
            ("chineseZodiacAnimal", value(p.chinese_zodiac_animal)),
            ("element", value(p.element)),
            ("numerologyNumbers", value(p.numerology_numbers)),
            ("unknownPlaceholders", value(p.unknown_placeholders)),
            ("sectionMatching", value(p.section_matching)),
        ]
    }

    /// Applies environment variable overrides.
    ///
    /// `DELULU_API_KEY` (falling back to `OPENAI_API_KEY` when no key is
    /// configured), `DELULU_ENDPOINT` and `DELULU_MODEL`.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(key) = non_empty_env("DELULU_API_KEY") {
            self.api_key = SecretString::from(key);
        } else if self.api_key.expose_secret().is_empty() {
            if let Some(key) = non_empty_env("OPENAI_API_KEY") {
                self.api_key = SecretString::from(key);
            }
        }
        if let Some(endpoint) = non_empty_env("DELULU_ENDPOINT") {
            self.endpoint = endpoint;
        }
        if let Some(model) = non_empty_env("DELULU_MODEL") {
            self.model = model;
        }
        self
    }
}

fn candidate_paths() -> Vec<PathBuf> {
    let Some(base_dirs) = directories::BaseDirs::new() else {
        return Vec::new();
    };
    vec![
        base_dirs.config_dir().join("delulu").join("config.toml"),
        base_dirs
            .home_dir()
            .join(".config")
            .join("delulu")
            .join("config.toml"),
    ]
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn parse_config_file(path: &Path, contents: &str) -> Result<ConfigFile> {
    if is_json(path) {
        serde_json::from_str(contents).map_err(|e| e.to_string())
    } else {
        toml::from_str(contents).map_err(|e| e.to_string())
    }
    .map_err(|cause| Error::OperationFailed {
        operation: "parse_config_file".to_string(),
        cause,
    })
}

fn parse_horoscope_length(value: &str) -> Result<u8> {
    value
        .trim()
        .parse::<u8>()
        .ok()
        .filter(|n| HOROSCOPE_LENGTH_RANGE.contains(n))
        .ok_or_else(|| {
            Error::InvalidInput(format!(
                "horoscopeLength must be a whole number from 1 to 5, got '{value}'"
            ))
        })
}

fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        return "(not set)".to_string();
    }
    let tail: String = secret
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if secret.chars().count() <= 8 {
        "********".to_string()
    } else {
        format!("********{tail}")
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use test_case::test_case;

    #[test]
    fn test_defaults() {
        let config = DeluluConfig::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.horoscope_length, 1);
        assert!(config.api_key.expose_secret().is_empty());
        assert!(config.system_message.is_empty());
        assert_eq!(config.section_matching, SectionMatching::Title);
        assert_eq!(config.unknown_placeholders, UnknownPlaceholderPolicy::Fail);
    }

    #[test]
    fn test_missing_keys_fall_back_to_defaults() {
        let file: ConfigFile = toml::from_str(
            r#"
            apiKey = "sk-test"
            dailyNoteLocation = "Journal/Daily"
            horoscopeLength = 3
            "#,
        )
        .unwrap();
        let config = DeluluConfig::from_config_file(file);

        assert_eq!(config.api_key.expose_secret(), "sk-test");
        assert_eq!(config.daily_note_location, "Journal/Daily");
        assert_eq!(config.horoscope_length, 3);
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert!(config.monthly_note_location.is_empty());
    }

    #[test]
    fn test_present_values_are_not_validated() {
        let file = ConfigFile {
            endpoint: Some(String::new()),
            horoscope_length: Some(9),
            ..ConfigFile::default()
        };
        let config = DeluluConfig::from_config_file(file);
        assert_eq!(config.endpoint, "");
        assert_eq!(config.horoscope_length, 9);
    }

    #[test]
    fn test_loads_plugin_json_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(
            &path,
            r#"{"apiKey":"sk-json","zodiacSign":"Gemini","horoscopeLength":2,"extra":true}"#,
        )
        .unwrap();

        let config = DeluluConfig::load_from_file(&path).unwrap();
        assert_eq!(config.api_key.expose_secret(), "sk-json");
        assert_eq!(config.personalization.zodiac_sign, "Gemini");
        assert_eq!(config.horoscope_length, 2);
    }

    #[test]
    fn test_set_and_save_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = DeluluConfig::default();
        config.set("moonSign", "Pisces").unwrap();
        config.set("horoscopeLength", "4").unwrap();
        config.set("sectionMatching", "source").unwrap();
        config.save_to_file(&path).unwrap();

        let loaded = DeluluConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.personalization.moon_sign, "Pisces");
        assert_eq!(loaded.horoscope_length, 4);
        assert_eq!(loaded.section_matching, SectionMatching::Source);
        assert_eq!(loaded.endpoint, DEFAULT_ENDPOINT);
    }

    #[test_case("0" ; "below range")]
    #[test_case("6" ; "above range")]
    #[test_case("three" ; "not a number")]
    fn test_set_rejects_bad_horoscope_length(value: &str) {
        let mut config = DeluluConfig::default();
        assert!(matches!(
            config.set("horoscopeLength", value),
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(config.horoscope_length, 1);
    }

    #[test]
    fn test_set_rejects_unknown_key() {
        let mut config = DeluluConfig::default();
        let err = config.set("favoriteColor", "teal").unwrap_err();
        assert!(err.to_string().contains("favoriteColor"));
    }

    #[test]
    fn test_every_listed_key_is_settable() {
        let mut config = DeluluConfig::default();
        for key in CONFIG_KEYS {
            let value = match *key {
                "horoscopeLength" => "2",
                "unknownPlaceholders" => "literal",
                "sectionMatching" => "title",
                _ => "x",
            };
            assert!(config.set(key, value).is_ok(), "key {key}");
        }
        assert_eq!(config.describe().len(), CONFIG_KEYS.len());
    }

    #[test]
    fn test_describe_masks_api_key() {
        let mut config = DeluluConfig::default();
        config.set("apiKey", "sk-abcdefghijklmnop").unwrap();
        let described = config.describe();
        let (_, shown) = described.iter().find(|(k, _)| *k == "apiKey").unwrap();
        assert_eq!(shown, "********mnop");
        assert!(!format!("{config:?}").contains("abcdefgh"));
    }

    #[test]
    fn test_mask_short_and_empty() {
        assert_eq!(mask_secret(""), "(not set)");
        assert_eq!(mask_secret("short"), "********");
    }
}
