//! Journal folder and listing types.

use std::fmt;

/// Designated journal folders that feed the horoscope context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JournalSource {
    /// Daily notes folder.
    Daily,
    /// Monthly notes folder.
    Monthly,
    /// Yearly notes folder.
    Yearly,
}

impl JournalSource {
    /// Returns all journal sources in context order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Daily, Self::Monthly, Self::Yearly]
    }

    /// Number of most recently created notes taken from this folder.
    #[must_use]
    pub const fn note_limit(&self) -> usize {
        match self {
            Self::Daily => 3,
            Self::Monthly | Self::Yearly => 1,
        }
    }

    /// Returns the source as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl fmt::Display for JournalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where to list notes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Every markdown note in the vault.
    All,
    /// Notes whose vault-relative path starts with this prefix.
    Folder(String),
}

impl Location {
    /// Creates a folder location.
    #[must_use]
    pub fn folder(prefix: impl Into<String>) -> Self {
        Self::Folder(prefix.into())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Folder(prefix) => write!(f, "{prefix}"),
        }
    }
}

/// Timestamp used to order a listing. Listings are always newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoteSort {
    /// Creation time.
    #[default]
    Created,
    /// Last modification time.
    Modified,
}
