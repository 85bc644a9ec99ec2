//! Placeholder templating for the system message.

use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::config::{DeluluConfig, Personalization};
use crate::{Error, Result};

/// Creates a compile-time verified regex wrapped in [`LazyLock`].
macro_rules! lazy_regex {
    ($pattern:expr) => {
        LazyLock::new(|| Regex::new($pattern).unwrap_or_else(|_| unreachable!()))
    };
}

/// `{{ name }}` with any whitespace inside the braces.
static PLACEHOLDER_PATTERN: LazyLock<Regex> = lazy_regex!(r"\{\{\s*(.*?)\s*\}\}");

/// Date formats accepted for the date of birth, tried in order.
const DATE_OF_BIRTH_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d", "%B %d, %Y", "%b %d, %Y"];

/// A named value that can appear in a system message template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binding {
    /// Horoscope length in paragraphs.
    HoroscopeLength,
    /// Zodiac sign.
    ZodiacSign,
    /// Date of birth as configured.
    DateOfBirth,
    /// Time of birth.
    TimeOfBirth,
    /// Sun sign.
    SunSign,
    /// Moon sign.
    MoonSign,
    /// Rising sign.
    RisingSign,
    /// Chinese zodiac animal.
    ChineseZodiacAnimal,
    /// Element.
    Element,
    /// Numerology numbers.
    NumerologyNumbers,
    /// Age in whole years, derived from the date of birth.
    Age,
}

impl Binding {
    /// Returns all bindings.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::HoroscopeLength,
            Self::ZodiacSign,
            Self::DateOfBirth,
            Self::TimeOfBirth,
            Self::SunSign,
            Self::MoonSign,
            Self::RisingSign,
            Self::ChineseZodiacAnimal,
            Self::Element,
            Self::NumerologyNumbers,
            Self::Age,
        ]
    }

    /// Returns the placeholder name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::HoroscopeLength => "horoscopeLength",
            Self::ZodiacSign => "zodiacSign",
            Self::DateOfBirth => "dateOfBirth",
            Self::TimeOfBirth => "timeOfBirth",
            Self::SunSign => "sunSign",
            Self::MoonSign => "moonSign",
            Self::RisingSign => "risingSign",
            Self::ChineseZodiacAnimal => "chineseZodiacAnimal",
            Self::Element => "element",
            Self::NumerologyNumbers => "numerologyNumbers",
            Self::Age => "age",
        }
    }

    /// Looks up a binding by placeholder name. Names are case-sensitive.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|b| b.name() == name)
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// What to do with a placeholder that names no [`Binding`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownPlaceholderPolicy {
    /// Fail the render with [`Error::UnknownPlaceholder`].
    #[default]
    Fail,
    /// Leave the placeholder text as written.
    Literal,
}

impl UnknownPlaceholderPolicy {
    /// Parses a policy string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "fail" | "error" => Some(Self::Fail),
            "literal" | "keep" => Some(Self::Literal),
            _ => None,
        }
    }

    /// Returns the policy as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fail => "fail",
            Self::Literal => "literal",
        }
    }
}

/// Values for every [`Binding`].
#[derive(Debug, Clone)]
pub struct Bindings {
    horoscope_length: u8,
    personalization: Personalization,
    today: NaiveDate,
}

impl Bindings {
    /// Creates bindings evaluated against the local current date.
    #[must_use]
    pub fn new(horoscope_length: u8, personalization: Personalization) -> Self {
        Self {
            horoscope_length,
            personalization,
            today: Local::now().date_naive(),
        }
    }

    /// Creates bindings from the loaded settings.
    #[must_use]
    pub fn from_config(config: &DeluluConfig) -> Self {
        Self::new(config.horoscope_length, config.personalization.clone())
    }

    /// Overrides the date used to compute `age`.
    #[must_use]
    pub const fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Returns the horoscope length.
    #[must_use]
    pub const fn horoscope_length(&self) -> u8 {
        self.horoscope_length
    }

    /// Returns the string form of a binding.
    #[must_use]
    pub fn value(&self, binding: Binding) -> String {
        let p = &self.personalization;
        match binding {
            Binding::HoroscopeLength => self.horoscope_length.to_string(),
            Binding::ZodiacSign => p.zodiac_sign.clone(),
            Binding::DateOfBirth => p.date_of_birth.clone(),
            Binding::TimeOfBirth => p.time_of_birth.clone(),
            Binding::SunSign => p.sun_sign.clone(),
            Binding::MoonSign => p.moon_sign.clone(),
            Binding::RisingSign => p.rising_sign.clone(),
            Binding::ChineseZodiacAnimal => p.chinese_zodiac_animal.clone(),
            Binding::Element => p.element.clone(),
            Binding::NumerologyNumbers => p.numerology_numbers.clone(),
            Binding::Age => self.age_string(),
        }
    }

    fn age_string(&self) -> String {
        let raw = &self.personalization.date_of_birth;
        match parse_date_of_birth(raw) {
            Some(birth) => calculate_age(birth, self.today).to_string(),
            None => {
                tracing::warn!(date_of_birth = %raw, "Date of birth is missing or unparsable, age left blank");
                String::new()
            },
        }
    }
}

/// A system message template plus its unknown-placeholder policy.
#[derive(Debug, Clone, Default)]
pub struct SystemMessage {
    template: String,
    policy: UnknownPlaceholderPolicy,
}

impl SystemMessage {
    /// Creates a system message from a template string.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            policy: UnknownPlaceholderPolicy::default(),
        }
    }

    /// Creates the system message configured in the settings.
    #[must_use]
    pub fn from_config(config: &DeluluConfig) -> Self {
        Self::new(config.system_message.clone()).with_policy(config.unknown_placeholders)
    }

    /// Sets the unknown-placeholder policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: UnknownPlaceholderPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns true if the built-in instruction will be used.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.template.is_empty()
    }

    /// Renders the system message.
    ///
    /// An empty template yields [`default_instruction`]. Otherwise each
    /// `{{ name }}` is replaced by the named binding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownPlaceholder`] for an unknown name under
    /// [`UnknownPlaceholderPolicy::Fail`].
    pub fn render(&self, bindings: &Bindings) -> Result<String> {
        if self.is_default() {
            return Ok(default_instruction(bindings.horoscope_length()));
        }

        let mut rendered = String::with_capacity(self.template.len());
        let mut last = 0;
        for captures in PLACEHOLDER_PATTERN.captures_iter(&self.template) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            let name = captures.get(1).map_or("", |m| m.as_str());
            rendered.push_str(&self.template[last..whole.start()]);

            match (Binding::parse(name), self.policy) {
                (Some(binding), _) => rendered.push_str(&bindings.value(binding)),
                (None, UnknownPlaceholderPolicy::Literal) => rendered.push_str(whole.as_str()),
                (None, UnknownPlaceholderPolicy::Fail) => {
                    return Err(Error::UnknownPlaceholder(name.to_string()));
                },
            }
            last = whole.end();
        }
        rendered.push_str(&self.template[last..]);

        Ok(rendered)
    }
}

/// The built-in horoscope instruction.
///
/// The text keeps its leading newline, tab indentation and the trailing
/// space after "situation.".
#[must_use]
pub fn default_instruction(horoscope_length: u8) -> String {
    format!(
        "\n\
\t\t\tYou are a horoscope generator. Your task is to generate a personalized horoscope for today. The first user message will be used as context for the horoscope.\n\
\t\t\t\n\
\t\t\tYour horoscope should be creative and thought provoking, helpful to the user's life and relevant to their unique situation. \n\
\t\t\t\n\
\t\t\tTHE HOROSCOPE MUST BE {horoscope_length} paragraphs or LESS!!\n\
\n\
\t\t\tTips for creating your horoscope:\n\
\t\t\t- Maintain an almost poetic and mysterious horoscope vibe and language.\n\
\t\t\t- Make vague references, but avoid direct references such as naming dates, or specific things or projects.\n\
\t\t\t- Direct the user to what you believe they need most in their life in the current moment, be it happiness, direction in their pursuits, or reminders of the past.\n\
\t\t\t- Listen to your inner guiding spirit.\n\
\t\t\t- Be mysterious and vague, but not too vague. You want the user to feel like you're talking to them, but you don't want to be too specific like you're talking only to them.\n\
\t\t\t- Put more weight on more recent notes, but don't ignore older notes.\n\
\t\t\t- Limit your horoscope to {horoscope_length} paragraphs at max (you'll always have another one tomorrow to say more).\n\
\t\t\t"
    )
}

/// Parses a configured date of birth.
#[must_use]
pub fn parse_date_of_birth(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DATE_OF_BIRTH_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

/// Age in whole years as of the most recently passed birthday.
#[must_use]
pub fn calculate_age(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}
