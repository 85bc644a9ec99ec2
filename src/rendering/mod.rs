//! System message rendering.
//!
//! The system message is either the built-in horoscope instruction or a
//! user template with `{{name}}` placeholders bound to personalization
//! settings.

mod system_message;

pub use system_message::{
    Binding, Bindings, SystemMessage, UnknownPlaceholderPolicy, calculate_age,
    default_instruction, parse_date_of_birth,
};
