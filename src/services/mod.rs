//! Business logic services.
//!
//! Services wire the vault, the template engine, the completion client and
//! the text buffer into the generation flow.

mod generation;
mod notifier;

pub use generation::{
    ARRIVED_NOTICE, CONJURING_NOTICE, FAILURE_NOTICE, GenerationOutcome, GenerationService,
    INSERT_FAILED_NOTICE, PLACEHOLDER, PendingGeneration,
};
pub use notifier::{Notifier, RecordingNotifier, StderrNotifier};
