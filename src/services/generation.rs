//! Horoscope generation flow.
//!
//! ```text
//! Idle ──begin──► Pending ──deliver──► Delivered
//!                    │
//!                    └──── any error ──► Failed (placeholder stays)
//! ```
//!
//! The cursor target lives in the [`PendingGeneration`] returned by
//! [`GenerationService::begin`] and is consumed by
//! [`GenerationService::deliver`], so two requests never share it.

use crate::config::DeluluConfig;
use crate::context::ContextAssembler;
use crate::editor::{EditorPosition, TextBuffer};
use crate::llm::CompletionProvider;
use crate::rendering::{Bindings, SystemMessage};
use crate::services::Notifier;
use crate::vault::NoteSource;
use crate::{Error, Result, current_timestamp_millis};
use tracing::instrument;

/// Glyph written at the cursor while the horoscope is being generated.
pub const PLACEHOLDER: &str = "🔮";

/// Shown when the request is sent.
pub const CONJURING_NOTICE: &str =
    "🔮 Your Daily Delulu is being conjured from the digital stars...";

/// Shown when the completion comes back.
pub const ARRIVED_NOTICE: &str = "🔮 Your Daily Delulu has arrived.";

/// Shown when the completion cannot be placed in the note.
pub const INSERT_FAILED_NOTICE: &str = "Horoscope could not be inserted.";

/// Shown when any step before delivery fails.
pub const FAILURE_NOTICE: &str = "Failed to fetch horoscope. Please check your settings.";

/// A generation that has written its placeholder and awaits the completion.
#[derive(Debug)]
#[must_use = "a pending generation should be delivered"]
pub struct PendingGeneration {
    position: EditorPosition,
    started_at: i64,
}

impl PendingGeneration {
    /// Where the placeholder was written.
    pub const fn position(&self) -> EditorPosition {
        self.position
    }

    /// The span the placeholder occupies.
    fn placeholder_end(&self) -> EditorPosition {
        self.position.advanced(PLACEHOLDER.chars().count())
    }
}

/// How a generation request ended.
#[derive(Debug)]
pub enum GenerationOutcome {
    /// The horoscope replaced the placeholder.
    Delivered {
        /// Where the horoscope starts.
        position: EditorPosition,
        /// The generated text.
        text: String,
    },
    /// The flow stopped early.
    Failed {
        /// What went wrong.
        error: Error,
        /// Where the placeholder was left, if it was written.
        placeholder: Option<EditorPosition>,
    },
}

impl GenerationOutcome {
    /// Returns true for [`GenerationOutcome::Delivered`].
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

/// Runs generation requests against one vault, one provider and one notifier.
pub struct GenerationService<'a, S, P, N>
where
    S: NoteSource,
    P: CompletionProvider,
    N: Notifier,
{
    config: &'a DeluluConfig,
    source: &'a S,
    provider: &'a P,
    notifier: &'a N,
}

impl<'a, S, P, N> GenerationService<'a, S, P, N>
where
    S: NoteSource,
    P: CompletionProvider,
    N: Notifier,
{
    /// Creates a generation service.
    #[must_use]
    pub const fn new(config: &'a DeluluConfig, source: &'a S, provider: &'a P, notifier: &'a N) -> Self {
        Self {
            config,
            source,
            provider,
            notifier,
        }
    }

    /// Renders the configured system message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownPlaceholder`] for a template naming an unknown
    /// binding under the fail policy.
    pub fn system_message(&self) -> Result<String> {
        SystemMessage::from_config(self.config).render(&Bindings::from_config(self.config))
    }

    /// Writes the placeholder at `cursor` and records where it went.
    ///
    /// The buffer is reloaded before the insert.
    pub async fn begin<B: TextBuffer>(
        &self,
        buffer: &mut B,
        cursor: EditorPosition,
    ) -> Result<PendingGeneration> {
        buffer.reload().await?;
        // Normalize so an out-of-range cursor records where the glyph really lands.
        let position = EditorPosition::from_offset(buffer.text(), cursor.to_offset(buffer.text()));
        buffer.replace_range(PLACEHOLDER, position, None);
        buffer.save().await?;

        tracing::debug!(position = %position, "Placeholder written");
        Ok(PendingGeneration {
            position,
            started_at: current_timestamp_millis(),
        })
    }

    /// Replaces the placeholder of `pending` with `text`.
    ///
    /// The buffer is reloaded first, so edits made while the request was in
    /// flight are kept and only the placeholder span is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the placeholder is no longer at the
    /// recorded position; nothing is written in that case.
    pub async fn deliver<B: TextBuffer>(
        &self,
        buffer: &mut B,
        pending: PendingGeneration,
        text: &str,
    ) -> Result<EditorPosition> {
        buffer.reload().await?;
        let from = pending.position;
        let to = pending.placeholder_end();
        if buffer.text_in_range(from, to) != PLACEHOLDER {
            return Err(Error::InvalidInput(format!(
                "placeholder not found at {from}"
            )));
        }

        buffer.replace_range(text, from, Some(to));
        buffer.save().await?;

        tracing::info!(
            position = %from,
            chars = text.chars().count(),
            elapsed_ms = current_timestamp_millis() - pending.started_at,
            "Horoscope delivered"
        );
        Ok(from)
    }

    /// Runs the whole flow and inserts the horoscope at `cursor`.
    ///
    /// Never fails outright: errors are logged, shown to the user and
    /// returned inside [`GenerationOutcome::Failed`]. A placeholder already
    /// written is left in place.
    #[instrument(skip(self, buffer), fields(operation = "generate", model = %self.config.model))]
    pub async fn generate<B: TextBuffer>(
        &self,
        buffer: &mut B,
        cursor: EditorPosition,
    ) -> GenerationOutcome {
        let mut placeholder = None;

        let result = async {
            let context = ContextAssembler::new(self.source, self.config)
                .gather_context()
                .await?;

            self.notifier.notify(CONJURING_NOTICE);
            let pending = self.begin(buffer, cursor).await?;
            placeholder = Some(pending.position());

            let system = self.system_message()?;
            tracing::debug!(
                default_instruction = self.config.system_message.is_empty(),
                system_chars = system.len(),
                context_chars = context.len(),
                provider = self.provider.name(),
                "Requesting horoscope"
            );
            let text = self.provider.complete(&system, &context).await?;
            Ok::<_, Error>((pending, text))
        }
        .await;

        let (pending, text) = match result {
            Ok(done) => done,
            Err(error) => {
                tracing::error!(error = %error, "Error fetching horoscope");
                self.notifier.notify(FAILURE_NOTICE);
                return GenerationOutcome::Failed { error, placeholder };
            },
        };

        self.notifier.notify(ARRIVED_NOTICE);
        match self.deliver(buffer, pending, &text).await {
            Ok(position) => GenerationOutcome::Delivered { position, text },
            Err(error) => {
                tracing::error!(error = %error, "Horoscope could not be inserted");
                self.notifier.notify(INSERT_FAILED_NOTICE);
                GenerationOutcome::Failed { error, placeholder }
            },
        }
    }
}
