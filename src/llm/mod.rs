//! Chat-completion client.
//!
//! One system message, one user message, one request, one string back.

mod openai;

pub use openai::OpenAiClient;

use crate::Result;
use std::future::Future;

/// Trait for chat-completion providers.
pub trait CompletionProvider: Send + Sync {
    /// The provider name.
    fn name(&self) -> &'static str;

    /// Generates a completion for a system message and a user message.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OperationFailed`] when the request cannot be
    /// sent or the body is not JSON, and [`crate::Error::UnexpectedResponse`]
    /// when the JSON does not carry `choices[0].message.content`.
    fn complete(&self, system: &str, user: &str) -> impl Future<Output = Result<String>> + Send;
}
