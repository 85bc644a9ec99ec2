//! `OpenAI`-compatible chat completions client.

use super::CompletionProvider;
use crate::config::{DEFAULT_ENDPOINT, DEFAULT_MODEL, DeluluConfig};
use crate::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Chat completions client.
///
/// Works with any endpoint that speaks the `OpenAI` chat completions wire
/// format. The endpoint is the full URL, not a base URL.
pub struct OpenAiClient {
    /// API key.
    api_key: SecretString,
    /// Full chat completions URL.
    endpoint: String,
    /// Model to use.
    model: String,
    /// HTTP client.
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Creates a client with the default endpoint and model and no API key.
    #[must_use]
    pub fn new() -> Self {
        Self {
            api_key: SecretString::from(String::new()),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Creates a client from the loaded settings.
    #[must_use]
    pub fn from_config(config: &DeluluConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            client: reqwest::Client::new(),
        }
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = SecretString::from(key.into());
        self
    }

    /// Sets the endpoint URL.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Returns the configured model.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the configured endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends one chat completions request.
    async fn request(&self, messages: Vec<ChatMessage<'_>>) -> Result<String> {
        if self.api_key.expose_secret().is_empty() {
            tracing::warn!("No API key configured, the endpoint will likely reject the request");
        }

        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::OperationFailed {
                operation: "completion_request".to_string(),
                cause: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| Error::OperationFailed {
            operation: "completion_response".to_string(),
            cause: e.to_string(),
        })?;
        tracing::debug!(status = %status, bytes = body.len(), "Completion response received");

        let json: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| Error::OperationFailed {
                operation: "completion_response".to_string(),
                cause: format!("status {status}: body is not JSON: {e}"),
            })?;

        extract_content(json)
    }
}

impl Default for OpenAiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionProvider for OpenAiClient {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let messages = vec![
            ChatMessage {
                role: "system",
                content: system,
            },
            ChatMessage {
                role: "user",
                content: user,
            },
        ];

        self.request(messages).await
    }
}

/// Pulls `choices[0].message.content` out of a response body.
fn extract_content(json: serde_json::Value) -> Result<String> {
    let response: ChatCompletionResponse = serde_json::from_value(json)
        .map_err(|e| Error::UnexpectedResponse(format!("malformed body: {e}")))?;

    let api_error = response.error.and_then(|e| e.message);
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or_else(|| {
            Error::UnexpectedResponse(api_error.unwrap_or_else(|| {
                "missing choices[0].message.content".to_string()
            }))
        })
}

/// Request to the Chat Completions API.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

/// A message in the request.
#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Response from the Chat Completions API.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    error: Option<ApiError>,
}

/// A choice in the response.
#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ResponseMessage>,
}

/// The message of a choice.
#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Error object some endpoints return instead of choices.
#[derive(Debug, Deserialize)]
struct ApiError {
    message: Option<String>,
}
