//! Completion client HTTP contract tests.
//!
//! Runs the OpenAI-compatible client against a local mock server:
//! - Request shape (model, two messages, bearer token)
//! - Content extraction from `choices[0].message.content`
//! - Malformed and non-JSON bodies

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use delulu::{CompletionProvider, Error, OpenAiClient};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> OpenAiClient {
    OpenAiClient::new()
        .with_endpoint(format!("{}/v1/chat/completions", server.uri()))
        .with_model("gpt-test")
        .with_api_key("sk-test")
}

#[tokio::test]
async fn test_returns_first_choice_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [
                { "message": { "role": "assistant", "content": "hello" } },
                { "message": { "role": "assistant", "content": "ignored" } }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let text = client_for(&server).complete("sys", "usr").await.unwrap();
    assert_eq!(text, "hello");
}

#[tokio::test]
async fn test_sends_model_messages_and_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "model": "gpt-test",
            "messages": [
                { "role": "system", "content": "You are a horoscope generator." },
                { "role": "user", "content": "User's recent journal:\n" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "matched" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let text = client_for(&server)
        .complete("You are a horoscope generator.", "User's recent journal:\n")
        .await
        .unwrap();
    assert_eq!(text, "matched");
}

#[tokio::test]
async fn test_empty_choices_is_unexpected_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let err = client_for(&server).complete("s", "u").await.unwrap_err();
    assert!(matches!(err, Error::UnexpectedResponse(_)), "got {err:?}");
}

#[tokio::test]
async fn test_api_error_body_is_unexpected_response_with_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "message": "Incorrect API key provided", "type": "invalid_request_error" }
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).complete("s", "u").await.unwrap_err();
    match err {
        Error::UnexpectedResponse(message) => {
            assert!(message.contains("Incorrect API key provided"));
        },
        other => panic!("expected UnexpectedResponse, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_json_body_is_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).complete("s", "u").await.unwrap_err();
    assert!(matches!(err, Error::OperationFailed { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_unreachable_endpoint_is_transport_failure() {
    let server = MockServer::start().await;
    let endpoint = format!("{}/v1/chat/completions", server.uri());
    drop(server);

    let err = OpenAiClient::new()
        .with_endpoint(endpoint)
        .complete("s", "u")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::OperationFailed { .. }), "got {err:?}");
}
