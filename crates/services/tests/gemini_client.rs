//! GeminiClient against a mock generateContent endpoint.

use std::time::Duration;

use db::models::conversation::MessageRole;
use secrecy::SecretString;
use serde_json::json;
use services::services::{
    chatbot::{ChatTurn, GeminiClient, LanguageModel, LlmError, PromptRequest},
    config::LlmConfig,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, method, path, query_param},
};

const MODEL: &str = "gemini-test";
const ENDPOINT: &str = "/v1beta/models/gemini-test:generateContent";

fn config(base_url: &str, api_key: Option<&str>) -> LlmConfig {
    LlmConfig {
        api_key: api_key.map(|k| SecretString::from(k.to_string())),
        model: MODEL.to_string(),
        base_url: base_url.to_string(),
        timeout: Duration::from_secs(5),
    }
}

fn request() -> PromptRequest {
    PromptRequest {
        system_instruction: "Be kind.".to_string(),
        history: vec![
            ChatTurn {
                role: MessageRole::User,
                content: "hello".to_string(),
            },
            ChatTurn {
                role: MessageRole::Assistant,
                content: "hi there".to_string(),
            },
        ],
        message: "I had a long day".to_string(),
    }
}

fn text_response(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    }))
}

#[tokio::test]
async fn sends_history_and_generation_config() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "systemInstruction": { "parts": [{ "text": "Be kind." }] },
            "contents": [
                { "role": "user", "parts": [{ "text": "hello" }] },
                { "role": "model", "parts": [{ "text": "hi there" }] },
                { "role": "user", "parts": [{ "text": "I had a long day" }] }
            ],
            "generationConfig": { "maxOutputTokens": 512 }
        })))
        .respond_with(text_response("  That sounds tiring. Want to talk about it?  "))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new(&config(&server.uri(), Some("test-key"))).unwrap();
    assert!(client.is_configured());
    assert_eq!(client.model_name(), MODEL);

    let reply = client.generate(&request()).await.unwrap();
    assert_eq!(reply.text, "That sounds tiring. Want to talk about it?");
    assert_eq!(reply.status_code, 200);
}

#[tokio::test]
async fn missing_key_skips_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(text_response("unused"))
        .expect(0)
        .mount(&server)
        .await;

    let client = GeminiClient::new(&config(&server.uri(), None)).unwrap();
    assert!(!client.is_configured());
    assert_eq!(client.generate(&request()).await, Err(LlmError::NotConfigured));
}

#[tokio::test]
async fn maps_rate_limit_with_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "17"))
        .mount(&server)
        .await;

    let client = GeminiClient::new(&config(&server.uri(), Some("k"))).unwrap();
    assert_eq!(
        client.generate(&request()).await,
        Err(LlmError::RateLimited {
            retry_after_secs: Some(17)
        })
    );
}

#[tokio::test]
async fn maps_api_errors_with_provider_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT" }
        })))
        .mount(&server)
        .await;

    let client = GeminiClient::new(&config(&server.uri(), Some("bad"))).unwrap();
    let err = client.generate(&request()).await.unwrap_err();
    assert_eq!(
        err,
        LlmError::Api {
            status: 400,
            message: "API key not valid".to_string()
        }
    );
    assert_eq!(err.status_code(), Some(400));
}

#[tokio::test]
async fn blocked_prompt_and_empty_candidates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(body_partial_json(json!({
            "contents": [{}, {}, { "parts": [{ "text": "I had a long day" }] }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new(&config(&server.uri(), Some("k"))).unwrap();
    assert_eq!(
        client.generate(&request()).await,
        Err(LlmError::Blocked("SAFETY".to_string()))
    );

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;
    assert_eq!(
        client.generate(&request()).await,
        Err(LlmError::EmptyResponse)
    );
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    // Nothing listens on port 1.
    let client = GeminiClient::new(&config("http://127.0.0.1:1", Some("secret-key"))).unwrap();
    match client.generate(&request()).await {
        Err(LlmError::Network(message)) => assert!(!message.contains("secret-key")),
        other => panic!("expected network error, got {other:?}"),
    }
}
