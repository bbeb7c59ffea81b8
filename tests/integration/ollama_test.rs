//! Ollama client tests against a mock HTTP server

use std::time::Duration;

use assert_matches::assert_matches;
use futures_util::StreamExt;
use moehub::backend::llm::handlers::chat_socket_frames;
use moehub::backend::llm::stream::{relay_deltas, StreamDelta};
use moehub::backend::llm::{GenerationRequest, LlmError, OllamaClient, TextGenerator};
use moehub::shared::Turn;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::assert_ok;

const TIMEOUT: Duration = Duration::from_secs(5);

fn request() -> GenerationRequest {
    GenerationRequest::new("qwen", vec![Turn::system("be nice"), Turn::user("hi")])
}

#[tokio::test]
async fn test_chat_posts_window_and_reads_counts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "qwen",
            "stream": false,
            "messages": [
                {"role": "system", "content": "be nice"},
                {"role": "user", "content": "hi"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "qwen",
            "message": {"role": "assistant", "content": "你好"},
            "done": true,
            "prompt_eval_count": 42,
            "eval_count": 7
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OllamaClient::new(&format!("{}/", server.uri()));
    let response = assert_ok!(client.chat(request(), TIMEOUT).await);

    assert_eq!(response.content, "你好");
    assert_eq!(response.prompt_eval_count, 42);
    assert_eq!(response.eval_count, 7);
}

#[tokio::test]
async fn test_chat_tolerates_missing_counts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {"role": "assistant", "content": "ok"}
        })))
        .mount(&server)
        .await;

    let client = OllamaClient::new(&server.uri());
    let response = assert_ok!(client.chat(request(), TIMEOUT).await);

    assert_eq!(response.content, "ok");
    assert_eq!(response.prompt_eval_count, 0);
}

#[tokio::test]
async fn test_chat_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
        .mount(&server)
        .await;

    let client = OllamaClient::new(&server.uri());
    let result = client.chat(request(), TIMEOUT).await;

    assert_matches!(result, Err(LlmError::Status { status: 500, ref body }) if body == "model not loaded");
}

#[tokio::test]
async fn test_chat_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"message": {"content": "late"}}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = OllamaClient::new(&server.uri());
    let result = client.chat(request(), Duration::from_millis(100)).await;

    assert_matches!(result, Err(LlmError::Timeout(_)));
}

#[tokio::test]
async fn test_list_models_skips_unnamed_entries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{"name": "qwen:7b"}, {"name": ""}, {"name": "llama3"}]
        })))
        .mount(&server)
        .await;

    let client = OllamaClient::new(&server.uri());
    let models = assert_ok!(client.list_models(TIMEOUT).await);

    assert_eq!(models, vec!["qwen:7b".to_string(), "llama3".to_string()]);
}

#[tokio::test]
async fn test_stream_chat_relays_deltas() {
    let server = MockServer::start().await;
    let body = [
        r#"{"message":{"role":"assistant","content":"你"},"done":false}"#,
        "garbage",
        r#"{"message":{"role":"assistant","content":"好"},"done":false}"#,
        r#"{"message":{"role":"assistant","content":""},"done":true,"eval_count":2}"#,
        r#"{"message":{"role":"assistant","content":"after done"},"done":false}"#,
    ]
    .join("\n");
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let client = OllamaClient::new(&server.uri());
    let upstream = assert_ok!(client.stream_chat(&request(), TIMEOUT).await);
    let deltas: Vec<StreamDelta> = relay_deltas(upstream).collect().await;

    assert_eq!(
        deltas,
        vec![
            StreamDelta::content("你"),
            StreamDelta::content("好"),
            StreamDelta::finished(),
        ]
    );
}

#[tokio::test]
async fn test_stream_chat_error_status_fails_to_start() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(404).set_body_string("model \"nope\" not found"))
        .mount(&server)
        .await;

    let client = OllamaClient::new(&server.uri());
    let err = client
        .stream_chat(&request(), TIMEOUT)
        .await
        .err()
        .expect("stream should not start");

    assert_matches!(err, LlmError::Status { status: 404, .. });
}

async fn socket_frames(client: &OllamaClient, payload: &str) -> Vec<Value> {
    chat_socket_frames(client, TIMEOUT, payload)
        .await
        .map(|frame| serde_json::from_str(&frame).unwrap())
        .collect()
        .await
}

#[tokio::test]
async fn test_chat_socket_relays_deltas_until_done() {
    let server = MockServer::start().await;
    let body = [
        r#"{"message":{"role":"assistant","content":"早"},"done":false}"#,
        "",
        r#"{"message":{"role":"assistant","content":"安"},"done":false}"#,
        r#"{"message":{"role":"assistant","content":""},"done":true}"#,
    ]
    .join("\n");
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "qwen",
            "stream": true,
            "messages": [{"role": "user", "content": "早上好"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;

    let client = OllamaClient::new(&server.uri());
    let payload = json!({"model": "qwen", "messages": [{"role": "user", "content": "早上好"}]}).to_string();
    let frames = socket_frames(&client, &payload).await;

    assert_eq!(
        frames,
        vec![
            json!({"delta": "早", "done": false}),
            json!({"delta": "安", "done": false}),
            json!({"delta": "", "done": true}),
        ]
    );
}

#[tokio::test]
async fn test_chat_socket_reports_upstream_failure_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(404).set_body_string("model \"nope\" not found"))
        .mount(&server)
        .await;

    let client = OllamaClient::new(&server.uri());
    let frames = socket_frames(&client, r#"{"model":"nope","messages":[]}"#).await;

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["done"], true);
    assert!(frames[0]["error"].as_str().is_some_and(|e| !e.is_empty()));
}

#[tokio::test]
async fn test_chat_socket_rejects_malformed_request_without_calling_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = OllamaClient::new(&server.uri());
    let frames = socket_frames(&client, "not json").await;

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["done"], true);
    assert!(frames[0]["error"].as_str().unwrap_or_default().starts_with("invalid request"));
}
