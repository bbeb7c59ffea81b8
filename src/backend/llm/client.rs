/**
 * Text Generation Client
 *
 * The `TextGenerator` seam the chat service talks through, and its Ollama
 * implementation over reqwest.
 *
 * # Wire Format
 *
 * ```json
 * POST /api/chat
 * {"model": "qwen2.5", "messages": [{"role": "user", "content": "hi"}], "stream": false}
 *
 * 200 OK
 * {"message": {"role": "assistant", "content": "..."}, "prompt_eval_count": 12, "eval_count": 30, "done": true}
 * ```
 *
 * Streaming requests return one JSON object of the same shape per line, with
 * `done: false` until the final chunk.
 *
 * Every call carries an explicit deadline. Expiry surfaces as
 * `LlmError::Timeout`, never as a panic.
 */

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::Turn;

/// Errors talking to the generation service
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("generation service timed out after {0:?}")]
    Timeout(Duration),

    #[error("generation service unreachable: {0}")]
    Transport(reqwest::Error),

    #[error("generation service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed generation response: {0}")]
    Decode(String),
}

impl LlmError {
    fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(timeout)
        } else if err.is_decode() {
            LlmError::Decode(err.to_string())
        } else {
            LlmError::Transport(err)
        }
    }
}

/// One non-streaming completion request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub model: String,
    pub messages: Vec<Turn>,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Turn>) -> Self {
        Self {
            model: model.into(),
            messages,
        }
    }
}

/// Completion result with the service's own token accounting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationResponse {
    pub content: String,
    /// Prompt tokens as counted by the model; 0 when not reported
    pub prompt_eval_count: u64,
    pub eval_count: u64,
}

impl GenerationResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }
}

/// Chat completion collaborator
///
/// Used for end-user replies as well as the internal summarization and
/// memory extraction prompts.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn chat(&self, request: GenerationRequest, timeout: Duration) -> Result<GenerationResponse, LlmError>;
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
    stream: bool,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WireMessage {
    #[serde(default)]
    pub content: String,
}

/// One response object, whole or streamed
#[derive(Debug, Default, Deserialize)]
pub(crate) struct WireResponse {
    #[serde(default)]
    pub message: WireMessage,
    #[serde(default)]
    pub prompt_eval_count: u64,
    #[serde(default)]
    pub eval_count: u64,
    #[serde(default)]
    pub done: bool,
}

#[derive(Deserialize)]
struct WireModel {
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct WireTags {
    #[serde(default)]
    models: Vec<WireModel>,
}

/// Raw NDJSON body of a streaming completion
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

/// HTTP client for an Ollama server
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_chat(
        &self,
        model: &str,
        messages: &[Turn],
        stream: bool,
        timeout: Duration,
    ) -> Result<reqwest::Response, LlmError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = WireRequest { model, messages, stream };

        let response = self
            .http
            .post(&url)
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::from_reqwest(e, timeout))?;

        ensure_success(response, timeout).await
    }

    /// Start a streaming completion
    ///
    /// The returned stream yields raw NDJSON bytes as they arrive; see
    /// `llm::stream` for the line decoding.
    pub async fn stream_chat(
        &self,
        request: &GenerationRequest,
        timeout: Duration,
    ) -> Result<ByteStream, LlmError> {
        let response = self.post_chat(&request.model, &request.messages, true, timeout).await?;
        Ok(Box::pin(response.bytes_stream()))
    }

    /// Names of the models the server has installed
    pub async fn list_models(&self, timeout: Duration) -> Result<Vec<String>, LlmError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .http
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| LlmError::from_reqwest(e, timeout))?;
        let response = ensure_success(response, timeout).await?;

        let tags: WireTags = response.json().await.map_err(|e| LlmError::from_reqwest(e, timeout))?;
        Ok(tags
            .models
            .into_iter()
            .map(|m| m.name)
            .filter(|name| !name.is_empty())
            .collect())
    }
}

async fn ensure_success(response: reqwest::Response, timeout: Duration) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.map_err(|e| LlmError::from_reqwest(e, timeout))?;
    Err(LlmError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn chat(&self, request: GenerationRequest, timeout: Duration) -> Result<GenerationResponse, LlmError> {
        let response = self.post_chat(&request.model, &request.messages, false, timeout).await?;
        let wire: WireResponse = response.json().await.map_err(|e| LlmError::from_reqwest(e, timeout))?;

        tracing::debug!(
            "[Llm] {} replied: prompt_eval_count={} eval_count={}",
            request.model,
            wire.prompt_eval_count,
            wire.eval_count
        );

        Ok(GenerationResponse {
            content: wire.message.content,
            prompt_eval_count: wire.prompt_eval_count,
            eval_count: wire.eval_count,
        })
    }
}
