//! Scripted text generator
//!
//! Stands in for the generation service. Every request is recorded, and the
//! reply is chosen by what kind of call it is: a summary request, an
//! extraction request, or a regular chat turn.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use moehub::backend::llm::memory::DEFAULT_EXTRACT_PROMPT;
use moehub::backend::llm::summarizer::DEFAULT_SUMMARY_PROMPT;
use moehub::backend::llm::{GenerationRequest, GenerationResponse, LlmError, TextGenerator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Summary,
    Extraction,
    Chat,
}

pub fn classify(request: &GenerationRequest) -> CallKind {
    let first = request.messages.first().map(|t| t.content.as_str());
    let last = request.messages.last().map(|t| t.content.as_str()).unwrap_or_default();
    if first == Some(DEFAULT_SUMMARY_PROMPT) {
        CallKind::Summary
    } else if last.ends_with(DEFAULT_EXTRACT_PROMPT) {
        CallKind::Extraction
    } else {
        CallKind::Chat
    }
}

type Reply = Result<GenerationResponse, String>;

pub struct ScriptedGenerator {
    summary: Reply,
    extraction: Reply,
    chat: Reply,
    calls: Mutex<Vec<(CallKind, GenerationRequest)>>,
}

impl Default for ScriptedGenerator {
    fn default() -> Self {
        Self {
            summary: Ok(GenerationResponse::text("summary")),
            extraction: Ok(GenerationResponse::text("[]")),
            chat: Ok(GenerationResponse::text("reply")),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_summary(mut self, text: &str) -> Self {
        self.summary = Ok(GenerationResponse::text(text));
        self
    }

    pub fn failing_summary(mut self) -> Self {
        self.summary = Err("summary backend down".to_string());
        self
    }

    pub fn with_extraction(mut self, text: &str) -> Self {
        self.extraction = Ok(GenerationResponse::text(text));
        self
    }

    pub fn with_chat(mut self, response: GenerationResponse) -> Self {
        self.chat = Ok(response);
        self
    }

    pub fn failing_chat(mut self) -> Self {
        self.chat = Err("chat backend down".to_string());
        self
    }

    pub fn calls(&self) -> Vec<(CallKind, GenerationRequest)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_of(&self, kind: CallKind) -> Vec<GenerationRequest> {
        self.calls()
            .into_iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, r)| r)
            .collect()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn chat(&self, request: GenerationRequest, _timeout: Duration) -> Result<GenerationResponse, LlmError> {
        let kind = classify(&request);
        self.calls.lock().unwrap().push((kind, request));
        let reply = match kind {
            CallKind::Summary => &self.summary,
            CallKind::Extraction => &self.extraction,
            CallKind::Chat => &self.chat,
        };
        reply.clone().map_err(|body| LlmError::Status { status: 500, body })
    }
}
