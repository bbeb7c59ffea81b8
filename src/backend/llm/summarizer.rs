//! Conversation summarizer
//!
//! Sends a slice of turns to the generation service with a dedicated digest
//! instruction and returns the summary text.

use std::sync::Arc;
use std::time::Duration;

use crate::backend::llm::client::{GenerationRequest, LlmError, TextGenerator};
use crate::shared::Turn;

pub const DEFAULT_SUMMARY_PROMPT: &str = "你是对话总结助手，需要用简短的中文总结下面的多轮对话，提炼出对后续对话有用的关键信息和记忆点，尽量控制在三到六条以内。";

pub struct Summarizer {
    generator: Arc<dyn TextGenerator>,
    prompt: String,
    timeout: Duration,
}

impl Summarizer {
    pub fn new(generator: Arc<dyn TextGenerator>, prompt: Option<String>, timeout: Duration) -> Self {
        let prompt = prompt
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_SUMMARY_PROMPT.to_string());
        Self {
            generator,
            prompt,
            timeout,
        }
    }

    /// Summarize `turns` with `model`
    ///
    /// An empty slice yields an empty summary without calling the service.
    pub async fn summarize(&self, model: &str, turns: &[Turn]) -> Result<String, LlmError> {
        if turns.is_empty() {
            return Ok(String::new());
        }

        let request = GenerationRequest::new(
            model,
            vec![Turn::system(self.prompt.clone()), Turn::user(transcript(turns))],
        );
        let response = self.generator.chat(request, self.timeout).await?;
        tracing::debug!("[Llm] Summarized {} turns into {} chars", turns.len(), response.content.chars().count());
        Ok(response.content)
    }
}

/// One `role：content` line per turn
pub fn transcript(turns: &[Turn]) -> String {
    turns.iter().fold(String::new(), |mut out, turn| {
        out.push_str(turn.role.as_str());
        out.push('：');
        out.push_str(&turn.content);
        out.push('\n');
        out
    })
}
