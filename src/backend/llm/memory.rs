/**
 * Memory Extractor
 *
 * Mines a finished exchange for durable facts about the user and upserts
 * them through the persistence collaborator.
 *
 * Extraction never affects the reply it follows. `spawn` detaches the work
 * onto its own task with its own deadline; every failure along the way ends
 * in a log line and nothing else.
 */

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::backend::llm::client::{GenerationRequest, LlmError, TextGenerator};
use crate::backend::persistence::Persistence;
use crate::shared::{MemoryItem, Role, Turn};

pub const DEFAULT_EXTRACT_PROMPT: &str = r#"请分析上述对话，提取关于“用户”（user）的新的、永久性的个人信息（如姓名、昵称、年龄、职业、爱好、位置、重要关系等）。
忽略：
1. [系统信息] 中已有的内容。
2. 临时的状态（如“我饿了”、“我在睡觉”）。
3. 无意义的闲聊。

请严格仅返回一个 JSON 列表，列表项为包含 "key" 和 "value" 的对象。
- key: 使用英文蛇形命名（如 user_name, hobby, profession）。
- value: 用户原本的语言（通常是中文）。
如果没有新信息，请返回空列表 []。

示例输出：
[{"key": "user_name", "value": "小萌"}, {"key": "hobby", "value": "画画"}]

请直接返回 JSON 字符串，不要包含 Markdown 格式（如 code block），不要包含其他解释文字。"#;

/// Exchanges shorter than this are not mined
pub const MIN_EXTRACTION_TURNS: usize = 2;

const SYSTEM_LABEL: &str = "[系统信息]: ";
const LOGGED_RAW_CHARS: usize = 200;

pub struct MemoryExtractor {
    generator: Arc<dyn TextGenerator>,
    persistence: Arc<dyn Persistence>,
    prompt: String,
    timeout: Duration,
}

impl MemoryExtractor {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        persistence: Arc<dyn Persistence>,
        prompt: Option<String>,
        timeout: Duration,
    ) -> Self {
        let prompt = prompt
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_EXTRACT_PROMPT.to_string());
        Self {
            generator,
            persistence,
            prompt,
            timeout,
        }
    }

    /// Run extraction for `user_id` over `turns`; returns how many memories were stored
    ///
    /// Unparseable or empty model output stores nothing and is not an error.
    pub async fn extract(&self, user_id: &str, model: &str, turns: &[Turn]) -> Result<usize, LlmError> {
        if turns.len() < MIN_EXTRACTION_TURNS {
            return Ok(0);
        }

        let prompt = format!("{}\n\n{}", transcript(turns), self.prompt);
        let request = GenerationRequest::new(model, vec![Turn::user(prompt)]);
        let response = self.generator.chat(request, self.timeout).await?;

        let raw = response.content.trim();
        tracing::debug!("[Memory] Raw extraction for {}: {}", user_id, preview(raw));

        let items = match parse_memory_items(raw) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(
                    "[Memory] Unparseable extraction for {}: {} (raw: {})",
                    user_id,
                    e,
                    preview(raw)
                );
                return Ok(0);
            }
        };

        let mut stored = 0;
        for item in items.iter().filter(|i| i.is_complete()) {
            match self.persistence.upsert_memory(user_id, &item.key, &item.value).await {
                Ok(()) => stored += 1,
                Err(e) => tracing::error!("[Memory] Upsert of {} for {} failed: {}", item.key, user_id, e),
            }
        }
        if stored > 0 {
            tracing::info!("[Memory] Stored {} memories for {}", stored, user_id);
        }
        Ok(stored)
    }

    /// Detach an extraction run
    ///
    /// The task owns its inputs and is bounded by twice the generation
    /// timeout, independent of the request that triggered it.
    pub fn spawn(self: &Arc<Self>, user_id: String, model: String, turns: Vec<Turn>) -> JoinHandle<()> {
        let extractor = Arc::clone(self);
        let deadline = self.timeout * 2;
        tokio::spawn(async move {
            match tokio::time::timeout(deadline, extractor.extract(&user_id, &model, &turns)).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => tracing::warn!("[Memory] Extraction for {} failed: {}", user_id, e),
                Err(_) => tracing::warn!("[Memory] Extraction for {} timed out after {:?}", user_id, deadline),
            }
        })
    }
}

/// Transcript with system turns labeled distinctly
pub fn transcript(turns: &[Turn]) -> String {
    let mut out = String::new();
    for turn in turns {
        if turn.role == Role::System {
            out.push_str(SYSTEM_LABEL);
        } else {
            out.push_str(turn.role.as_str());
            out.push_str(": ");
        }
        out.push_str(&turn.content);
        out.push('\n');
    }
    out
}

/// Remove an optional Markdown code fence around `raw`
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}

/// Parse the model's JSON array of `{key, value}` objects
pub fn parse_memory_items(raw: &str) -> Result<Vec<MemoryItem>, serde_json::Error> {
    let content = strip_code_fence(raw);
    if content.is_empty() || content == "[]" {
        return Ok(Vec::new());
    }
    serde_json::from_str(content)
}

fn preview(raw: &str) -> String {
    raw.chars().take(LOGGED_RAW_CHARS).collect()
}
