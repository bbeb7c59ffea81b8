/**
 * Chat Service
 *
 * One bounded chat turn:
 *
 * 1. Load the caller's stored memories into the system instruction.
 * 2. If the last user message is a short explicit summary request, summarize
 *    the whole history and return that as the reply.
 * 3. Otherwise, if the window is too long or too big, summarize the old part
 *    and splice it into the system turn. A failed summary leaves the window
 *    as it was.
 * 4. Send the window to the model and report the remaining budget.
 * 5. For authenticated callers, detach memory extraction over the exchange.
 *
 * Only step 4 can fail the turn.
 */

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::backend::llm::client::{GenerationRequest, LlmError, TextGenerator};
use crate::backend::llm::context::{
    append_memories, estimate_tokens, estimate_turns, is_summary_request, ContextLimits, ContextWindow, WindowState,
};
use crate::backend::llm::memory::MemoryExtractor;
use crate::backend::llm::summarizer::Summarizer;
use crate::backend::persistence::Persistence;
use crate::shared::{ChatReply, ChatRequest};

pub const DEFAULT_SYSTEM_PROMPT: &str = "你是一个社交应用中的中文 AI 助手。你的目标是真正理解用户的需求，并给出自然、具体、可执行的中文回答。\n\n你需要：\n1. 主动结合当前消息和完整历史对话来理解用户真正想做什么，而不是只按字面意思机械回复。\n2. 当用户表达不清晰或有多种可能理解时，先用一两句简短话语确认或澄清需求，再继续回答。\n3. 当用户说“帮我总结一下聊天”“总结一下刚才的内容”等时，直接基于你看到的全部对话记录给出清晰的要点式总结，不要让用户去复制聊天记录。\n4. 当用户询问如何实现某个功能或写代码时，请给出具体步骤和示例，而不是泛泛而谈。\n\n当用户提到“刚才”“之前”“上面说的”等表达时，需要基于完整的聊天记录理解含义并回答。";

/// Tunables for [`ChatService`]
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub limits: ContextLimits,
    pub timeout: Duration,
    pub system_prompt: String,
    /// Model for summaries and extraction; the request's model when unset
    pub memory_model: Option<String>,
    pub summary_prompt: Option<String>,
    pub extract_prompt: Option<String>,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            limits: ContextLimits::default(),
            timeout: Duration::from_secs(60),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            memory_model: None,
            summary_prompt: None,
            extract_prompt: None,
        }
    }
}

/// A reply plus the detached extraction task, if one was started
#[derive(Debug)]
pub struct ChatOutcome {
    pub reply: ChatReply,
    pub extraction: Option<JoinHandle<()>>,
}

pub struct ChatService {
    generator: Arc<dyn TextGenerator>,
    persistence: Arc<dyn Persistence>,
    summarizer: Summarizer,
    extractor: Arc<MemoryExtractor>,
    settings: ChatSettings,
}

impl ChatService {
    pub fn new(generator: Arc<dyn TextGenerator>, persistence: Arc<dyn Persistence>, settings: ChatSettings) -> Self {
        let summarizer = Summarizer::new(generator.clone(), settings.summary_prompt.clone(), settings.timeout);
        let extractor = Arc::new(MemoryExtractor::new(
            generator.clone(),
            persistence.clone(),
            settings.extract_prompt.clone(),
            settings.timeout,
        ));
        Self {
            generator,
            persistence,
            summarizer,
            extractor,
            settings,
        }
    }

    /// Run one chat turn for an optional authenticated user
    pub async fn chat(&self, user_id: Option<&str>, request: ChatRequest) -> Result<ChatOutcome, LlmError> {
        let limits = self.settings.limits;
        let system = self.system_instruction(user_id).await;
        let mut window = ContextWindow::new(system, request.messages);
        let memory_model = self
            .settings
            .memory_model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(request.model.as_str())
            .to_string();

        tracing::info!(
            "[Llm] Chat user={} model={} turns={}",
            user_id.unwrap_or("-"),
            request.model,
            window.history().len()
        );

        if window.last_user_message().is_some_and(is_summary_request) {
            match self.summarizer.summarize(&memory_model, window.history()).await {
                Ok(summary) if !summary.trim().is_empty() => {
                    let used = estimate_turns(window.history()) + estimate_tokens(&summary);
                    let extraction = user_id.map(|uid| {
                        self.extractor
                            .spawn(uid.to_string(), memory_model.clone(), window.turns_with_reply(&summary))
                    });
                    return Ok(ChatOutcome {
                        reply: ChatReply {
                            content: summary,
                            remaining_ratio: limits.remaining_ratio(used),
                            summarized: true,
                        },
                        extraction,
                    });
                }
                Ok(_) => tracing::warn!("[Llm] Requested summary came back empty, answering normally"),
                Err(e) => tracing::warn!("[Llm] Requested summary failed, answering normally: {}", e),
            }
        }

        let mut summarized = false;
        if window.state(&limits) == WindowState::NeedsSummarization {
            let (old, _) = window.split(limits.keep_recent);
            match self.summarizer.summarize(&memory_model, old).await {
                Ok(summary) if !summary.trim().is_empty() => {
                    tracing::info!("[Llm] Folded {} old turns into a summary", old.len());
                    window.splice(&summary, limits.keep_recent);
                    summarized = true;
                }
                Ok(_) => tracing::warn!("[Llm] Summary came back empty, sending full window"),
                Err(e) => tracing::error!("[Llm] Summarization failed, sending full window: {}", e),
            }
        }

        let response = self
            .generator
            .chat(GenerationRequest::new(&request.model, window.turns()), self.settings.timeout)
            .await?;

        let used = if response.prompt_eval_count > 0 {
            response.prompt_eval_count as usize
        } else {
            window.used_tokens()
        };

        let extraction = user_id.map(|uid| {
            self.extractor
                .spawn(uid.to_string(), memory_model, window.turns_with_reply(&response.content))
        });

        Ok(ChatOutcome {
            reply: ChatReply {
                content: response.content,
                remaining_ratio: limits.remaining_ratio(used),
                summarized,
            },
            extraction,
        })
    }

    async fn system_instruction(&self, user_id: Option<&str>) -> String {
        let base = self.settings.system_prompt.as_str();
        let Some(user_id) = user_id else {
            return base.to_string();
        };
        match self.persistence.user_memories(user_id).await {
            Ok(memories) => {
                tracing::debug!("[Llm] Loaded {} memories for {}", memories.len(), user_id);
                append_memories(base, &memories)
            }
            Err(e) => {
                tracing::error!("[Llm] Loading memories for {} failed: {}", user_id, e);
                base.to_string()
            }
        }
    }
}
