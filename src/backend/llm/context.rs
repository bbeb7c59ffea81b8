/**
 * Context Window Manager
 *
 * Keeps one exchange's prompt inside the model's usable token budget. The
 * window is `[system] + history`; when history grows past the configured
 * length, or the estimate exceeds the budget, the older part is summarized
 * and folded into the system turn, leaving `[system + summary] + recent`.
 *
 * Token counts are estimated as Unicode code points. This is a safety
 * margin, not a tokenizer.
 */

use crate::backend::persistence::UserMemory;
use crate::shared::{Role, Turn};

/// Hard context size of the target model
pub const DEFAULT_MAX_TOKENS: usize = 4096;
/// Share of the hard limit the prompt may use
pub const DEFAULT_SAFE_RATIO: f64 = 0.7;
/// Longest history sent unsummarized
pub const DEFAULT_MAX_HISTORY: usize = 40;
/// Turns always kept verbatim after a splice
pub const DEFAULT_KEEP_RECENT: usize = 16;

/// Longest message, in code points, that can be an explicit summary request
pub const SUMMARY_REQUEST_MAX_CHARS: usize = 30;

const SUMMARY_EXACT_PHRASES: &[&str] = &["总结", "概括", "梳理"];
const SUMMARY_TRIGGER_PHRASES: &[&str] = &[
    "总结一下",
    "帮我总结",
    "整理一下",
    "帮我整理",
    "概括一下",
    "帮我概括",
    "梳理一下",
    "帮我梳理",
];

const MEMORY_HEADER: &str = "用户的长期背景与偏好信息如下，请在回答时适当参考：";
const SUMMARY_HEADER: &str = "之前部分对话的简要总结如下，请在理解用户当前消息时一并参考：";

/// Budget parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextLimits {
    pub max_tokens: usize,
    pub safe_ratio: f64,
    pub max_history: usize,
    pub keep_recent: usize,
}

impl Default for ContextLimits {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            safe_ratio: DEFAULT_SAFE_RATIO,
            max_history: DEFAULT_MAX_HISTORY,
            keep_recent: DEFAULT_KEEP_RECENT,
        }
    }
}

impl ContextLimits {
    /// `max_tokens * safe_ratio`, never zero for a nonzero limit
    pub fn usable_tokens(&self) -> usize {
        let usable = (self.max_tokens as f64 * self.safe_ratio) as usize;
        if usable == 0 {
            self.max_tokens
        } else {
            usable
        }
    }

    /// Free share of the usable budget, clamped to `[0, 1]`
    pub fn remaining_ratio(&self, used_tokens: usize) -> f64 {
        let usable = self.usable_tokens();
        if usable == 0 {
            return 1.0;
        }
        let remaining = usable.saturating_sub(used_tokens).min(usable);
        (remaining as f64 / usable as f64).clamp(0.0, 1.0)
    }
}

pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count()
}

pub fn estimate_turns(turns: &[Turn]) -> usize {
    turns.iter().map(|t| estimate_tokens(&t.content)).sum()
}

/// Outcome of checking a window against its limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    Fits,
    NeedsSummarization,
}

/// The prompt for one exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextWindow {
    system: Turn,
    history: Vec<Turn>,
}

impl ContextWindow {
    pub fn new(system: impl Into<String>, history: Vec<Turn>) -> Self {
        Self {
            system: Turn::system(system),
            history,
        }
    }

    pub fn system(&self) -> &Turn {
        &self.system
    }

    /// Everything after the system turn
    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// Number of messages sent to the model, the system turn included
    pub fn message_count(&self) -> usize {
        self.history.len() + 1
    }

    pub fn used_tokens(&self) -> usize {
        estimate_tokens(&self.system.content) + estimate_turns(&self.history)
    }

    /// Whether a summarize-and-splice must run before the model call
    ///
    /// Either trigger only counts when there are more history turns than
    /// `keep_recent`, otherwise there would be nothing old to summarize.
    pub fn state(&self, limits: &ContextLimits) -> WindowState {
        if self.history.len() <= limits.keep_recent {
            return WindowState::Fits;
        }
        let too_long = self.history.len() > limits.max_history;
        let too_big = self.used_tokens() > limits.usable_tokens();
        if too_long || too_big {
            WindowState::NeedsSummarization
        } else {
            WindowState::Fits
        }
    }

    /// Split history into `(old, recent)` with at most `keep_recent` recent turns
    pub fn split(&self, keep_recent: usize) -> (&[Turn], &[Turn]) {
        let at = self.history.len().saturating_sub(keep_recent);
        self.history.split_at(at)
    }

    /// Fold `summary` into the system turn and drop all but the recent turns
    pub fn splice(&mut self, summary: &str, keep_recent: usize) {
        self.system.content = append_summary(&self.system.content, summary);
        let at = self.history.len().saturating_sub(keep_recent);
        self.history.drain(..at);
    }

    /// The window as sent to the model
    pub fn turns(&self) -> Vec<Turn> {
        let mut turns = Vec::with_capacity(self.message_count());
        turns.push(self.system.clone());
        turns.extend(self.history.iter().cloned());
        turns
    }

    /// The window followed by a reply, as handed to memory extraction
    pub fn turns_with_reply(&self, reply: &str) -> Vec<Turn> {
        let mut turns = self.turns();
        turns.push(Turn::assistant(reply));
        turns
    }

    /// Content of the last turn if it was written by the user
    pub fn last_user_message(&self) -> Option<&str> {
        self.history
            .last()
            .filter(|t| t.role == Role::User)
            .map(|t| t.content.as_str())
    }
}

/// Whether `content` is a short explicit request to summarize the conversation
pub fn is_summary_request(content: &str) -> bool {
    let content = content.trim();
    if content.is_empty() || content.chars().count() > SUMMARY_REQUEST_MAX_CHARS {
        return false;
    }
    SUMMARY_EXACT_PHRASES.contains(&content) || SUMMARY_TRIGGER_PHRASES.iter().any(|p| content.contains(p))
}

/// Append stored memories to a system instruction as a bulleted block
///
/// Memories with an empty key or value are skipped. With nothing left the
/// instruction is returned unchanged.
pub fn append_memories(system: &str, memories: &[UserMemory]) -> String {
    let lines: Vec<String> = memories
        .iter()
        .filter(|m| !m.key.is_empty() && !m.value.is_empty())
        .map(|m| format!("{}: {}", m.key, m.value))
        .collect();
    if lines.is_empty() {
        return system.to_string();
    }
    format!("{}\n\n{}\n- {}", system, MEMORY_HEADER, lines.join("\n- "))
}

pub fn append_summary(system: &str, summary: &str) -> String {
    format!("{}\n\n{}\n{}", system, SUMMARY_HEADER, summary)
}
