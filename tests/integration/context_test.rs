//! Bounded chat context integration tests
//!
//! Drive `ChatService` with a scripted generator and check what the model
//! actually receives.

use std::sync::Arc;

use assert_matches::assert_matches;
use moehub::backend::llm::memory::MemoryExtractor;
use moehub::backend::llm::{ChatService, ChatSettings, GenerationResponse, LlmError};
use moehub::backend::persistence::{InMemoryPersistence, Persistence};
use moehub::shared::{ChatRequest, Role, Turn};
use pretty_assertions::assert_eq;

use crate::common::{CallKind, ScriptedGenerator};
use crate::{assert_contains, assert_ok, assert_unit_interval};

fn service(generator: ScriptedGenerator) -> (ChatService, Arc<ScriptedGenerator>, Arc<InMemoryPersistence>) {
    let generator = Arc::new(generator);
    let persistence = Arc::new(InMemoryPersistence::new());
    let service = ChatService::new(generator.clone(), persistence.clone(), ChatSettings::default());
    (service, generator, persistence)
}

/// `n` alternating turns ending with a user turn, each tagged `<<i>>`
fn history(n: usize) -> Vec<Turn> {
    (0..n)
        .map(|i| {
            let role = if (n - 1 - i) % 2 == 0 { Role::User } else { Role::Assistant };
            Turn::new(role, format!("turn <<{}>>", i))
        })
        .collect()
}

fn request(messages: Vec<Turn>) -> ChatRequest {
    ChatRequest {
        model: "qwen".to_string(),
        messages,
    }
}

#[tokio::test]
async fn test_small_window_is_sent_unchanged() {
    let (service, generator, _) = service(ScriptedGenerator::new());
    let messages = history(5);

    let outcome = assert_ok!(service.chat(None, request(messages.clone())).await);

    assert_eq!(outcome.reply.content, "reply");
    assert!(!outcome.reply.summarized);
    assert!(outcome.extraction.is_none());
    assert!(generator.calls_of(CallKind::Summary).is_empty());

    let chats = generator.calls_of(CallKind::Chat);
    assert_eq!(chats.len(), 1);
    assert_eq!(chats[0].model, "qwen");
    assert_eq!(chats[0].messages[0].role, Role::System);
    assert_eq!(&chats[0].messages[1..], messages.as_slice());
}

#[tokio::test]
async fn test_long_history_is_spliced_to_recent_turns() {
    let (service, generator, _) = service(ScriptedGenerator::new().with_summary("older stuff"));

    let outcome = assert_ok!(service.chat(None, request(history(50))).await);
    assert!(outcome.reply.summarized);

    let summaries = generator.calls_of(CallKind::Summary);
    assert_eq!(summaries.len(), 1);
    assert_contains!(summaries[0].messages[1].content, "<<33>>");
    assert!(!summaries[0].messages[1].content.contains("<<34>>"));

    let chats = generator.calls_of(CallKind::Chat);
    assert_eq!(chats.len(), 1);
    let sent = &chats[0].messages;
    assert_eq!(sent.len(), 17);
    assert_contains!(sent[0].content, "older stuff");
    for i in 0..34 {
        let marker = format!("<<{}>>", i);
        assert!(sent.iter().all(|t| !t.content.contains(&marker)), "{} leaked", marker);
    }
    assert_eq!(sent[1].content, "turn <<34>>");
    assert_eq!(sent[16].content, "turn <<49>>");
}

#[tokio::test]
async fn test_summary_lands_in_system_message() {
    let (service, generator, _) = service(ScriptedGenerator::new().with_summary("用户喜欢绘画"));

    let outcome = assert_ok!(service.chat(None, request(history(45))).await);
    assert!(outcome.reply.summarized);

    let chats = generator.calls_of(CallKind::Chat);
    let sent = &chats[0].messages;
    assert_eq!(sent.len(), 17);
    assert_eq!(sent[0].role, Role::System);
    assert_contains!(sent[0].content, "用户喜欢绘画");
}

#[tokio::test]
async fn test_token_budget_triggers_summarization() {
    let (service, generator, _) = service(ScriptedGenerator::new());
    let messages: Vec<Turn> = (0..20)
        .map(|i| {
            let role = if i % 2 == 0 { Role::Assistant } else { Role::User };
            Turn::new(role, "字".repeat(200))
        })
        .collect();

    let outcome = assert_ok!(service.chat(None, request(messages)).await);

    assert!(outcome.reply.summarized);
    assert_eq!(generator.calls_of(CallKind::Chat)[0].messages.len(), 17);
}

#[tokio::test]
async fn test_failed_summarization_sends_full_window() {
    let (service, generator, _) = service(ScriptedGenerator::new().failing_summary());

    let outcome = assert_ok!(service.chat(None, request(history(45))).await);

    assert!(!outcome.reply.summarized);
    assert_eq!(generator.calls_of(CallKind::Chat)[0].messages.len(), 46);
}

#[tokio::test]
async fn test_generation_failure_fails_the_turn() {
    let (service, _, _) = service(ScriptedGenerator::new().failing_chat());

    let result = service.chat(None, request(history(3))).await;

    assert_matches!(result, Err(LlmError::Status { status: 500, .. }));
}

#[tokio::test]
async fn test_remaining_ratio_uses_reported_prompt_size() {
    let response = GenerationResponse {
        content: "ok".to_string(),
        prompt_eval_count: 1000,
        eval_count: 5,
    };
    let (service, _, _) = service(ScriptedGenerator::new().with_chat(response));

    let outcome = assert_ok!(service.chat(None, request(history(3))).await);

    let usable = (4096.0_f64 * 0.7) as usize;
    let expected = (usable - 1000) as f64 / usable as f64;
    assert!((outcome.reply.remaining_ratio - expected).abs() < 1e-9);
}

#[tokio::test]
async fn test_oversized_prompt_reports_zero_remaining() {
    let response = GenerationResponse {
        content: "ok".to_string(),
        prompt_eval_count: 1_000_000,
        eval_count: 1,
    };
    let (service, _, _) = service(ScriptedGenerator::new().with_chat(response));

    let outcome = assert_ok!(service.chat(None, request(history(3))).await);

    assert_eq!(outcome.reply.remaining_ratio, 0.0);
}

#[tokio::test]
async fn test_remaining_ratio_falls_back_to_estimate() {
    let (service, _, _) = service(ScriptedGenerator::new());

    let outcome = assert_ok!(service.chat(None, request(history(3))).await);

    assert_unit_interval!(outcome.reply.remaining_ratio);
    assert!(outcome.reply.remaining_ratio < 1.0);
}

#[tokio::test]
async fn test_explicit_summary_request_short_circuits() {
    let (service, generator, _) = service(ScriptedGenerator::new().with_summary("要点：A；B"));
    let mut messages = history(6);
    messages.push(Turn::user("总结一下"));

    let outcome = assert_ok!(service.chat(None, request(messages)).await);

    assert!(outcome.reply.summarized);
    assert_eq!(outcome.reply.content, "要点：A；B");
    assert_unit_interval!(outcome.reply.remaining_ratio);
    assert!(generator.calls_of(CallKind::Chat).is_empty());
    assert_eq!(generator.calls_of(CallKind::Summary).len(), 1);
}

#[tokio::test]
async fn test_long_message_mentioning_summary_is_answered_normally() {
    let (service, generator, _) = service(ScriptedGenerator::new());
    let question = "请帮我总结一下这篇很长的文章里面关于分布式系统一致性模型的主要观点和论据吧";
    assert!(question.chars().count() > 30);

    let outcome = assert_ok!(service.chat(None, request(vec![Turn::user(question)])).await);

    assert!(!outcome.reply.summarized);
    assert_eq!(generator.calls_of(CallKind::Chat).len(), 1);
}

#[tokio::test]
async fn test_empty_summary_falls_through_to_chat() {
    let (service, generator, _) = service(ScriptedGenerator::new().with_summary("   "));

    let outcome = assert_ok!(service.chat(None, request(vec![Turn::user("总结")])).await);

    assert!(!outcome.reply.summarized);
    assert_eq!(outcome.reply.content, "reply");
    assert_eq!(generator.calls_of(CallKind::Chat).len(), 1);
}

#[tokio::test]
async fn test_authenticated_turn_runs_extraction() {
    let extraction = r#"```json
[{"key":"hobby","value":"painting"}]
```"#;
    let (service, generator, persistence) = service(ScriptedGenerator::new().with_extraction(extraction));

    let outcome = assert_ok!(service.chat(Some("7"), request(vec![Turn::user("我喜欢画画")])).await);
    outcome.extraction.expect("extraction task").await.unwrap();

    let calls = generator.calls_of(CallKind::Extraction);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].messages.len(), 1);
    assert_contains!(calls[0].messages[0].content, "我喜欢画画");
    assert_contains!(calls[0].messages[0].content, "reply");

    let memories = persistence.user_memories("7").await.unwrap();
    assert_eq!(memories.len(), 1);
    assert_eq!((memories[0].key.as_str(), memories[0].value.as_str()), ("hobby", "painting"));
}

#[tokio::test]
async fn test_summary_request_still_runs_extraction() {
    let (service, generator, _) = service(ScriptedGenerator::new());

    let outcome = assert_ok!(service.chat(Some("7"), request(vec![Turn::user("总结")])).await);
    assert!(outcome.reply.summarized);
    outcome.extraction.expect("extraction task").await.unwrap();

    assert_eq!(generator.calls_of(CallKind::Extraction).len(), 1);
    assert!(generator.calls_of(CallKind::Chat).is_empty());
}

#[tokio::test]
async fn test_stored_memories_are_injected() {
    let (service, generator, persistence) = service(ScriptedGenerator::new());
    persistence.upsert_memory("7", "name", "小明").await.unwrap();
    persistence.upsert_memory("8", "name", "someone else").await.unwrap();

    let outcome = assert_ok!(service.chat(Some("7"), request(vec![Turn::user("你好")])).await);
    outcome.extraction.expect("extraction task").await.unwrap();

    let system = &generator.calls_of(CallKind::Chat)[0].messages[0].content;
    assert_contains!(system, "- name: 小明");
    assert!(!system.contains("someone else"));
}

#[tokio::test]
async fn test_anonymous_turn_gets_no_memories() {
    let (service, generator, persistence) = service(ScriptedGenerator::new());
    persistence.upsert_memory("7", "name", "小明").await.unwrap();

    assert_ok!(service.chat(None, request(vec![Turn::user("你好")])).await);

    let system = &generator.calls_of(CallKind::Chat)[0].messages[0].content;
    assert!(!system.contains("小明"));
}

#[tokio::test]
async fn test_repeated_extraction_keeps_one_record_per_key() {
    let generator = Arc::new(ScriptedGenerator::new().with_extraction(r#"[{"key":"hobby","value":"painting"}]"#));
    let persistence = Arc::new(InMemoryPersistence::new());
    let extractor = MemoryExtractor::new(
        generator.clone(),
        persistence.clone(),
        None,
        std::time::Duration::from_secs(5),
    );
    let turns = vec![Turn::user("我喜欢画画"), Turn::assistant("真不错")];

    assert_eq!(assert_ok!(extractor.extract("7", "qwen", &turns).await), 1);
    assert_eq!(assert_ok!(extractor.extract("7", "qwen", &turns).await), 1);

    let memories = persistence.user_memories("7").await.unwrap();
    assert_eq!(memories.len(), 1);
    assert_eq!(memories[0].value, "painting");
}

#[tokio::test]
async fn test_unparseable_extraction_stores_nothing() {
    let generator = Arc::new(ScriptedGenerator::new().with_extraction("I could not find anything"));
    let persistence = Arc::new(InMemoryPersistence::new());
    let extractor = MemoryExtractor::new(generator, persistence.clone(), None, std::time::Duration::from_secs(5));
    let turns = vec![Turn::user("hi"), Turn::assistant("hello")];

    assert_eq!(assert_ok!(extractor.extract("7", "qwen", &turns).await), 0);
    assert!(persistence.user_memories("7").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_configured_memory_model_is_used_for_summaries() {
    let generator = Arc::new(ScriptedGenerator::new());
    let settings = ChatSettings {
        memory_model: Some("tiny".to_string()),
        ..ChatSettings::default()
    };
    let service = ChatService::new(generator.clone(), Arc::new(InMemoryPersistence::new()), settings);

    assert_ok!(service.chat(None, request(history(45))).await);

    assert_eq!(generator.calls_of(CallKind::Summary)[0].model, "tiny");
    assert_eq!(generator.calls_of(CallKind::Chat)[0].model, "qwen");
}
