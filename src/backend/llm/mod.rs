//! LLM Module
//!
//! Bounded conversational context management in front of a text-generation
//! service.
//!
//! # Module Structure
//!
//! ```text
//! llm/
//! ├── client.rs     - TextGenerator trait, OllamaClient, LlmError
//! ├── context.rs    - Token estimate, ContextLimits, ContextWindow, trigger phrases
//! ├── summarizer.rs - Digest of old turns
//! ├── memory.rs     - Detached memory extraction
//! ├── service.rs    - ChatService, one chat turn end to end
//! ├── stream.rs     - NDJSON to SSE/WebSocket relay
//! └── handlers.rs   - HTTP and chat socket handlers
//! ```
//!
//! # Flow
//!
//! ```text
//! request ─> memories ─> fast path? ──yes──> summarizer ─> reply (summarized)
//!                            │                                   │
//!                            no                                  │
//!                            v                                   v
//!                 window too big? ─> summarize + splice    extraction task
//!                            │                                   ^
//!                            v                                   │
//!                      TextGenerator ─> reply ───────────────────┘
//! ```

pub mod client;
pub mod context;
pub mod handlers;
pub mod memory;
pub mod service;
pub mod stream;
pub mod summarizer;

pub use client::{ByteStream, GenerationRequest, GenerationResponse, LlmError, OllamaClient, TextGenerator};
pub use context::{ContextLimits, ContextWindow, WindowState};
pub use memory::MemoryExtractor;
pub use service::{ChatOutcome, ChatService, ChatSettings};
pub use summarizer::Summarizer;
