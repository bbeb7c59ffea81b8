//! Integration tests against the library's public API

pub mod context_test;
pub mod ollama_test;
