//! OpenAI-compatible inference engine for Waaagh Tales.
//!
//! Talks to a locally running chat-completions server (llama.cpp
//! `llama-server`, LM Studio, Ollama) and streams replies back to the
//! narrative controller as server-sent events.

/// Engine connection settings.
pub mod config;
/// Error types for the HTTP engine.
pub mod error;
/// Streaming chat-completions client.
pub mod openai;
/// Server-sent event decoding.
pub mod sse;

pub use config::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, EngineConfig};
pub use error::{ConfigError, HttpError, HttpResult};
pub use openai::OpenAiEngine;
