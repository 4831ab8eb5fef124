//! Inference engine contract.
//!
//! The controller never runs a model itself. It hands the full conversation
//! history to an [`InferenceEngine`] and consumes the streamed reply.

mod scripted;

pub use scripted::{SCRIPT_SEPARATOR, SCRIPTED_MODEL, ScriptedEngine, ScriptedReply};

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::EngineError;
use crate::message::Message;

/// Sampling options passed to the engine when the model is loaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingOptions {
    /// Softmax temperature.
    pub temperature: f32,
    /// Nucleus sampling threshold.
    pub top_p: f32,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.95,
        }
    }
}

/// One item of a streamed completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionChunk {
    /// Incremental text.
    Delta(String),
    /// The finalized full message. Ends the stream.
    Done(String),
}

/// Lazy, finite, non-restartable stream of completion chunks.
///
/// If the stream ends without [`CompletionChunk::Done`], the concatenated
/// deltas are the final message.
pub type CompletionStream = BoxStream<'static, Result<CompletionChunk, EngineError>>;

/// An external engine that turns a conversation into a streamed reply.
#[async_trait]
pub trait InferenceEngine: Send + Sync {
    /// Load a model, reporting human-readable progress text along the way.
    async fn initialize(
        &mut self,
        model: &str,
        options: SamplingOptions,
        progress: &mut (dyn FnMut(String) + Send),
    ) -> Result<(), EngineError>;

    /// Start a completion for the full history. The engine keeps no state between calls.
    async fn complete(&mut self, history: &[Message]) -> Result<CompletionStream, EngineError>;

    /// Model identifiers this engine can load.
    async fn available_models(&self) -> Result<Vec<String>, EngineError>;
}

#[async_trait]
impl<E: InferenceEngine + ?Sized> InferenceEngine for Box<E> {
    async fn initialize(
        &mut self,
        model: &str,
        options: SamplingOptions,
        progress: &mut (dyn FnMut(String) + Send),
    ) -> Result<(), EngineError> {
        (**self).initialize(model, options, progress).await
    }

    async fn complete(&mut self, history: &[Message]) -> Result<CompletionStream, EngineError> {
        (**self).complete(history).await
    }

    async fn available_models(&self) -> Result<Vec<String>, EngineError> {
        (**self).available_models().await
    }
}
