//! Error types for the story engine.

use thiserror::Error;

use crate::state::SessionState;

/// Result type for story operations.
pub type StoryResult<T> = Result<T, StoryError>;

/// Errors reported by an inference engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The model could not be loaded. The message is shown to the user verbatim.
    #[error("{0}")]
    Load(String),

    /// The completion request was rejected before streaming began.
    #[error("request failed: {0}")]
    Request(String),

    /// The response stream broke off mid-generation.
    #[error("stream interrupted: {0}")]
    Stream(String),
}

/// Errors that can occur while driving a narrative session.
#[derive(Debug, Error)]
pub enum StoryError {
    /// Choice index outside the four slots.
    #[error("invalid choice slot: {0} (expected 0-3)")]
    InvalidChoice(usize),

    /// A request is already in flight.
    #[error("a story segment is still being generated")]
    Busy,

    /// The operation is not allowed in the current state.
    #[error("cannot {action} while {state}")]
    WrongState {
        /// What was attempted.
        action: &'static str,
        /// The state the controller was in.
        state: SessionState,
    },

    /// The session has ended; only a restart is possible.
    #[error("the story has ended")]
    SessionEnded,

    /// `generate` was called with no staged request.
    #[error("no request is waiting to be generated")]
    NothingToGenerate,

    /// Inference engine error.
    #[error(transparent)]
    Engine(#[from] EngineError),
}
