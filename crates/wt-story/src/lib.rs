//! Turn-based narrative session controller for Waaagh Tales.
//!
//! Drives an external inference engine to tell a branching, second-person
//! story about an Ork Boy in a warband. After every narrative beat the
//! controller offers exactly four choices and loops until the turn budget
//! runs out. Rendering layers subscribe to [`SessionEvent`]s and never touch
//! controller state directly.

/// Session configuration.
pub mod config;
/// Narrative session controller and its state machine.
pub mod controller;
/// Inference engine contract and the scripted engine.
pub mod engine;
/// Error types for the story engine.
pub mod error;
/// Observable session events and sinks.
pub mod event;
/// Genre flavor tags.
pub mod genre;
/// Conversation messages.
pub mod message;
/// Response parsing.
pub mod parser;
/// Prompt templates.
pub mod prompt;
/// Per-playthrough session data.
pub mod session;
/// Controller lifecycle states.
pub mod state;
/// Timestamped playthrough record.
pub mod transcript;

pub use config::{DEFAULT_MODEL, DEFAULT_TURNS, StoryConfig, parse_turn_count};
pub use controller::{END_NOTICE, NarrativeController, RESET_NOTICE, TurnOutcome};
pub use engine::{
    CompletionChunk, CompletionStream, InferenceEngine, SCRIPTED_MODEL, SamplingOptions,
    ScriptedEngine, ScriptedReply,
};
pub use error::{EngineError, StoryError, StoryResult};
pub use event::{EndReason, EventLog, EventSink, SessionEvent};
pub use genre::Genre;
pub use message::{Message, Role};
pub use parser::{
    CHOICE_COUNT, ChoiceSet, ERROR_STORY, FALLBACK_CHOICES, ParsedResponse, parse_response,
    preview_story,
};
pub use session::{Segment, SegmentKind, Session};
pub use state::SessionState;
pub use transcript::{Transcript, TranscriptEntry};
