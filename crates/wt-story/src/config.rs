//! Configuration for a narrative session.

use crate::engine::SamplingOptions;
use crate::genre::Genre;

/// Turn budget used when the requested one is missing or unusable.
pub const DEFAULT_TURNS: u32 = 5;

/// Model requested when none is configured.
pub const DEFAULT_MODEL: &str = "Llama-3-8B-Instruct-q4f32_1-MLC-1k";

/// Coerce user-entered turn count text into a positive budget.
///
/// Non-numeric, zero and negative inputs all yield [`DEFAULT_TURNS`].
pub fn parse_turn_count(input: &str) -> u32 {
    match input.trim().parse::<i64>() {
        Ok(n) if n > 0 => u32::try_from(n).unwrap_or(u32::MAX),
        _ => DEFAULT_TURNS,
    }
}

/// Configuration for a narrative controller.
#[derive(Debug, Clone)]
pub struct StoryConfig {
    /// Model identifier passed to the engine on load.
    pub model: String,
    /// Sampling options passed to the engine on load.
    pub sampling: SamplingOptions,
    /// Genre used by [`NarrativeController::start_configured`](crate::NarrativeController::start_configured).
    pub genre: Genre,
    /// Turn budget used by [`NarrativeController::start_configured`](crate::NarrativeController::start_configured).
    pub turns: u32,
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            sampling: SamplingOptions::default(),
            genre: Genre::Default,
            turns: DEFAULT_TURNS,
        }
    }
}

impl StoryConfig {
    /// Set the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the sampling options.
    pub fn with_sampling(mut self, sampling: SamplingOptions) -> Self {
        self.sampling = sampling;
        self
    }

    /// Set the default genre.
    pub fn with_genre(mut self, genre: Genre) -> Self {
        self.genre = genre;
        self
    }

    /// Set the default turn budget (zero becomes [`DEFAULT_TURNS`]).
    pub fn with_turns(mut self, turns: u32) -> Self {
        self.turns = if turns == 0 { DEFAULT_TURNS } else { turns };
        self
    }
}
