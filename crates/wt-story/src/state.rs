//! Controller lifecycle states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where the controller is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No engine ready, no session.
    #[default]
    Idle,
    /// Engine ready; genre and turn budget not yet chosen.
    Configuring,
    /// A request to the inference engine is outstanding.
    Generating,
    /// A segment and four choices are on display.
    AwaitingChoice,
    /// Turn budget exhausted or session ended externally. Terminal.
    Ended,
}

impl SessionState {
    /// Whether choice slots should be selectable.
    pub fn accepts_choice(self) -> bool {
        self == SessionState::AwaitingChoice
    }

    /// Whether the session can never generate again.
    pub fn is_terminal(self) -> bool {
        self == SessionState::Ended
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Idle => "idle",
            SessionState::Configuring => "configuring",
            SessionState::Generating => "generating",
            SessionState::AwaitingChoice => "awaiting a choice",
            SessionState::Ended => "ended",
        };
        f.write_str(s)
    }
}
