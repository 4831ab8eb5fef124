//! Launch the full-screen story UI.

use wt_story::{Genre, parse_turn_count};

use super::EngineArgs;

/// Build the engine and hand the terminal to the UI.
pub fn run(genre: &str, turns: &str, engine: &EngineArgs) -> Result<(), String> {
    let setup = super::build_engine(engine)?;
    crate::tui::run(setup, Genre::from_name(genre), parse_turn_count(turns))
}
