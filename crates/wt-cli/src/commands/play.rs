use std::io::{self, BufRead, Write};
use std::path::Path;

use colored::Colorize;

use wt_story::{
    EventSink, Genre, InferenceEngine, NarrativeController, SessionEvent, SessionState,
    parse_turn_count,
};

use super::{EngineArgs, EngineSetup};

/// Prints the story as it streams in.
#[derive(Default)]
struct LinePrinter {
    printed: String,
}

impl LinePrinter {
    fn write_fresh(&mut self, text: &str) {
        if let Some(rest) = text.strip_prefix(self.printed.as_str()) {
            print!("{rest}");
        } else {
            // The final parse trimmed something already shown; start over.
            print!("\n{text}");
        }
        self.printed = text.to_string();
        io::stdout().flush().ok();
    }
}

impl EventSink for LinePrinter {
    fn emit(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::LoadProgress(text) => eprintln!("{}", text.dimmed()),
            SessionEvent::SegmentStarted => self.printed.clear(),
            SessionEvent::StoryPreview(text) => self.write_fresh(text),
            SessionEvent::SegmentFinalized(text) => {
                self.write_fresh(text);
                println!("\n");
            }
            SessionEvent::ChoicesUpdated(choices) => {
                for (i, label) in choices.iter().enumerate() {
                    println!("  {} {label}", format!("{})", i + 1).cyan().bold());
                }
                println!();
            }
            SessionEvent::Notice(text) => println!("\n{}\n", text.bold()),
            SessionEvent::Error(text) => println!("\n{}\n", text.red()),
            SessionEvent::StateChanged { .. }
            | SessionEvent::ModelsAvailable(_)
            | SessionEvent::ChoicesDisabled(_)
            | SessionEvent::Ended { .. } => {}
        }
    }
}

pub fn run(
    genre: &str,
    turns: &str,
    engine: &EngineArgs,
    transcript: Option<&Path>,
) -> Result<(), String> {
    let genre = Genre::from_name(genre);
    let turns = parse_turn_count(turns);
    let setup = super::build_engine(engine)?;
    super::block_on(play(setup, genre, turns, transcript))?
}

async fn play(
    setup: EngineSetup,
    genre: Genre,
    turns: u32,
    transcript: Option<&Path>,
) -> Result<(), String> {
    let config = setup.story.with_genre(genre).with_turns(turns);
    let mut controller = NarrativeController::new(setup.engine, config);
    controller.subscribe(LinePrinter::default());

    controller
        .load_model()
        .await
        .map_err(|e| format!("failed to load model: {e}"))?;

    println!(
        "  {} {} tale, {turns} turns",
        "Waaagh Tales:".bold(),
        genre.name()
    );
    println!("  Pick 1-4 to choose, 'q' to quit.\n");

    controller
        .start_configured()
        .await
        .map_err(|e| e.to_string())?;

    read_choices(&mut controller).await?;

    if let (Some(path), Some(session)) = (transcript, controller.session()) {
        let content = if path.extension().is_some_and(|ext| ext == "txt") {
            session.transcript().export_text()
        } else {
            session.transcript().export_markdown()
        };
        std::fs::write(path, content)
            .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
        println!("  Transcript written to {}", path.display());
    }
    Ok(())
}

async fn read_choices<E: InferenceEngine>(
    controller: &mut NarrativeController<E>,
) -> Result<(), String> {
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut line = String::new();

    while controller.state() != SessionState::Ended {
        print!("> ");
        io::stdout().flush().map_err(|e| e.to_string())?;

        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => {
                controller.end_session();
                break;
            }
            Err(e) => return Err(e.to_string()),
            _ => {}
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("q") || input.eq_ignore_ascii_case("quit") {
            controller.end_session();
            break;
        }

        match input.parse::<usize>() {
            Ok(n @ 1..=4) => {
                println!();
                if let Err(e) = controller.choose(n - 1).await {
                    println!("{}\n", e.to_string().yellow());
                }
            }
            _ => println!("{}\n", "Pick a choice from 1 to 4, or 'q' to quit.".yellow()),
        }
    }

    Ok(())
}
