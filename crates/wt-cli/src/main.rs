//! CLI frontend for Waaagh Tales.

mod commands;
mod logging;
mod tui;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use commands::EngineArgs;

#[derive(Parser)]
#[command(
    name = "wt",
    about = "Waaagh Tales: branching Ork stories told by a local language model",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a story in the terminal, one line per choice
    Play {
        /// Flavor tag: horror, funny, adventure, epic, default
        #[arg(short, long, default_value = "default")]
        genre: String,

        /// Number of choices before the story ends (invalid values mean 5)
        #[arg(short, long, default_value = "5")]
        turns: String,

        #[command(flatten)]
        engine: EngineArgs,

        /// Write a transcript here when the story ends (plain text for .txt, markdown otherwise)
        #[arg(long)]
        transcript: Option<PathBuf>,
    },

    /// Play a story in a full-screen terminal UI
    Tui {
        /// Preselected flavor tag
        #[arg(short, long, default_value = "default")]
        genre: String,

        /// Preselected number of turns
        #[arg(short, long, default_value = "5")]
        turns: String,

        #[command(flatten)]
        engine: EngineArgs,

        /// Append logs to this file (the screen belongs to the UI)
        #[arg(long)]
        log_file: Option<PathBuf>,
    },

    /// List the models an OpenAI-compatible server offers
    Models {
        /// Server root (default: http://127.0.0.1:8080)
        #[arg(long)]
        base_url: Option<String>,

        /// Engine config file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Parse a raw model response and show its story and choices
    Parse {
        /// File holding the response (default: stdin)
        file: Option<PathBuf>,
    },

    /// List flavor tags and their tone instructions
    Genres,
}

fn main() {
    let cli = Cli::parse();

    let log_guard = match &cli.command {
        Commands::Tui { log_file, .. } => logging::init_file(log_file.as_deref()),
        _ => {
            logging::init_stderr();
            Ok(None)
        }
    };
    let log_guard = match log_guard {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Play {
            genre,
            turns,
            engine,
            transcript,
        } => commands::play::run(&genre, &turns, &engine, transcript.as_deref()),
        Commands::Tui {
            genre,
            turns,
            engine,
            ..
        } => commands::tui::run(&genre, &turns, &engine),
        Commands::Models { base_url, config } => {
            commands::models::run(base_url.as_deref(), config.as_deref())
        }
        Commands::Parse { file } => commands::parse::run(file.as_deref()),
        Commands::Genres => commands::genres::run(),
    };

    // Flush buffered log lines before a possible exit.
    drop(log_guard);

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
