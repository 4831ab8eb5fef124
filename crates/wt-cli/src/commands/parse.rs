use std::io::{self, Read};
use std::path::Path;

use colored::Colorize;

use wt_story::parse_response;

/// Parse a raw response from a file or stdin and print what the controller would show.
pub fn run(file: Option<&Path>) -> Result<(), String> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("failed to read stdin: {e}"))?;
            buf
        }
    };

    let parsed = parse_response(&raw);
    if parsed.choices.is_empty() {
        return Err("empty response".into());
    }

    println!("{}", "Story".bold());
    if parsed.story.is_empty() {
        println!("  {}", "(no story text)".dimmed());
    } else {
        println!("{}", parsed.story);
    }
    println!();
    println!("{}", "Choices".bold());
    for (i, choice) in parsed.choices.iter().enumerate() {
        println!("  {}) {choice}", i + 1);
    }
    Ok(())
}
