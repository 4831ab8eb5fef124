use colored::Colorize;

use wt_story::Genre;

pub fn run() -> Result<(), String> {
    for genre in Genre::ALL {
        println!("  {} {}", format!("{:<10}", genre.name()).bold(), genre.flavor());
    }
    Ok(())
}
