//! Timestamped record of a playthrough, exportable as markdown or text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::genre::Genre;

/// A single entry in the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TranscriptEntry {
    /// A session began.
    SessionStart {
        /// Flavor tag chosen for the session.
        genre: Genre,
        /// Turn budget.
        turns: u32,
        /// When the session started.
        timestamp: DateTime<Utc>,
    },
    /// A finalized story segment.
    Segment {
        /// Story text.
        text: String,
        /// When the segment was finalized.
        timestamp: DateTime<Utc>,
    },
    /// The action the player picked.
    Choice {
        /// Exact label of the chosen slot.
        text: String,
        /// When the choice was made.
        timestamp: DateTime<Utc>,
    },
    /// An error notice shown in the story area.
    Notice {
        /// Notice text.
        text: String,
        /// When it was shown.
        timestamp: DateTime<Utc>,
    },
    /// The session ended.
    End {
        /// Closing text.
        text: String,
        /// When the session ended.
        timestamp: DateTime<Utc>,
    },
}

/// A chronological log of one playthrough.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    /// Create an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn append(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }

    /// All entries.
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the transcript is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Export as markdown.
    pub fn export_markdown(&self) -> String {
        let mut out = String::from("# Waaagh Tale\n\n");
        for entry in &self.entries {
            match entry {
                TranscriptEntry::SessionStart {
                    genre,
                    turns,
                    timestamp,
                } => {
                    out.push_str(&format!(
                        "*Genre: {genre}, {turns} turns, started {}*\n\n",
                        timestamp.format("%Y-%m-%d %H:%M UTC")
                    ));
                }
                TranscriptEntry::Segment { text, .. } => {
                    out.push_str(&format!("{text}\n\n"));
                }
                TranscriptEntry::Choice { text, .. } => {
                    out.push_str(&format!("> **You chose:** {text}\n\n"));
                }
                TranscriptEntry::Notice { text, .. } => {
                    out.push_str(&format!("*{text}*\n\n"));
                }
                TranscriptEntry::End { text, .. } => {
                    out.push_str(&format!("## {text}\n"));
                }
            }
        }
        out
    }

    /// Export as plain text.
    pub fn export_text(&self) -> String {
        let mut out = String::from("Waaagh Tale\n===========\n\n");
        for entry in &self.entries {
            match entry {
                TranscriptEntry::SessionStart { genre, turns, .. } => {
                    out.push_str(&format!("[{genre}, {turns} turns]\n\n"));
                }
                TranscriptEntry::Segment { text, .. } => {
                    out.push_str(&format!("{text}\n\n"));
                }
                TranscriptEntry::Choice { text, .. } => {
                    out.push_str(&format!("> {text}\n\n"));
                }
                TranscriptEntry::Notice { text, .. } => {
                    out.push_str(&format!("! {text}\n\n"));
                }
                TranscriptEntry::End { text, .. } => {
                    out.push_str(&format!("-- {text} --\n"));
                }
            }
        }
        out
    }
}
