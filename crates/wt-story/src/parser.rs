//! Response parsing.
//!
//! Splits engine output laid out as `STORY: ... CHOICES: 1) ... 2) ...` into
//! story text and exactly four choices. Parsing never fails: missing markers
//! and short or long choice lists are absorbed by padding and truncation.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::prompt::{CHOICES_MARKER, STORY_MARKER};

/// Number of choice slots.
pub const CHOICE_COUNT: usize = 4;

/// Story text shown when a segment could not be produced.
pub const ERROR_STORY: &str = "An error occurred while generating the story.";

/// Choices offered after a failed request.
pub const FALLBACK_CHOICES: [&str; CHOICE_COUNT] =
    ["Try again", "Restart", "Continue anyway", "Start over"];

/// Label of a disabled slot once the story has ended.
pub const SENTINEL_CHOICE: &str = "\u{2014}";

static CHOICE_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]\)").expect("choice split pattern is valid"));

/// Exactly four choice labels, one per slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceSet([String; CHOICE_COUNT]);

impl ChoiceSet {
    /// Build a set from any number of labels, padding with `Choice N` or truncating.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut labels: Vec<String> = labels
            .into_iter()
            .take(CHOICE_COUNT)
            .map(Into::into)
            .collect();
        pad_choices(&mut labels);
        let mut iter = labels.into_iter();
        Self(std::array::from_fn(|_| iter.next().unwrap_or_default()))
    }

    /// The fixed set shown after a failed request.
    pub fn fallback() -> Self {
        Self::from_labels(FALLBACK_CHOICES)
    }

    /// The unselectable set shown once the story has ended.
    pub fn sentinel() -> Self {
        Self::from_labels([SENTINEL_CHOICE; CHOICE_COUNT])
    }

    /// Label in a slot (0-based).
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    /// Iterate over the labels in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// The labels as a slice.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for ChoiceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, label) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}) {label}", i + 1)?;
        }
        Ok(())
    }
}

/// Story text and choices extracted from one response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedResponse {
    /// Narrative text, label stripped and trimmed.
    pub story: String,
    /// Choice labels. Empty only for empty input, otherwise exactly four.
    pub choices: Vec<String>,
}

impl ParsedResponse {
    /// The fixed result used when a segment could not be produced.
    pub fn failure() -> Self {
        Self {
            story: ERROR_STORY.to_string(),
            choices: FALLBACK_CHOICES.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// The choices as a four-slot set.
    pub fn choice_set(&self) -> ChoiceSet {
        ChoiceSet::from_labels(self.choices.iter().cloned())
    }
}

/// Parse a raw engine response.
pub fn parse_response(raw: &str) -> ParsedResponse {
    if raw.is_empty() {
        return ParsedResponse::default();
    }

    let (story_part, choices_part) = raw.split_once(CHOICES_MARKER).unwrap_or((raw, ""));

    let mut choices: Vec<String> = CHOICE_SPLIT
        .split(choices_part)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .take(CHOICE_COUNT)
        .map(str::to_string)
        .collect();
    pad_choices(&mut choices);

    ParsedResponse {
        story: strip_story_label(story_part).to_string(),
        choices,
    }
}

/// Story text to show while a response is still streaming.
///
/// Returns `None` once the choices marker has appeared, or while there is no
/// story text yet. After that point only the final parse is authoritative.
pub fn preview_story(partial: &str) -> Option<String> {
    if partial.contains(CHOICES_MARKER) {
        return None;
    }
    let story = strip_story_label(partial);
    (!story.is_empty()).then(|| story.to_string())
}

fn strip_story_label(text: &str) -> &str {
    let text = text.trim();
    match text.get(..STORY_MARKER.len()) {
        Some(head) if head.eq_ignore_ascii_case(STORY_MARKER) => text[STORY_MARKER.len()..].trim(),
        _ => text,
    }
}

fn pad_choices(choices: &mut Vec<String>) {
    while choices.len() < CHOICE_COUNT {
        choices.push(format!("Choice {}", choices.len() + 1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn well_formed_response() {
        let parsed =
            parse_response("STORY: You smash a grot.\nCHOICES:\n1) Run\n2) Loot\n3) Taunt\n4) Flee");
        assert_eq!(parsed.story, "You smash a grot.");
        assert_eq!(parsed.choices, ["Run", "Loot", "Taunt", "Flee"]);
    }

    #[test]
    fn empty_input_is_empty_result() {
        let parsed = parse_response("");
        assert_eq!(parsed.story, "");
        assert!(parsed.choices.is_empty());
    }

    #[test]
    fn label_is_case_insensitive() {
        let parsed = parse_response("story:   Dakka everywhere.\nCHOICES: 1) Shoot");
        assert_eq!(parsed.story, "Dakka everywhere.");
    }

    #[test]
    fn label_after_leading_whitespace() {
        let parsed = parse_response("\n\n  STORY:\nDa boss is angry.\n\nCHOICES:\n1) Hide");
        assert_eq!(parsed.story, "Da boss is angry.");
    }

    #[test]
    fn missing_choices_marker_pads_all_four() {
        let parsed = parse_response("STORY: Just a story, no choices.");
        assert_eq!(parsed.story, "Just a story, no choices.");
        assert_eq!(parsed.choices, ["Choice 1", "Choice 2", "Choice 3", "Choice 4"]);
    }

    #[test]
    fn short_list_is_padded_by_position() {
        let parsed = parse_response("STORY: x\nCHOICES:\n1) Run\n2) Loot");
        assert_eq!(parsed.choices, ["Run", "Loot", "Choice 3", "Choice 4"]);
    }

    #[test]
    fn long_list_is_truncated() {
        let parsed = parse_response("CHOICES: 1) a 2) b 3) c 4) d 5) e 6) f");
        assert_eq!(parsed.choices, ["a", "b", "c", "d"]);
    }

    #[test]
    fn text_before_first_number_counts_as_choice() {
        let parsed = parse_response("STORY: x\nCHOICES: pick one\n1) Run");
        assert_eq!(parsed.choices, ["pick one", "Run", "Choice 3", "Choice 4"]);
    }

    #[test]
    fn splits_only_at_first_choices_marker() {
        let parsed = parse_response("STORY: a\nCHOICES:\n1) Say CHOICES: loudly\n2) b");
        assert_eq!(parsed.choices[0], "Say CHOICES: loudly");
        assert_eq!(parsed.choices[1], "b");
    }

    #[test]
    fn failure_result_uses_fallback() {
        let parsed = ParsedResponse::failure();
        assert_eq!(parsed.story, ERROR_STORY);
        assert_eq!(parsed.choices, FALLBACK_CHOICES);
    }

    #[test]
    fn choice_set_from_labels() {
        let set = ChoiceSet::from_labels(["Run"]);
        assert_eq!(set.get(0), Some("Run"));
        assert_eq!(set.get(3), Some("Choice 4"));
        assert_eq!(set.get(4), None);
        assert_eq!(ChoiceSet::fallback().get(1), Some("Restart"));
    }

    #[test]
    fn choice_set_display() {
        let set = ChoiceSet::from_labels(["a", "b", "c", "d"]);
        assert_eq!(set.to_string(), "1) a\n2) b\n3) c\n4) d");
    }

    #[test]
    fn preview_before_choices_marker() {
        assert_eq!(
            preview_story("STORY: You grab da"),
            Some("You grab da".to_string())
        );
        assert_eq!(preview_story("STORY:"), None);
        assert_eq!(preview_story(""), None);
    }

    #[test]
    fn preview_stops_at_choices_marker() {
        assert_eq!(preview_story("STORY: You grab da choppa.\nCHOICES:\n1) Sw"), None);
    }

    fn choice_text() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z ]{0,20}[A-Za-z]"
    }

    proptest! {
        #[test]
        fn four_numbered_items_round_trip(
            story in "[A-Za-z][A-Za-z .!,]{0,60}[A-Za-z.!]",
            choices in prop::collection::vec(choice_text(), 4),
        ) {
            let raw = format!(
                "STORY: {story}\nCHOICES:\n1) {}\n2) {}\n3) {}\n4) {}",
                choices[0], choices[1], choices[2], choices[3]
            );
            let parsed = parse_response(&raw);
            prop_assert_eq!(parsed.story, story.trim().to_string());
            let expected: Vec<String> = choices.iter().map(|c| c.trim().to_string()).collect();
            prop_assert_eq!(parsed.choices, expected);
        }

        #[test]
        fn fewer_items_always_padded(
            choices in prop::collection::vec(choice_text(), 0..4),
        ) {
            let mut raw = String::from("STORY: x\nCHOICES:\n");
            for (i, c) in choices.iter().enumerate() {
                raw.push_str(&format!("{}) {c}\n", i + 1));
            }
            let parsed = parse_response(&raw);
            prop_assert_eq!(parsed.choices.len(), CHOICE_COUNT);
            for n in choices.len()..CHOICE_COUNT {
                prop_assert_eq!(&parsed.choices[n], &format!("Choice {}", n + 1));
            }
        }

        #[test]
        fn more_items_keep_first_four(
            choices in prop::collection::vec(choice_text(), 5..9),
        ) {
            let mut raw = String::from("STORY: x\nCHOICES:\n");
            for (i, c) in choices.iter().enumerate() {
                raw.push_str(&format!("{}) {c}\n", i + 1));
            }
            let parsed = parse_response(&raw);
            let expected: Vec<String> = choices[..4].iter().map(|c| c.trim().to_string()).collect();
            prop_assert_eq!(parsed.choices, expected);
        }

        #[test]
        fn any_nonempty_input_yields_four_choices(raw in ".{1,200}") {
            prop_assert_eq!(parse_response(&raw).choices.len(), CHOICE_COUNT);
        }
    }
}
