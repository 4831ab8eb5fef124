//! Prompt templates.
//!
//! The engine is steered towards a `STORY:` / `CHOICES:` layout with four
//! numbered actions; [`crate::parser`] relies on exactly that layout.

use crate::genre::Genre;

/// Story section marker.
pub const STORY_MARKER: &str = "STORY:";

/// Choices section marker.
pub const CHOICES_MARKER: &str = "CHOICES:";

/// Fixed system instruction establishing the setting and output format.
pub const SYSTEM_PROMPT: &str = "\
You are an expert Warhammer 40,000 Ork RPG game master.
The entire story, setting, and characters, including the player, must be set in the grimdark Warhammer 40k universe, focusing on Ork culture.
Write in second person perspective (\"you\") as if the player is an Ork Boy in a warband.
Include vivid descriptions of brutal Ork life, rough Ork speech patterns, improvised weapons, and constant threats of violence.
After each short narrative segment (2-3 sentences), provide exactly 4 possible actions (choices) that fit the Ork theme.
Keep descriptions concise but intense, and reflect the brutal, chaotic nature of the Orks.";

const OPENING_SCENARIO: &str = "\
You stand amidst a broken battlefield littered with scrap metal, spored mushrooms, and the groaning remains of defeated foes.
As a fresh Ork Boy, your Choppa gripped tight, you snarl at the distant flashes of gunfire where humies and other gitz might be found.
The air reeks of fungus and burnt promethium, and your Warboss barks orders somewhere behind you.";

const OPENING_CHOICES: [&str; 4] = [
    "Charge headlong at the nearest sound of gunfire.",
    "Smash a pile of scrap to see if you can find something choppy.",
    "Yell at a nearby Grot to fetch you something useful.",
    "Try to sneak closer and listen for your Warboss's orders.",
];

/// Build the first user prompt of a session.
pub fn opening_prompt(genre: Genre) -> String {
    let mut prompt = String::new();
    prompt.push_str(genre.flavor());
    prompt.push_str("\n\n");
    prompt.push_str(STORY_MARKER);
    prompt.push('\n');
    prompt.push_str(OPENING_SCENARIO);
    prompt.push_str("\n\n");
    prompt.push_str(CHOICES_MARKER);
    prompt.push('\n');
    for (i, choice) in OPENING_CHOICES.iter().enumerate() {
        prompt.push_str(&format!("{}) {choice}\n", i + 1));
    }
    prompt
}

/// Build the prompt that continues the story after a choice.
///
/// `choice` is the exact text that was displayed in the chosen slot.
pub fn continuation_prompt(choice: &str) -> String {
    format!(
        "Continue the Warhammer 40k Ork RPG story, focusing on brutal, Ork-centered action.
You have chosen: \"{choice}\"

{STORY_MARKER}
[Describe in 2-3 sentences what immediately happens due to that choice,
keeping the grim, Orky tone and second-person perspective.
Show the consequences, maybe finding loot, crushing an enemy, or preparing for bigger fights.]

{CHOICES_MARKER}
1) [Another violent or cunning Ork action]
2) [Something reckless but possibly rewarding]
3) [Something more strategic or manipulative]
4) [A bizarre Orky idea, risky but fun]
"
    )
}
