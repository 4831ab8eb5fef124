//! Mutable state of one playthrough.

use chrono::Utc;

use crate::genre::Genre;
use crate::message::Message;
use crate::parser::ChoiceSet;
use crate::prompt::SYSTEM_PROMPT;
use crate::transcript::{Transcript, TranscriptEntry};

/// What a display segment holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Generated narrative.
    Story,
    /// Error or closing notice.
    Notice,
}

/// One block of text in the story area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// What the segment holds.
    pub kind: SegmentKind,
    /// Displayed text.
    pub text: String,
}

/// One playthrough: history, turn budget, choices and displayed segments.
#[derive(Debug, Clone)]
pub struct Session {
    genre: Genre,
    turn_budget: u32,
    turns_remaining: u32,
    history: Vec<Message>,
    pending_choices: Option<ChoiceSet>,
    segments: Vec<Segment>,
    open_segment: bool,
    transcript: Transcript,
}

impl Session {
    /// Start a session whose history holds only the system instruction.
    pub fn new(genre: Genre, turns: u32) -> Self {
        let mut transcript = Transcript::new();
        transcript.append(TranscriptEntry::SessionStart {
            genre,
            turns,
            timestamp: Utc::now(),
        });
        Self {
            genre,
            turn_budget: turns,
            turns_remaining: turns,
            history: vec![Message::system(SYSTEM_PROMPT)],
            pending_choices: None,
            segments: Vec::new(),
            open_segment: false,
            transcript,
        }
    }

    /// Flavor tag chosen at start.
    pub fn genre(&self) -> Genre {
        self.genre
    }

    /// Turn budget the session started with.
    pub fn turn_budget(&self) -> u32 {
        self.turn_budget
    }

    /// Choices still to be made before the story ends.
    pub fn turns_remaining(&self) -> u32 {
        self.turns_remaining
    }

    /// Conversation so far, system instruction first.
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Choices on offer, if the session is waiting for one.
    pub fn pending_choices(&self) -> Option<&ChoiceSet> {
        self.pending_choices.as_ref()
    }

    /// Displayed segments, oldest first.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Timestamped record of the playthrough.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Full request payload: the history followed by the new prompt.
    pub(crate) fn request_with(&self, prompt: &Message) -> Vec<Message> {
        let mut request = Vec::with_capacity(self.history.len() + 1);
        request.extend_from_slice(&self.history);
        request.push(prompt.clone());
        request
    }

    /// Record a finished request lifecycle.
    pub(crate) fn commit_turn(&mut self, prompt: Message, reply: Option<String>) {
        self.history.push(prompt);
        if let Some(reply) = reply {
            self.history.push(Message::assistant(reply));
        }
    }

    /// Spend one turn; returns what is left.
    pub(crate) fn spend_turn(&mut self) -> u32 {
        self.turns_remaining = self.turns_remaining.saturating_sub(1);
        self.turns_remaining
    }

    /// Take the chosen label, leaving no choices on offer.
    pub(crate) fn take_choice(&mut self, index: usize) -> Option<String> {
        let label = self.pending_choices.as_ref()?.get(index)?.to_string();
        self.pending_choices = None;
        self.transcript.append(TranscriptEntry::Choice {
            text: label.clone(),
            timestamp: Utc::now(),
        });
        Some(label)
    }

    pub(crate) fn set_choices(&mut self, choices: ChoiceSet) {
        self.pending_choices = Some(choices);
    }

    pub(crate) fn clear_choices(&mut self) {
        self.pending_choices = None;
    }

    /// Open a new story segment, freezing every earlier one.
    pub(crate) fn begin_segment(&mut self) {
        self.segments.push(Segment {
            kind: SegmentKind::Story,
            text: String::new(),
        });
        self.open_segment = true;
    }

    /// Replace the text of the open segment. No-op once it is closed.
    pub(crate) fn update_segment(&mut self, text: &str) {
        if !self.open_segment {
            return;
        }
        if let Some(segment) = self.segments.last_mut() {
            segment.text.clear();
            segment.text.push_str(text);
        }
    }

    /// Set the final text of the open segment and close it.
    pub(crate) fn finalize_segment(&mut self, text: &str) {
        self.update_segment(text);
        self.open_segment = false;
        self.transcript.append(TranscriptEntry::Segment {
            text: text.to_string(),
            timestamp: Utc::now(),
        });
    }

    /// Close the open segment without a final text, dropping it if it is empty.
    pub(crate) fn abandon_segment(&mut self) {
        if self.open_segment
            && self
                .segments
                .last()
                .is_some_and(|s| s.text.trim().is_empty())
        {
            self.segments.pop();
        }
        self.open_segment = false;
    }

    /// Append a notice segment.
    pub(crate) fn push_notice(&mut self, text: &str) {
        self.abandon_segment();
        self.segments.push(Segment {
            kind: SegmentKind::Notice,
            text: text.to_string(),
        });
        self.transcript.append(TranscriptEntry::Notice {
            text: text.to_string(),
            timestamp: Utc::now(),
        });
    }

    /// Record the closing text.
    pub(crate) fn close(&mut self, text: &str) {
        self.abandon_segment();
        self.pending_choices = None;
        self.segments.push(Segment {
            kind: SegmentKind::Notice,
            text: text.to_string(),
        });
        self.transcript.append(TranscriptEntry::End {
            text: text.to_string(),
            timestamp: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;

    #[test]
    fn starts_with_single_system_message() {
        let session = Session::new(Genre::Epic, 3);
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history()[0].role, Role::System);
        assert_eq!(session.turns_remaining(), 3);
        assert!(session.pending_choices().is_none());
    }

    #[test]
    fn request_does_not_touch_history() {
        let session = Session::new(Genre::Default, 1);
        let request = session.request_with(&Message::user("go"));
        assert_eq!(request.len(), 2);
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn commit_appends_in_order() {
        let mut session = Session::new(Genre::Default, 1);
        session.commit_turn(Message::user("go"), Some("done".into()));
        session.commit_turn(Message::user("again"), None);
        let roles: Vec<Role> = session.history().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
    }

    #[test]
    fn spend_turn_saturates() {
        let mut session = Session::new(Genre::Default, 1);
        assert_eq!(session.spend_turn(), 0);
        assert_eq!(session.spend_turn(), 0);
    }

    #[test]
    fn take_choice_clears_offer() {
        let mut session = Session::new(Genre::Default, 2);
        session.set_choices(ChoiceSet::from_labels(["Run", "Loot"]));
        assert_eq!(session.take_choice(1), Some("Loot".to_string()));
        assert!(session.pending_choices().is_none());
        assert_eq!(session.take_choice(0), None);
    }

    #[test]
    fn finalized_segment_is_frozen() {
        let mut session = Session::new(Genre::Default, 2);
        session.begin_segment();
        session.update_segment("You grab");
        session.finalize_segment("You grab da choppa.");
        session.update_segment("overwritten");
        session.begin_segment();
        session.update_segment("Next");
        assert_eq!(session.segments()[0].text, "You grab da choppa.");
        assert_eq!(session.segments()[1].text, "Next");
    }

    #[test]
    fn empty_abandoned_segment_is_dropped() {
        let mut session = Session::new(Genre::Default, 2);
        session.begin_segment();
        session.push_notice("oops");
        assert_eq!(session.segments().len(), 1);
        assert_eq!(session.segments()[0].kind, SegmentKind::Notice);
    }

    #[test]
    fn partial_abandoned_segment_is_kept() {
        let mut session = Session::new(Genre::Default, 2);
        session.begin_segment();
        session.update_segment("You swing");
        session.push_notice("oops");
        assert_eq!(session.segments().len(), 2);
        assert_eq!(session.segments()[0].text, "You swing");
    }
}
