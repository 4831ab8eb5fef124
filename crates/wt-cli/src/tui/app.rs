use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedSender;

use wt_story::{CHOICE_COUNT, ChoiceSet, Genre, SessionEvent, SessionState, parse_turn_count};

/// Requests from the UI to the controller task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Load the model with this identifier.
    Load(String),
    /// Start a session.
    Start { genre: Genre, turns: u32 },
    /// Pick the choice in a slot (0-3).
    Choose(usize),
    /// Drop the session and go back to setup.
    Restart,
    /// Stop the controller task.
    Quit,
}

/// Which screen is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Setup,
    Story,
}

/// Visual style of a line in the story pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStyle {
    /// Generated narrative.
    Story,
    /// The choice the player made.
    Choice,
    /// Closing or informational notice.
    Notice,
    /// Recovered failure.
    Error,
}

/// A block of text in the story pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub style: OutputStyle,
    pub text: String,
}

/// Model picker, genre picker and turn count field.
#[derive(Debug, Clone)]
pub struct SetupForm {
    pub models: Vec<String>,
    pub model_index: usize,
    pub genre_index: usize,
    pub turns_input: String,
}

impl SetupForm {
    fn new(model: String, genre: Genre, turns: u32) -> Self {
        Self {
            models: vec![model],
            model_index: 0,
            genre_index: Genre::ALL.iter().position(|g| *g == genre).unwrap_or(0),
            turns_input: turns.to_string(),
        }
    }

    /// Replace the model list, keeping the current pick if it is offered.
    pub fn set_models(&mut self, models: Vec<String>) {
        if models.is_empty() {
            return;
        }
        let current = self.model().to_string();
        self.model_index = models.iter().position(|m| *m == current).unwrap_or(0);
        self.models = models;
    }

    pub fn model(&self) -> &str {
        self.models
            .get(self.model_index)
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn next_model(&mut self) {
        if !self.models.is_empty() {
            self.model_index = (self.model_index + 1) % self.models.len();
        }
    }

    pub fn prev_model(&mut self) {
        if !self.models.is_empty() {
            self.model_index = (self.model_index + self.models.len() - 1) % self.models.len();
        }
    }

    pub fn genre(&self) -> Genre {
        Genre::ALL[self.genre_index % Genre::ALL.len()]
    }

    pub fn next_genre(&mut self) {
        self.genre_index = (self.genre_index + 1) % Genre::ALL.len();
    }

    pub fn prev_genre(&mut self) {
        self.genre_index = (self.genre_index + Genre::ALL.len() - 1) % Genre::ALL.len();
    }

    pub fn push_digit(&mut self, c: char) {
        if c.is_ascii_digit() && self.turns_input.len() < 3 {
            self.turns_input.push(c);
        }
    }

    pub fn backspace(&mut self) {
        self.turns_input.pop();
    }
}

/// UI state, rebuilt from controller events.
pub struct App {
    pub screen: Screen,
    pub setup: SetupForm,
    pub state: SessionState,
    pub output_lines: Vec<OutputLine>,
    /// Story text of the segment being streamed.
    pub preview: Option<String>,
    pub choices: ChoiceSet,
    /// Set after a choice is sent, until the controller reports a new state.
    pub awaiting_reply: bool,
    pub status: String,
    /// Scroll offset from the bottom (0 = fully scrolled down).
    pub output_scroll: u16,
    pub show_help: bool,
    pub should_quit: bool,
    /// Where the choice slots were last drawn, for mouse hit-testing.
    pub choices_area: Rect,
    commands: UnboundedSender<Command>,
}

impl App {
    pub fn new(
        commands: UnboundedSender<Command>,
        model: String,
        genre: Genre,
        turns: u32,
    ) -> Self {
        Self {
            screen: Screen::Setup,
            setup: SetupForm::new(model, genre, turns),
            state: SessionState::Idle,
            output_lines: Vec::new(),
            preview: None,
            choices: ChoiceSet::sentinel(),
            awaiting_reply: false,
            status: "Asking the engine for its models...".to_string(),
            output_scroll: 0,
            show_help: false,
            should_quit: false,
            choices_area: Rect::default(),
            commands,
        }
    }

    /// Whether the four slots accept a pick right now.
    pub fn choices_enabled(&self) -> bool {
        self.screen == Screen::Story && self.state.accepts_choice() && !self.awaiting_reply
    }

    /// Fold one controller event into the view.
    pub fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::StateChanged { to, .. } => {
                self.state = to;
                self.awaiting_reply = false;
                match to {
                    SessionState::Configuring => {
                        self.screen = Screen::Setup;
                        self.status = "Pick a genre and turn count, then press Enter.".into();
                    }
                    SessionState::Generating => {
                        self.screen = Screen::Story;
                        self.status = "Da Mek is thinkin'...".into();
                    }
                    SessionState::AwaitingChoice => {
                        self.status = "Press 1-4 or click a choice.".into();
                    }
                    SessionState::Ended => {
                        self.status = "Story over. Press r to start again, q to quit.".into();
                    }
                    SessionState::Idle => {}
                }
            }
            SessionEvent::ModelsAvailable(models) => {
                self.setup.set_models(models);
                if self.state == SessionState::Idle {
                    self.status = "Pick a model and press Enter to load it.".into();
                }
            }
            SessionEvent::LoadProgress(text) => self.status = text,
            SessionEvent::SegmentStarted => self.preview = Some(String::new()),
            SessionEvent::StoryPreview(text) => self.preview = Some(text),
            SessionEvent::SegmentFinalized(text) => {
                self.preview = None;
                self.push_output(OutputStyle::Story, &text);
            }
            SessionEvent::ChoicesUpdated(choices) | SessionEvent::ChoicesDisabled(choices) => {
                self.choices = choices;
            }
            SessionEvent::Notice(text) => self.push_output(OutputStyle::Notice, &text),
            SessionEvent::Error(text) => {
                if let Some(partial) = self.preview.take().filter(|p| !p.is_empty()) {
                    self.push_output(OutputStyle::Story, &partial);
                }
                if self.state == SessionState::Idle {
                    self.status = format!("{text} (press Enter to retry)");
                } else {
                    self.push_output(OutputStyle::Error, &text);
                }
            }
            SessionEvent::Ended { .. } => self.preview = None,
        }
    }

    /// Enter on the setup form: load the picked model, or start once loaded.
    pub fn submit_setup(&mut self) {
        match self.state {
            SessionState::Idle => self.load(),
            SessionState::Configuring => self.start(),
            _ => {}
        }
    }

    /// Start a session from the setup form.
    pub fn start(&mut self) {
        if self.state != SessionState::Configuring {
            return;
        }
        let turns = parse_turn_count(&self.setup.turns_input);
        self.setup.turns_input = turns.to_string();
        self.output_lines.clear();
        self.output_scroll = 0;
        self.send(Command::Start {
            genre: self.setup.genre(),
            turns,
        });
    }

    /// Pick the choice in a slot, if the slots are live.
    pub fn choose(&mut self, index: usize) {
        if !self.choices_enabled() || index >= CHOICE_COUNT {
            return;
        }
        let label = self.choices.get(index).unwrap_or_default().to_string();
        self.push_output(OutputStyle::Choice, &label);
        self.awaiting_reply = true;
        self.send(Command::Choose(index));
    }

    pub fn restart(&mut self) {
        self.send(Command::Restart);
    }

    /// Load the model picked in the setup form.
    pub fn load(&mut self) {
        if matches!(self.state, SessionState::Idle | SessionState::Configuring) {
            let model = self.setup.model().to_string();
            self.status = format!("Loading {model}...");
            self.send(Command::Load(model));
        }
    }

    pub fn quit(&mut self) {
        self.send(Command::Quit);
        self.should_quit = true;
    }

    pub fn scroll_up(&mut self) {
        self.output_scroll = self.output_scroll.saturating_add(1);
    }

    pub fn scroll_down(&mut self) {
        self.output_scroll = self.output_scroll.saturating_sub(1);
    }

    fn push_output(&mut self, style: OutputStyle, text: &str) {
        self.output_lines.push(OutputLine {
            style,
            text: text.to_string(),
        });
        self.output_scroll = 0;
    }

    fn send(&mut self, command: Command) {
        if self.commands.send(command).is_err() {
            self.status = "The story engine has stopped.".into();
        }
    }
}
