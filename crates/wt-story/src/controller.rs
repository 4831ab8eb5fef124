//! Narrative session controller.
//!
//! Owns the lifecycle `Idle → Configuring → Generating → AwaitingChoice →
//! Ended`. Starting a session or submitting a choice stages exactly one
//! request; [`NarrativeController::generate`] drives it through the engine.
//! A staged request blocks further submissions, so a second request can
//! never be issued while one is outstanding.

use futures::StreamExt;
use tracing::{debug, warn};

use crate::config::{DEFAULT_TURNS, StoryConfig};
use crate::engine::{CompletionChunk, InferenceEngine};
use crate::error::{EngineError, StoryError, StoryResult};
use crate::event::{EndReason, EventSink, SessionEvent, broadcast};
use crate::genre::Genre;
use crate::message::Message;
use crate::parser::{ChoiceSet, ERROR_STORY, ParsedResponse, parse_response, preview_story};
use crate::prompt::{continuation_prompt, opening_prompt};
use crate::session::Session;
use crate::state::SessionState;

/// Text shown when the turn budget runs out.
pub const END_NOTICE: &str = "The Waaagh! is over. Your story ends here.";

/// Text shown when a session is ended from outside.
pub const RESET_NOTICE: &str = "The story was cut short.";

/// Result of a state-changing controller call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// A request is staged; call [`NarrativeController::generate`].
    Pending,
    /// A segment was generated and these choices are on offer.
    Ready(ChoiceSet),
    /// The request failed; the fallback choices are on offer.
    Recovered(String),
    /// The session is over.
    Ended,
}

/// Turn-based narrative session controller.
pub struct NarrativeController<E> {
    engine: E,
    config: StoryConfig,
    state: SessionState,
    engine_ready: bool,
    session: Option<Session>,
    staged: Option<Message>,
    sinks: Vec<Box<dyn EventSink>>,
}

impl<E: InferenceEngine> NarrativeController<E> {
    /// Create an idle controller around an engine.
    pub fn new(engine: E, config: StoryConfig) -> Self {
        Self {
            engine,
            config,
            state: SessionState::Idle,
            engine_ready: false,
            session: None,
            staged: None,
            sinks: Vec::new(),
        }
    }

    /// Subscribe a sink to all future events.
    pub fn subscribe(&mut self, sink: impl EventSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The current session, if one was started.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Controller configuration.
    pub fn config(&self) -> &StoryConfig {
        &self.config
    }

    /// The injected engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Choices on offer, if any.
    pub fn pending_choices(&self) -> Option<&ChoiceSet> {
        self.session.as_ref().and_then(Session::pending_choices)
    }

    /// Ask the engine which models it can load.
    ///
    /// Emits [`SessionEvent::ModelsAvailable`] so a view can offer a picker.
    pub async fn list_models(&mut self) -> StoryResult<Vec<String>> {
        match self.engine.available_models().await {
            Ok(models) => {
                debug!(count = models.len(), "models listed");
                self.emit(SessionEvent::ModelsAvailable(models.clone()));
                Ok(models)
            }
            Err(err) => {
                warn!(error = %err, "listing models failed");
                self.emit(SessionEvent::Error(format!("Error listing models: {err}")));
                Err(err.into())
            }
        }
    }

    /// Pick the model the next [`load_model`](Self::load_model) will load.
    pub fn select_model(&mut self, model: impl Into<String>) -> StoryResult<()> {
        if !matches!(self.state, SessionState::Idle | SessionState::Configuring) {
            return Err(StoryError::WrongState {
                action: "select a model",
                state: self.state,
            });
        }
        self.config.model = model.into();
        Ok(())
    }

    /// Load the configured model. On success the controller is ready to start.
    ///
    /// A load failure leaves the state unchanged so loading can be retried.
    pub async fn load_model(&mut self) -> StoryResult<()> {
        if !matches!(self.state, SessionState::Idle | SessionState::Configuring) {
            return Err(StoryError::WrongState {
                action: "load a model",
                state: self.state,
            });
        }

        let model = self.config.model.clone();
        debug!(%model, "loading model");
        let sinks = &mut self.sinks;
        let result = self
            .engine
            .initialize(&model, self.config.sampling, &mut |text: String| {
                broadcast(sinks, &SessionEvent::LoadProgress(text))
            })
            .await;

        match result {
            Ok(()) => {
                self.engine_ready = true;
                if self.state == SessionState::Idle {
                    self.transition(SessionState::Configuring);
                }
                Ok(())
            }
            Err(err) => {
                warn!(%model, error = %err, "model load failed");
                self.emit(SessionEvent::Error(format!("Error loading model: {err}")));
                Err(err.into())
            }
        }
    }

    /// Mark an engine that needs no loading as ready.
    pub fn mark_ready(&mut self) -> StoryResult<()> {
        match self.state {
            SessionState::Idle => {
                self.engine_ready = true;
                self.transition(SessionState::Configuring);
                Ok(())
            }
            SessionState::Configuring => Ok(()),
            state => Err(StoryError::WrongState {
                action: "mark the engine ready",
                state,
            }),
        }
    }

    /// Begin a session and stage the opening request.
    ///
    /// A turn budget of zero is replaced by the default of five.
    pub fn start_session(&mut self, genre: Genre, turns: u32) -> StoryResult<TurnOutcome> {
        if self.state != SessionState::Configuring {
            return Err(StoryError::WrongState {
                action: "start a session",
                state: self.state,
            });
        }

        let turns = if turns == 0 { DEFAULT_TURNS } else { turns };
        debug!(%genre, turns, "starting session");
        self.session = Some(Session::new(genre, turns));
        self.staged = Some(Message::user(opening_prompt(genre)));
        self.transition(SessionState::Generating);
        Ok(TurnOutcome::Pending)
    }

    /// Begin a session with the genre and turn budget from the configuration.
    pub fn start_configured_session(&mut self) -> StoryResult<TurnOutcome> {
        let (genre, turns) = (self.config.genre, self.config.turns);
        self.start_session(genre, turns)
    }

    /// Accept the choice in slot `index` (0-3).
    ///
    /// Spends one turn. When no turns are left the session ends without a
    /// further request; otherwise the continuation request is staged.
    pub fn submit_choice(&mut self, index: usize) -> StoryResult<TurnOutcome> {
        match self.state {
            SessionState::AwaitingChoice => {}
            SessionState::Generating => return Err(StoryError::Busy),
            SessionState::Ended => return Err(StoryError::SessionEnded),
            state => {
                return Err(StoryError::WrongState {
                    action: "choose",
                    state,
                });
            }
        }

        let Some(session) = self.session.as_mut() else {
            return Err(StoryError::WrongState {
                action: "choose",
                state: self.state,
            });
        };
        let Some(choice) = session.take_choice(index) else {
            return Err(StoryError::InvalidChoice(index));
        };

        let remaining = session.spend_turn();
        debug!(index, %choice, remaining, "choice accepted");
        if remaining == 0 {
            self.end(EndReason::TurnsExhausted);
            return Ok(TurnOutcome::Ended);
        }

        self.staged = Some(Message::user(continuation_prompt(&choice)));
        self.transition(SessionState::Generating);
        Ok(TurnOutcome::Pending)
    }

    /// Drive the staged request to completion.
    ///
    /// Engine failures never escape: they are reported as
    /// [`TurnOutcome::Recovered`] with the fallback choices on offer.
    pub async fn generate(&mut self) -> StoryResult<TurnOutcome> {
        if self.state != SessionState::Generating {
            return Err(StoryError::NothingToGenerate);
        }
        let (Some(prompt), Some(session)) = (self.staged.clone(), self.session.as_mut()) else {
            return Err(StoryError::NothingToGenerate);
        };

        let request = session.request_with(&prompt);
        session.begin_segment();
        broadcast(&mut self.sinks, &SessionEvent::SegmentStarted);
        debug!(messages = request.len(), "issuing completion request");

        let result = self.stream_reply(&request).await;
        self.staged = None;

        match result {
            Ok(reply) if reply.trim().is_empty() => {
                Ok(self.recover(prompt, "the engine returned an empty response"))
            }
            Ok(reply) => {
                let parsed = parse_response(&reply);
                if parsed.story.is_empty() {
                    Ok(self.recover(prompt, "the response had no story text"))
                } else {
                    Ok(self.finish_turn(prompt, reply, parsed))
                }
            }
            Err(err) => Ok(self.recover(prompt, &err.to_string())),
        }
    }

    /// Start a session and generate its opening segment.
    pub async fn start(&mut self, genre: Genre, turns: u32) -> StoryResult<TurnOutcome> {
        self.start_session(genre, turns)?;
        self.generate().await
    }

    /// Start a session from the configuration and generate its opening segment.
    pub async fn start_configured(&mut self) -> StoryResult<TurnOutcome> {
        self.start_configured_session()?;
        self.generate().await
    }

    /// Submit a choice and, unless the story ended, generate the next segment.
    pub async fn choose(&mut self, index: usize) -> StoryResult<TurnOutcome> {
        match self.submit_choice(index)? {
            TurnOutcome::Pending => self.generate().await,
            outcome => Ok(outcome),
        }
    }

    /// End the session from outside. No-op when already ended.
    pub fn end_session(&mut self) {
        if self.state != SessionState::Ended {
            self.end(EndReason::Reset);
        }
    }

    /// Discard the current session, returning to configuration.
    pub fn restart(&mut self) {
        self.session = None;
        self.staged = None;
        let next = if self.engine_ready {
            SessionState::Configuring
        } else {
            SessionState::Idle
        };
        if self.state != next {
            self.transition(next);
        }
    }

    async fn stream_reply(&mut self, request: &[Message]) -> Result<String, EngineError> {
        let mut stream = self.engine.complete(request).await?;
        let mut accumulated = String::new();

        while let Some(chunk) = stream.next().await {
            match chunk? {
                CompletionChunk::Delta(delta) => {
                    if delta.is_empty() {
                        continue;
                    }
                    accumulated.push_str(&delta);
                    if let Some(preview) = preview_story(&accumulated) {
                        if let Some(session) = self.session.as_mut() {
                            session.update_segment(&preview);
                        }
                        broadcast(&mut self.sinks, &SessionEvent::StoryPreview(preview));
                    }
                }
                CompletionChunk::Done(full) => return Ok(full),
            }
        }

        Ok(accumulated)
    }

    fn finish_turn(
        &mut self,
        prompt: Message,
        reply: String,
        parsed: ParsedResponse,
    ) -> TurnOutcome {
        let choices = parsed.choice_set();

        if let Some(session) = self.session.as_mut() {
            session.commit_turn(prompt, Some(reply));
            session.finalize_segment(&parsed.story);
            session.set_choices(choices.clone());
        }

        self.emit(SessionEvent::SegmentFinalized(parsed.story));
        self.emit(SessionEvent::ChoicesUpdated(choices.clone()));
        self.transition(SessionState::AwaitingChoice);
        TurnOutcome::Ready(choices)
    }

    fn recover(&mut self, prompt: Message, reason: &str) -> TurnOutcome {
        warn!(%reason, "story request failed");
        let choices = ChoiceSet::fallback();

        if let Some(session) = self.session.as_mut() {
            session.commit_turn(prompt, None);
            session.push_notice(ERROR_STORY);
            session.set_choices(choices.clone());
        }

        self.emit(SessionEvent::Error(ERROR_STORY.to_string()));
        self.emit(SessionEvent::ChoicesUpdated(choices));
        self.transition(SessionState::AwaitingChoice);
        TurnOutcome::Recovered(reason.to_string())
    }

    fn end(&mut self, reason: EndReason) {
        let notice = match reason {
            EndReason::TurnsExhausted => END_NOTICE,
            EndReason::Reset => RESET_NOTICE,
        };
        self.staged = None;
        if let Some(session) = self.session.as_mut() {
            session.clear_choices();
            session.close(notice);
        }

        self.emit(SessionEvent::Notice(notice.to_string()));
        self.emit(SessionEvent::ChoicesDisabled(ChoiceSet::sentinel()));
        self.transition(SessionState::Ended);
        self.emit(SessionEvent::Ended { reason });
    }

    fn transition(&mut self, to: SessionState) {
        let from = self.state;
        self.state = to;
        debug!(%from, %to, "state change");
        self.emit(SessionEvent::StateChanged { from, to });
    }

    fn emit(&mut self, event: SessionEvent) {
        broadcast(&mut self.sinks, &event);
    }
}
