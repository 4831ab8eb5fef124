//! Deterministic in-process engine that replays canned responses.

use std::collections::VecDeque;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;

use super::{CompletionChunk, CompletionStream, InferenceEngine, SamplingOptions};
use crate::error::EngineError;
use crate::message::Message;

/// Model identifier reported by the scripted engine.
pub const SCRIPTED_MODEL: &str = "scripted-orkz";

/// Separator line between replies in a script file.
pub const SCRIPT_SEPARATOR: &str = "---";

const BUILTIN_SCRIPT: [&str; 4] = [
    "STORY: You charge through da smoke, Choppa raised, and crash into a squad of humies hiding behind a wrecked Chimera. \
     Your first swing sends a lasgun flying and the rest of da gitz scatter like frightened Grots.
CHOICES:
1) Chase down da fleeing humies.
2) Rip da armour plates off da Chimera for yourself.
3) Bellow a war cry so da Warboss knows who did it.
4) Stuff a stikkbomb into da tank's exhaust and see what happens.",
    "STORY: Da Chimera goes up in a glorious fireball and you get flung into a crater full of squig droppings. \
     A Nob with one eye and a big shoota peers over da edge and laughs at you.
CHOICES:
1) Headbutt da Nob to show him who's da boss.
2) Ask da Nob for a go on his big shoota.
3) Pretend you meant to do that and climb out looking 'ard.
4) Throw squig droppings at da Nob.",
    "STORY: Da Warboss stomps over, his power klaw snapping, and everyone goes quiet. \
     He sniffs da air, looks at da burning tank, then looks straight at you.
CHOICES:
1) Claim all da credit for da big boom.
2) Blame a nearby Grot.
3) Offer da Warboss your best teef as tribute.
4) Challenge da Warboss right here and now.",
    "STORY: Da Mek drags you into his workshop, a rattling shack of stolen wire and engine parts, \
     and straps a rokkit pack to your back before you can argue.
CHOICES:
1) Light da rokkit and hope for da best.
2) Ask what da red button does.
3) Make a run for it, rokkit and all.
4) Demand a bigger rokkit.",
];

/// One canned reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedReply {
    /// Stream the text word by word, then finalize it.
    Text(String),
    /// Finalize the text without streaming any deltas.
    Silent(String),
    /// Reject the request before streaming.
    Fail(String),
    /// Stream `deltas` words of the text, then break off with an error.
    Break {
        /// Text to stream.
        text: String,
        /// Number of deltas sent before the error.
        deltas: usize,
    },
}

/// Engine that replays a queue of replies, cycling a built-in Ork script
/// once the queue is empty.
#[derive(Debug, Clone, Default)]
pub struct ScriptedEngine {
    replies: VecDeque<ScriptedReply>,
    builtin_cursor: usize,
    requests: usize,
    last_history: Vec<Message>,
    load_failure: Option<String>,
    loaded_model: Option<String>,
}

impl ScriptedEngine {
    /// Create an engine that only plays the built-in script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a script: replies separated by lines consisting of `---`.
    pub fn from_script(script: &str) -> Self {
        let mut engine = Self::new();
        let mut current = String::new();
        for line in script.lines() {
            if line.trim() == SCRIPT_SEPARATOR {
                engine.push_script_reply(&current);
                current.clear();
            } else {
                current.push_str(line);
                current.push('\n');
            }
        }
        engine.push_script_reply(&current);
        engine
    }

    fn push_script_reply(&mut self, text: &str) {
        let text = text.trim();
        if !text.is_empty() {
            self.replies.push_back(ScriptedReply::Text(text.to_string()));
        }
    }

    /// Queue a streamed reply.
    pub fn with_reply(mut self, text: impl Into<String>) -> Self {
        self.replies.push_back(ScriptedReply::Text(text.into()));
        self
    }

    /// Queue a reply that arrives with no deltas.
    pub fn with_silent_reply(mut self, text: impl Into<String>) -> Self {
        self.replies.push_back(ScriptedReply::Silent(text.into()));
        self
    }

    /// Queue a rejected request.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.replies.push_back(ScriptedReply::Fail(message.into()));
        self
    }

    /// Queue a reply whose stream breaks after `deltas` words.
    pub fn with_stream_break(mut self, text: impl Into<String>, deltas: usize) -> Self {
        self.replies.push_back(ScriptedReply::Break {
            text: text.into(),
            deltas,
        });
        self
    }

    /// Make model loading fail with `message`.
    pub fn with_load_failure(mut self, message: impl Into<String>) -> Self {
        self.load_failure = Some(message.into());
        self
    }

    /// Number of completion requests received.
    pub fn request_count(&self) -> usize {
        self.requests
    }

    /// History passed to the most recent request.
    pub fn last_history(&self) -> &[Message] {
        &self.last_history
    }

    /// Model loaded by the last successful `initialize`.
    pub fn loaded_model(&self) -> Option<&str> {
        self.loaded_model.as_deref()
    }

    fn next_reply(&mut self) -> ScriptedReply {
        if let Some(reply) = self.replies.pop_front() {
            return reply;
        }
        let text = BUILTIN_SCRIPT[self.builtin_cursor % BUILTIN_SCRIPT.len()];
        self.builtin_cursor += 1;
        ScriptedReply::Text(text.to_string())
    }
}

fn word_deltas(text: &str) -> Vec<String> {
    text.split_inclusive(' ').map(str::to_string).collect()
}

#[async_trait]
impl InferenceEngine for ScriptedEngine {
    async fn initialize(
        &mut self,
        model: &str,
        _options: SamplingOptions,
        progress: &mut (dyn FnMut(String) + Send),
    ) -> Result<(), EngineError> {
        progress(format!("Loading {model}..."));
        if let Some(message) = self.load_failure.take() {
            return Err(EngineError::Load(message));
        }
        self.loaded_model = Some(model.to_string());
        progress("Model ready!".to_string());
        Ok(())
    }

    async fn complete(&mut self, history: &[Message]) -> Result<CompletionStream, EngineError> {
        self.requests += 1;
        self.last_history = history.to_vec();

        let items: Vec<Result<CompletionChunk, EngineError>> = match self.next_reply() {
            ScriptedReply::Text(text) => {
                let mut items: Vec<_> = word_deltas(&text)
                    .into_iter()
                    .map(|d| Ok(CompletionChunk::Delta(d)))
                    .collect();
                items.push(Ok(CompletionChunk::Done(text)));
                items
            }
            ScriptedReply::Silent(text) => vec![Ok(CompletionChunk::Done(text))],
            ScriptedReply::Fail(message) => return Err(EngineError::Request(message)),
            ScriptedReply::Break { text, deltas } => {
                let mut items: Vec<_> = word_deltas(&text)
                    .into_iter()
                    .take(deltas)
                    .map(|d| Ok(CompletionChunk::Delta(d)))
                    .collect();
                items.push(Err(EngineError::Stream("connection lost".to_string())));
                items
            }
        };

        Ok(stream::iter(items).boxed())
    }

    async fn available_models(&self) -> Result<Vec<String>, EngineError> {
        Ok(vec![SCRIPTED_MODEL.to_string()])
    }
}
