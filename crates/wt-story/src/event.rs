//! Observable session events.
//!
//! Rendering layers (terminal, TUI, tests) subscribe an [`EventSink`] to the
//! controller and build their view from the events alone.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc::UnboundedSender;

use crate::parser::ChoiceSet;
use crate::state::SessionState;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The turn budget ran out.
    TurnsExhausted,
    /// The session was ended from outside.
    Reset,
}

/// Something a rendering layer may want to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The controller moved between lifecycle states.
    StateChanged {
        /// Previous state.
        from: SessionState,
        /// New state.
        to: SessionState,
    },
    /// Model identifiers the engine can load.
    ModelsAvailable(Vec<String>),
    /// Model loading progress text.
    LoadProgress(String),
    /// A new story segment has begun; the previous one is now immutable.
    SegmentStarted,
    /// Partial story text of the segment being streamed.
    StoryPreview(String),
    /// Authoritative story text of the finished segment.
    SegmentFinalized(String),
    /// New choices for the four slots.
    ChoicesUpdated(ChoiceSet),
    /// Slots must not be selectable; carries the sentinel labels.
    ChoicesDisabled(ChoiceSet),
    /// Informational text for the story area, such as the closing notice.
    Notice(String),
    /// A recovered or load error, worded for the user.
    Error(String),
    /// The session reached its terminal state.
    Ended {
        /// Why it ended.
        reason: EndReason,
    },
}

/// Receiver of session events.
pub trait EventSink: Send {
    /// Deliver one event.
    fn emit(&mut self, event: &SessionEvent);
}

impl EventSink for UnboundedSender<SessionEvent> {
    fn emit(&mut self, event: &SessionEvent) {
        // A closed receiver means the view is gone; nothing left to update.
        let _ = self.send(event.clone());
    }
}

/// Shared in-memory event recorder. Clones observe the same log.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<SessionEvent>>>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events recorded so far.
    pub fn events(&self) -> Vec<SessionEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of events recorded.
    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget all recorded events.
    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: &SessionEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

/// Deliver an event to every sink.
pub(crate) fn broadcast(sinks: &mut [Box<dyn EventSink>], event: &SessionEvent) {
    for sink in sinks.iter_mut() {
        sink.emit(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_clones_share_events() {
        let log = EventLog::new();
        let mut sink = log.clone();
        sink.emit(&SessionEvent::SegmentStarted);
        assert_eq!(log.events(), vec![SessionEvent::SegmentStarted]);
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn channel_sink_forwards() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut sink: Box<dyn EventSink> = Box::new(tx);
        sink.emit(&SessionEvent::Error("boom".into()));
        assert_eq!(rx.try_recv().ok(), Some(SessionEvent::Error("boom".into())));
    }

    #[test]
    fn broadcast_reaches_all() {
        let a = EventLog::new();
        let b = EventLog::new();
        let mut sinks: Vec<Box<dyn EventSink>> = vec![Box::new(a.clone()), Box::new(b.clone())];
        broadcast(&mut sinks, &SessionEvent::SegmentStarted);
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
    }
}
