//! # Lesson Events
//!
//! The uniform event record the engine emits to its host, and the observer
//! seam the host implements to receive it.
//!
//! Widget families historically disagreed on payload field names (`type`
//! vs `eventType`, `data` vs `details`); here there is exactly one schema:
//! `{kind, stage, payload, timestamp_ms}` with a tagged-variant payload.
//! Hosts that must preserve legacy field names adapt at their own boundary.

use serde::{Deserialize, Serialize};

use crate::quiz::QuizOutcome;
use crate::stage::Stage;
use crate::types::{ChoiceIndex, TimestampMs};

// =============================================================================
// EVENT RECORD
// =============================================================================

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A stage transition was committed.
    StageChanged,
    /// The host re-synchronized the controller to a resume stage.
    StateSynced,
    /// A prediction choice was committed.
    PredictionMade,
    /// A quiz answer was recorded.
    AnswerSubmitted,
    /// The quiz was scored.
    QuizCompleted,
    /// A transfer-gallery application was viewed.
    ApplicationViewed,
    /// The lesson reached mastery.
    LessonCompleted,
}

/// Structured event payload, one variant per interaction shape.
///
/// Externally tagged on the wire (`{"transition": {...}}`): the same
/// record must decode from both serde_json at the API boundary and
/// postcard in the journal, and postcard cannot decode internally
/// tagged enums.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventPayload {
    /// Stage transition endpoints.
    Transition { from: Stage, to: Stage },
    /// A prediction: which prompt ("predict" or "twist_predict") and the
    /// chosen option.
    Prediction {
        prompt: Stage,
        choice: ChoiceIndex,
        correct: bool,
    },
    /// A single quiz answer.
    Answer {
        question: usize,
        choice: ChoiceIndex,
        correct: bool,
    },
    /// The scored quiz result.
    Quiz(QuizOutcome),
    /// Index of a viewed transfer application.
    Application { index: u8 },
    /// No structured data beyond kind and stage.
    Empty,
}

/// An immutable record emitted on every committed transition and on
/// selected in-stage interactions.
///
/// The engine emits and forgets; the host owns any storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonEvent {
    /// What happened.
    pub kind: EventKind,
    /// The current stage after the event.
    pub stage: Stage,
    /// Structured payload.
    pub payload: EventPayload,
    /// When it happened, on the controller's clock.
    pub timestamp_ms: TimestampMs,
}

impl LessonEvent {
    /// Create a new event record.
    #[must_use]
    pub fn new(
        kind: EventKind,
        stage: Stage,
        payload: EventPayload,
        timestamp_ms: TimestampMs,
    ) -> Self {
        Self {
            kind,
            stage,
            payload,
            timestamp_ms,
        }
    }
}

// =============================================================================
// EVENT SINK TRAIT
// =============================================================================

/// The observer seam between the engine and its host.
///
/// The engine calls `emit` synchronously during the commit window of a
/// transition or interaction. Implementations must not block and must not
/// fail: a sink that cannot deliver (closed channel, full journal) degrades
/// to dropping the event, never to disturbing navigation or scoring.
///
/// # Extension Point
///
/// This trait is intentionally defined without a production implementation
/// in this crate. Hosts bring their own (analytics pipelines, journals,
/// test recorders). [`NullSink`] and [`MemorySink`] cover the degenerate
/// and in-process cases.
///
/// Sinks must be `Send + Sync`: hosts hold sessions behind shared locks.
pub trait EventSink: Send + Sync {
    /// Receive one event record.
    fn emit(&mut self, event: &LessonEvent);
}

/// A sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &LessonEvent) {}
}

/// A sink that buffers events in memory, in emission order.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Vec<LessonEvent>,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far, oldest first.
    #[must_use]
    pub fn events(&self) -> &[LessonEvent] {
        &self.events
    }

    /// Number of events received.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no events have been received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drain all buffered events, oldest first.
    pub fn drain(&mut self) -> Vec<LessonEvent> {
        std::mem::take(&mut self.events)
    }
}

impl EventSink for MemorySink {
    fn emit(&mut self, event: &LessonEvent) {
        self.events.push(event.clone());
    }
}

// =============================================================================
// TESTS
// =============================================================================
