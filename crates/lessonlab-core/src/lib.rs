//! # lessonlab-core
//!
//! The deterministic lesson engine for LessonLab - THE LOGIC.
//!
//! This crate implements the engine behind a family of interactive
//! micro-lessons: a fixed ten-stage pedagogical sequence, the phase
//! controller that serializes navigation through it, per-session learner
//! state with pedagogical gates, closed-form physics models for the play
//! stages, and a uniform event contract toward the host.
//!
//! ## Architectural Constraints
//!
//! The engine:
//! - Is deterministic: identical inputs yield identical states and events
//! - Reads no wall clock; time arrives through the injected [`Clock`]
//! - Does no I/O; hosts own storage, transport, and rendering
//! - Never panics; every fallible operation returns `Result`
//! - Has NO async, NO network dependencies (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod catalog;
pub mod controller;
pub mod event;
pub mod formats;
pub mod models;
pub mod primitives;
pub mod quiz;
pub mod session;
pub mod stage;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{ChoiceIndex, LessonError, LessonId, TimestampMs};

// =============================================================================
// RE-EXPORTS: Lesson Engine
// =============================================================================

pub use catalog::{Application, LessonDescriptor, PredictionPrompt};
pub use controller::{
    Clock, ControllerConfig, JumpPolicy, ManualClock, MonotonicClock, PhaseController,
    TransitionOutcome,
};
pub use event::{EventKind, EventPayload, EventSink, LessonEvent, MemorySink, NullSink};
pub use models::{ModelKind, ModelRequest, ModelResponse};
pub use quiz::{Question, Quiz, QuizOutcome, QuizState};
pub use session::LessonSession;
pub use stage::{ALL_STAGES, Stage};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{SessionSnapshot, SnapshotHeader, snapshot_from_bytes, snapshot_to_bytes};
