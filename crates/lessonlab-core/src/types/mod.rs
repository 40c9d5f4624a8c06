//! # Core Type Definitions
//!
//! This module contains the shared types for the lessonlab engine:
//! - Identifiers (`LessonId`, `ChoiceIndex`)
//! - Time representation (`TimestampMs`)
//! - Error types (`LessonError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`
//! - Carry time as integer milliseconds; no wall-clock reads happen here

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stage::Stage;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Identifier for a lesson family in the catalog.
///
/// Lesson ids are stable snake_case strings ("projectile_motion",
/// "pll_lock", ...) chosen once per lesson family.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LessonId(pub String);

impl LessonId {
    /// Create a new lesson id from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LessonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Zero-based index of an answer choice within a prediction prompt or a
/// quiz question.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct ChoiceIndex(pub u8);

impl ChoiceIndex {
    /// Create a new choice index.
    #[must_use]
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    /// Get the raw index value.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

// =============================================================================
// TIME
// =============================================================================

/// A point in time measured in milliseconds on the host-supplied clock.
///
/// The engine never reads a wall clock; the clock origin is whatever the
/// injected [`crate::controller::Clock`] chooses (typically controller
/// construction time).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct TimestampMs(pub u64);

impl TimestampMs {
    /// Create a timestamp from raw milliseconds.
    #[must_use]
    pub const fn new(ms: u64) -> Self {
        Self(ms)
    }

    /// Get the raw millisecond value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Milliseconds elapsed since an earlier timestamp (saturating).
    #[must_use]
    pub const fn since(self, earlier: TimestampMs) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the lessonlab engine.
///
/// - No silent failures outside the controller's documented no-op outcomes
/// - Use `Result<T, LessonError>` for fallible operations
/// - The engine never panics; all errors are recoverable
#[derive(Debug, Error)]
pub enum LessonError {
    /// A stage key did not name one of the ten stages.
    #[error("Unknown stage: {0:?}")]
    UnknownStage(String),

    /// A lesson id did not match any catalog entry.
    #[error("Unknown lesson: {0}")]
    UnknownLesson(String),

    /// A choice index was out of range for its prompt or question.
    #[error("Choice {choice} out of range for {context} ({len} choices)")]
    ChoiceOutOfRange {
        context: &'static str,
        choice: u8,
        len: usize,
    },

    /// A question index was out of range for the lesson quiz.
    #[error("Question {0} out of range")]
    QuestionOutOfRange(usize),

    /// An interaction arrived in a stage where it is not meaningful
    /// (e.g. a quiz answer outside the test stage).
    #[error("Interaction not valid in stage {0}")]
    WrongStage(Stage),

    /// Forward navigation was blocked by a pedagogical gate.
    #[error("Cannot leave stage {stage}: {requirement}")]
    GateBlocked {
        stage: Stage,
        requirement: &'static str,
    },

    /// A model parameter was non-finite or outside its documented range.
    #[error("Invalid model parameter {name}: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: &'static str,
    },

    /// A session state limit (slider count, name length) was exceeded.
    #[error("Limit exceeded: {0}")]
    LimitExceeded(&'static str),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred (app layer only; the core does no I/O).
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
