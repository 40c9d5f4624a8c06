//! # Lesson Stages
//!
//! The fixed ten-stage pedagogical sequence every lesson family walks:
//!
//! | # | Stage | Purpose |
//! |---|-------|---------|
//! | 0 | hook | Provoke curiosity with a concrete scenario |
//! | 1 | predict | Learner commits to a prediction |
//! | 2 | play | Interactive lab for the base concept |
//! | 3 | review | Resolve the prediction against observation |
//! | 4 | twist_predict | Prediction for the twist variable |
//! | 5 | twist_play | Lab with the twist variable exposed |
//! | 6 | twist_review | Resolve the twist prediction |
//! | 7 | transfer | Real-world application gallery |
//! | 8 | test | Scored knowledge test |
//! | 9 | mastery | Terminal stage; completion summary |
//!
//! The set is immutable and totally ordered. `mastery` is terminal: the
//! controller defines no transition out of it, and a host-level restart
//! constructs a fresh controller instead.

use serde::{Deserialize, Serialize};

use crate::primitives::STAGE_COUNT;

// =============================================================================
// STAGE ENUM
// =============================================================================

/// One named step in the fixed ten-step lesson sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Curiosity hook.
    Hook,
    /// First prediction.
    Predict,
    /// Base-concept lab.
    Play,
    /// Base-concept review.
    Review,
    /// Twist prediction.
    TwistPredict,
    /// Twist lab.
    TwistPlay,
    /// Twist review.
    TwistReview,
    /// Real-world transfer gallery.
    Transfer,
    /// Scored knowledge test.
    Test,
    /// Terminal completion stage.
    Mastery,
}

/// All stages in pedagogical order.
pub const ALL_STAGES: [Stage; STAGE_COUNT] = [
    Stage::Hook,
    Stage::Predict,
    Stage::Play,
    Stage::Review,
    Stage::TwistPredict,
    Stage::TwistPlay,
    Stage::TwistReview,
    Stage::Transfer,
    Stage::Test,
    Stage::Mastery,
];

impl Stage {
    /// Get the zero-based position of this stage in the sequence.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Stage::Hook => 0,
            Stage::Predict => 1,
            Stage::Play => 2,
            Stage::Review => 3,
            Stage::TwistPredict => 4,
            Stage::TwistPlay => 5,
            Stage::TwistReview => 6,
            Stage::Transfer => 7,
            Stage::Test => 8,
            Stage::Mastery => 9,
        }
    }

    /// Get the stage at a sequence position, if in range.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Stage> {
        ALL_STAGES.get(index).copied()
    }

    /// Stable snake_case wire key for this stage.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Stage::Hook => "hook",
            Stage::Predict => "predict",
            Stage::Play => "play",
            Stage::Review => "review",
            Stage::TwistPredict => "twist_predict",
            Stage::TwistPlay => "twist_play",
            Stage::TwistReview => "twist_review",
            Stage::Transfer => "transfer",
            Stage::Test => "test",
            Stage::Mastery => "mastery",
        }
    }

    /// Parse a stage from its wire key.
    ///
    /// Returns `None` for anything outside the fixed set, including the
    /// empty string.
    #[must_use]
    pub fn parse_key(key: &str) -> Option<Stage> {
        ALL_STAGES.iter().copied().find(|s| s.key() == key)
    }

    /// Human-readable stage name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Stage::Hook => "Hook",
            Stage::Predict => "Predict",
            Stage::Play => "Play",
            Stage::Review => "Review",
            Stage::TwistPredict => "Twist Predict",
            Stage::TwistPlay => "Twist Play",
            Stage::TwistReview => "Twist Review",
            Stage::Transfer => "Transfer",
            Stage::Test => "Test",
            Stage::Mastery => "Mastery",
        }
    }

    /// Get the next stage, if any (no wraparound).
    #[must_use]
    pub fn next(self) -> Option<Stage> {
        Stage::from_index(self.index() + 1)
    }

    /// Get the previous stage, if any (no wraparound).
    #[must_use]
    pub fn previous(self) -> Option<Stage> {
        self.index().checked_sub(1).and_then(Stage::from_index)
    }

    /// Check if this stage is terminal (mastery).
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Mastery)
    }

    /// Check if this stage is the first in the sequence (hook).
    #[must_use]
    pub fn is_first(self) -> bool {
        matches!(self, Stage::Hook)
    }

    /// Resolve a host-supplied resume hint.
    ///
    /// Returns the named stage when the hint is one of the ten valid wire
    /// keys, and the first stage (hook) for anything else — `None`, the
    /// empty string, or an unknown key. Round-trip law:
    /// `from_resume_hint(Some(s.key())) == s` for every stage `s`.
    #[must_use]
    pub fn from_resume_hint(hint: Option<&str>) -> Stage {
        hint.and_then(Stage::parse_key).unwrap_or(Stage::Hook)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

// =============================================================================
// TESTS
// =============================================================================
