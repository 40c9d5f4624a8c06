//! # Engine Constants
//!
//! Hardcoded runtime constants for the lessonlab engine.
//!
//! A lesson widget starts with zero learner state but fixed pedagogy.
//! These constants are compiled into the binary and are immutable at runtime.

/// Number of stages in the fixed lesson sequence.
///
/// Every lesson family walks the same ten stages; the sequence is never
/// extended or shortened per lesson.
pub const STAGE_COUNT: usize = 10;

/// Default debounce window between committed stage transitions, in
/// milliseconds.
///
/// Two transition requests closer together than this are treated as one
/// accidental double-activation; the second is dropped.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Upper bound for a configurable debounce window, in milliseconds.
///
/// Windows above this would make navigation feel broken; requests for a
/// larger window are clamped.
pub const MAX_DEBOUNCE_MS: u64 = 5000;

/// Magic bytes for the lessonlab snapshot format header.
///
/// - File Header = Magic Bytes ("LSSN") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"LSSN";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the snapshot format.
pub const FORMAT_VERSION: u8 = 1;

/// Quiz score (percent correct) required to pass the test stage and
/// unlock mastery.
pub const MASTERY_THRESHOLD_PERCENT: u8 = 70;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum allowed payload size for the snapshot format (1 MB).
///
/// A session snapshot is a few hundred bytes of stage, slider, and quiz
/// state; anything near this limit is corrupted or hostile. The limit is
/// validated BEFORE attempting deserialization.
pub const MAX_SNAPSHOT_PAYLOAD_SIZE: usize = 1024 * 1024;

/// Maximum number of questions in a single quiz.
pub const MAX_QUIZ_QUESTIONS: usize = 32;

/// Maximum number of answer choices per question or prediction prompt.
pub const MAX_CHOICES: usize = 8;

/// Maximum number of slider parameters a session will track.
///
/// Sliders beyond this are rejected to bound snapshot size.
pub const MAX_SLIDERS: usize = 64;

/// Maximum length for a slider parameter name.
pub const MAX_SLIDER_NAME_LENGTH: usize = 64;

/// Maximum number of trajectory samples a model evaluation will return.
pub const MAX_MODEL_SAMPLES: usize = 512;
