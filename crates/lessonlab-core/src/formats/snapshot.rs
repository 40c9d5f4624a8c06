//! # Session Snapshot Format
//!
//! Binary serialization for resumable session state.
//!
//! Format: Header (5 bytes) + postcard-serialized snapshot data.
//! - 4 bytes: Magic ("LSSN")
//! - 1 byte: Version
//!
//! Size and header are validated BEFORE the payload is parsed; a snapshot
//! is a few hundred bytes, so anything near the size limit is corrupted
//! or hostile.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::controller::ControllerConfig;
use crate::primitives::{self, MAX_SNAPSHOT_PAYLOAD_SIZE};
use crate::quiz::{QuizOutcome, QuizState};
use crate::stage::Stage;
use crate::types::{ChoiceIndex, LessonError, LessonId};

/// Minimum valid snapshot size (header only).
const MIN_SNAPSHOT_SIZE: usize = 5;

// =============================================================================
// SNAPSHOT DATA
// =============================================================================

/// The resumable state of one lesson session.
///
/// Timestamps are deliberately absent: the debounce window restarts empty
/// on restore, and clocks do not survive serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Which lesson family the session was working.
    pub lesson_id: LessonId,
    /// Stage at capture time.
    pub stage: Stage,
    /// Stages visited before capture.
    pub visited: BTreeSet<Stage>,
    /// Controller configuration in effect.
    pub config: ControllerConfig,
    /// Slider positions.
    pub sliders: BTreeMap<String, f64>,
    /// Committed predict-stage choice.
    pub prediction: Option<ChoiceIndex>,
    /// Committed twist_predict-stage choice.
    pub twist_prediction: Option<ChoiceIndex>,
    /// Recorded quiz answers.
    pub quiz_state: QuizState,
    /// Scored quiz outcome, if submitted.
    pub quiz_outcome: Option<QuizOutcome>,
    /// Viewed transfer applications.
    pub viewed_applications: BTreeSet<u8>,
}

impl SessionSnapshot {
    /// The resume hint a host would persist alongside (or instead of) the
    /// full snapshot.
    #[must_use]
    pub fn resume_hint(&self) -> &'static str {
        self.stage.key()
    }
}

// =============================================================================
// FILE HEADER
// =============================================================================

/// The snapshot header precedes all session data.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl SnapshotHeader {
    /// Create a new header with the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    /// Validate the header.
    pub fn validate(&self) -> Result<(), LessonError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(LessonError::DeserializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(LessonError::DeserializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// Write the header to bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 5] {
        let mut bytes = [0u8; 5];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    /// Read a header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LessonError> {
        if bytes.len() < MIN_SNAPSHOT_SIZE {
            return Err(LessonError::DeserializationError(
                "Header too short".to_string(),
            ));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize a snapshot to bytes (header + payload).
pub fn snapshot_to_bytes(snapshot: &SessionSnapshot) -> Result<Vec<u8>, LessonError> {
    let header = SnapshotHeader::new();
    let payload =
        postcard::to_stdvec(snapshot).map_err(|e| LessonError::SerializationError(e.to_string()))?;

    let mut result = Vec::with_capacity(MIN_SNAPSHOT_SIZE + payload.len());
    result.extend_from_slice(&header.to_bytes());
    result.extend_from_slice(&payload);
    Ok(result)
}

/// Deserialize a snapshot from bytes.
///
/// Validates minimum size, maximum size, and the header before touching
/// the payload.
pub fn snapshot_from_bytes(bytes: &[u8]) -> Result<SessionSnapshot, LessonError> {
    if bytes.len() < MIN_SNAPSHOT_SIZE {
        return Err(LessonError::DeserializationError(
            "Data too short: minimum 5 bytes required".to_string(),
        ));
    }
    if bytes.len() > MAX_SNAPSHOT_PAYLOAD_SIZE {
        return Err(LessonError::DeserializationError(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_SNAPSHOT_PAYLOAD_SIZE
        )));
    }

    let header = SnapshotHeader::from_bytes(bytes)?;
    header.validate()?;

    let payload = &bytes[MIN_SNAPSHOT_SIZE..];
    postcard::from_bytes(payload).map_err(|e| {
        LessonError::DeserializationError(format!("Failed to deserialize snapshot: {e}"))
    })
}

// =============================================================================
// TESTS
// =============================================================================
