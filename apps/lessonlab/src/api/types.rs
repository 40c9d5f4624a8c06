//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.
//!
//! Lesson detail responses redact correct answers: a widget learns
//! whether a choice was right from the interaction responses, not from
//! the catalog payload.

use lessonlab_core::{
    JumpPolicy, LessonDescriptor, LessonEvent, ModelResponse, QuizOutcome, TransitionOutcome,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// LESSON CATALOG
// =============================================================================

/// One catalog entry in the list view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonSummary {
    pub id: String,
    pub title: String,
    pub concept: String,
    pub model: String,
}

impl From<&LessonDescriptor> for LessonSummary {
    fn from(lesson: &LessonDescriptor) -> Self {
        Self {
            id: lesson.id.to_string(),
            title: lesson.title.clone(),
            concept: lesson.concept.clone(),
            model: lesson.model.to_string(),
        }
    }
}

/// Catalog list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonListResponse {
    pub success: bool,
    pub lessons: Vec<LessonSummary>,
    pub error: Option<String>,
}

impl LessonListResponse {
    pub fn success(lessons: Vec<LessonSummary>) -> Self {
        Self {
            success: true,
            lessons,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            lessons: vec![],
            error: Some(msg.into()),
        }
    }
}

/// A prediction prompt with the correct index withheld.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptJson {
    pub question: String,
    pub choices: Vec<String>,
}

/// A quiz question with the correct index and explanation withheld.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionJson {
    pub prompt: String,
    pub choices: Vec<String>,
}

/// One transfer-gallery entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationJson {
    pub title: String,
    pub blurb: String,
}

/// Full lesson detail (redacted for widget consumption).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonJson {
    pub id: String,
    pub title: String,
    pub concept: String,
    pub hook: String,
    pub model: String,
    pub predict: PromptJson,
    pub twist_predict: PromptJson,
    pub quiz: Vec<QuestionJson>,
    pub applications: Vec<ApplicationJson>,
}

impl From<&LessonDescriptor> for LessonJson {
    fn from(lesson: &LessonDescriptor) -> Self {
        Self {
            id: lesson.id.to_string(),
            title: lesson.title.clone(),
            concept: lesson.concept.clone(),
            hook: lesson.hook.clone(),
            model: lesson.model.to_string(),
            predict: PromptJson {
                question: lesson.predict.question.clone(),
                choices: lesson.predict.choices.clone(),
            },
            twist_predict: PromptJson {
                question: lesson.twist_predict.question.clone(),
                choices: lesson.twist_predict.choices.clone(),
            },
            quiz: lesson
                .quiz
                .questions()
                .iter()
                .map(|q| QuestionJson {
                    prompt: q.prompt.clone(),
                    choices: q.choices.clone(),
                })
                .collect(),
            applications: lesson
                .applications
                .iter()
                .map(|a| ApplicationJson {
                    title: a.title.clone(),
                    blurb: a.blurb.clone(),
                })
                .collect(),
        }
    }
}

/// Lesson detail response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonDetailResponse {
    pub success: bool,
    pub lesson: Option<LessonJson>,
    pub error: Option<String>,
}

impl LessonDetailResponse {
    pub fn success(lesson: LessonJson) -> Self {
        Self {
            success: true,
            lesson: Some(lesson),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            lesson: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// SESSION LIFECYCLE
// =============================================================================

/// Session creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    /// Catalog id of the lesson to start.
    pub lesson_id: String,
    /// Optional resume hint (a stage wire key; anything else starts at
    /// hook).
    #[serde(default)]
    pub resume_hint: Option<String>,
    /// Per-session debounce override, ms.
    #[serde(default)]
    pub debounce_ms: Option<u64>,
    /// Per-session jump policy override.
    #[serde(default)]
    pub jump_policy: Option<JumpPolicy>,
}

/// Session creation / restore response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub success: bool,
    pub session_id: Option<u64>,
    pub stage: Option<String>,
    pub error: Option<String>,
}

impl SessionResponse {
    pub fn success(session_id: u64, stage: impl Into<String>) -> Self {
        Self {
            success: true,
            session_id: Some(session_id),
            stage: Some(stage.into()),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            session_id: None,
            stage: None,
            error: Some(msg.into()),
        }
    }
}

/// Observable state of one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStateJson {
    pub session_id: u64,
    pub lesson_id: String,
    pub stage: String,
    pub visited: Vec<String>,
    pub prediction: Option<u8>,
    pub twist_prediction: Option<u8>,
    pub quiz_answered: usize,
    pub quiz_submitted: bool,
    pub quiz_outcome: Option<QuizOutcome>,
    pub viewed_applications: Vec<u8>,
    pub sliders: std::collections::BTreeMap<String, f64>,
}

/// Session state response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStateResponse {
    pub success: bool,
    pub session: Option<SessionStateJson>,
    pub error: Option<String>,
}

impl SessionStateResponse {
    pub fn success(session: SessionStateJson) -> Self {
        Self {
            success: true,
            session: Some(session),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            session: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// NAVIGATION
// =============================================================================

/// Direct jump / sync request. The stage arrives as a wire key; unknown
/// keys are rejected at this boundary with no state change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub stage: String,
}

/// Navigation response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionResponse {
    pub success: bool,
    pub outcome: Option<TransitionOutcome>,
    pub stage: Option<String>,
    pub error: Option<String>,
}

impl TransitionResponse {
    pub fn success(outcome: TransitionOutcome, stage: impl Into<String>) -> Self {
        Self {
            success: true,
            outcome: Some(outcome),
            stage: Some(stage.into()),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            outcome: None,
            stage: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// IN-STAGE INTERACTIONS
// =============================================================================

/// Prediction commitment request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub choice: u8,
}

/// Quiz answer request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub question: usize,
    pub choice: u8,
}

/// Response to a prediction or answer: was the choice correct?
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectnessResponse {
    pub success: bool,
    pub correct: Option<bool>,
    pub error: Option<String>,
}

impl CorrectnessResponse {
    pub fn success(correct: bool) -> Self {
        Self {
            success: true,
            correct: Some(correct),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            correct: None,
            error: Some(msg.into()),
        }
    }
}

/// Quiz submission response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSubmitResponse {
    pub success: bool,
    pub outcome: Option<QuizOutcome>,
    pub error: Option<String>,
}

impl QuizSubmitResponse {
    pub fn success(outcome: QuizOutcome) -> Self {
        Self {
            success: true,
            outcome: Some(outcome),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            outcome: None,
            error: Some(msg.into()),
        }
    }
}

/// Slider update request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SliderRequest {
    pub name: String,
    pub value: f64,
}

/// Application-viewed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationRequest {
    pub index: u8,
}

/// Minimal acknowledgement response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckResponse {
    pub success: bool,
    pub error: Option<String>,
}

impl AckResponse {
    pub fn success() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// EVENTS, SNAPSHOTS, MODELS
// =============================================================================

/// Session event log response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsResponse {
    pub success: bool,
    pub events: Vec<LessonEvent>,
    pub error: Option<String>,
}

impl EventsResponse {
    pub fn success(events: Vec<LessonEvent>) -> Self {
        Self {
            success: true,
            events,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            events: vec![],
            error: Some(msg.into()),
        }
    }
}

/// Snapshot export response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub success: bool,
    pub data: Option<String>, // Base64 encoded
    pub error: Option<String>,
}

impl SnapshotResponse {
    pub fn success(data: Vec<u8>) -> Self {
        Self {
            success: true,
            data: Some(base64::Engine::encode(
                &base64::engine::general_purpose::STANDARD,
                &data,
            )),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// Snapshot restore request (base64 snapshot bytes).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreRequest {
    pub snapshot: String,
}

/// Model evaluation response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalResponse {
    pub success: bool,
    pub result: Option<ModelResponse>,
    pub error: Option<String>,
}

impl EvalResponse {
    pub fn success(result: ModelResponse) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(msg.into()),
        }
    }
}
