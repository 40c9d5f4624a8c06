//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Every handler answers with a `success`-bearing JSON body; rejected
//! engine operations map to 4xx with the reason in `error`, and only
//! host-side faults (journal I/O, serialization) map to 5xx.

use super::{
    AppState,
    types::{
        AckResponse, AnswerRequest, ApplicationRequest, CorrectnessResponse, CreateSessionRequest,
        EvalResponse, EventsResponse, HealthResponse, LessonDetailResponse, LessonListResponse,
        LessonSummary, PredictionRequest, QuizSubmitResponse, RestoreRequest, SessionResponse,
        SessionStateJson, SessionStateResponse, SliderRequest, SnapshotResponse,
        TransitionRequest, TransitionResponse,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use base64::Engine as _;
use lessonlab_core::{
    ChoiceIndex, ControllerConfig, LessonError, LessonSession, ModelRequest, Stage, catalog,
    models, snapshot_from_bytes, snapshot_to_bytes,
};

use crate::journal::JournalSink;

/// HTTP status for a rejected engine operation.
fn error_status(error: &LessonError) -> StatusCode {
    match error {
        LessonError::UnknownStage(_)
        | LessonError::UnknownLesson(_)
        | LessonError::ChoiceOutOfRange { .. }
        | LessonError::QuestionOutOfRange(_)
        | LessonError::InvalidParameter { .. }
        | LessonError::LimitExceeded(_)
        | LessonError::DeserializationError(_) => StatusCode::BAD_REQUEST,
        LessonError::WrongStage(_) | LessonError::GateBlocked { .. } => StatusCode::CONFLICT,
        LessonError::SerializationError(_) | LessonError::IoError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

// =============================================================================
// HEALTH & CATALOG HANDLERS
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// List the lesson catalog.
pub async fn lessons_handler() -> impl IntoResponse {
    match catalog::catalog() {
        Ok(lessons) => {
            let summaries: Vec<LessonSummary> = lessons.iter().map(LessonSummary::from).collect();
            (StatusCode::OK, Json(LessonListResponse::success(summaries)))
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(LessonListResponse::error(format!("Catalog failed: {e}"))),
        ),
    }
}

/// Fetch one lesson's full (redacted) detail.
pub async fn lesson_detail_handler(Path(lesson_id): Path<String>) -> impl IntoResponse {
    match catalog::find(&lesson_id) {
        Ok(lesson) => (
            StatusCode::OK,
            Json(LessonDetailResponse::success((&lesson).into())),
        ),
        Err(e) => (
            StatusCode::NOT_FOUND,
            Json(LessonDetailResponse::error(e.to_string())),
        ),
    }
}

// =============================================================================
// SESSION LIFECYCLE HANDLERS
// =============================================================================

/// Create a new lesson session.
pub async fn create_session_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> impl IntoResponse {
    let descriptor = match catalog::find(&request.lesson_id) {
        Ok(d) => d,
        Err(e) => {
            return (
                StatusCode::NOT_FOUND,
                Json(SessionResponse::error(e.to_string())),
            );
        }
    };

    let config = ControllerConfig {
        debounce_ms: request.debounce_ms.unwrap_or(state.defaults.debounce_ms),
        jump_policy: request.jump_policy.unwrap_or(state.defaults.jump_policy),
    };

    let session_id = state.allocate_session_id();
    let sink = JournalSink::new(session_id, state.journal.clone());
    let session = LessonSession::new(
        descriptor,
        config,
        request.resume_hint.as_deref(),
        Box::new(sink),
    );
    let stage = session.stage().key();

    state.sessions.write().await.insert(session_id, session);
    tracing::info!(session_id, lesson = %request.lesson_id, stage, "Session created");

    (StatusCode::OK, Json(SessionResponse::success(session_id, stage)))
}

/// Inspect one session's observable state.
pub async fn session_state_handler(
    State(state): State<AppState>,
    Path(session_id): Path<u64>,
) -> impl IntoResponse {
    let sessions = state.sessions.read().await;
    let Some(session) = sessions.get(&session_id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(SessionStateResponse::error("Session not found")),
        );
    };

    let json = SessionStateJson {
        session_id,
        lesson_id: session.descriptor().id.to_string(),
        stage: session.stage().key().to_string(),
        visited: session
            .controller()
            .visited()
            .iter()
            .map(|s| s.key().to_string())
            .collect(),
        prediction: session.prediction_for(Stage::Predict).map(ChoiceIndex::value),
        twist_prediction: session
            .prediction_for(Stage::TwistPredict)
            .map(ChoiceIndex::value),
        quiz_answered: session.quiz_state().answers.len(),
        quiz_submitted: session.quiz_state().submitted,
        quiz_outcome: session.quiz_outcome(),
        viewed_applications: session.viewed_applications().iter().copied().collect(),
        sliders: session.sliders().clone(),
    };

    (StatusCode::OK, Json(SessionStateResponse::success(json)))
}

// =============================================================================
// NAVIGATION HANDLERS
// =============================================================================

/// Advance to the next stage.
pub async fn advance_handler(
    State(state): State<AppState>,
    Path(session_id): Path<u64>,
) -> impl IntoResponse {
    let mut sessions = state.sessions.write().await;
    let Some(session) = sessions.get_mut(&session_id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(TransitionResponse::error("Session not found")),
        );
    };

    match session.advance() {
        Ok(outcome) => (
            StatusCode::OK,
            Json(TransitionResponse::success(outcome, session.stage().key())),
        ),
        Err(e) => (
            error_status(&e),
            Json(TransitionResponse::error(e.to_string())),
        ),
    }
}

/// Step back one stage.
pub async fn back_handler(
    State(state): State<AppState>,
    Path(session_id): Path<u64>,
) -> impl IntoResponse {
    let mut sessions = state.sessions.write().await;
    let Some(session) = sessions.get_mut(&session_id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(TransitionResponse::error("Session not found")),
        );
    };

    let outcome = session.back();
    (
        StatusCode::OK,
        Json(TransitionResponse::success(outcome, session.stage().key())),
    )
}

/// Jump directly to a stage named by its wire key.
pub async fn goto_handler(
    State(state): State<AppState>,
    Path(session_id): Path<u64>,
    Json(request): Json<TransitionRequest>,
) -> impl IntoResponse {
    // Unknown keys are rejected here: no state change, no event
    let Some(target) = Stage::parse_key(&request.stage) else {
        let e = LessonError::UnknownStage(request.stage);
        return (error_status(&e), Json(TransitionResponse::error(e.to_string())));
    };

    let mut sessions = state.sessions.write().await;
    let Some(session) = sessions.get_mut(&session_id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(TransitionResponse::error("Session not found")),
        );
    };

    match session.jump(target) {
        Ok(outcome) => (
            StatusCode::OK,
            Json(TransitionResponse::success(outcome, session.stage().key())),
        ),
        Err(e) => (
            error_status(&e),
            Json(TransitionResponse::error(e.to_string())),
        ),
    }
}

/// Host re-synchronization to a saved stage.
pub async fn sync_handler(
    State(state): State<AppState>,
    Path(session_id): Path<u64>,
    Json(request): Json<TransitionRequest>,
) -> impl IntoResponse {
    let Some(target) = Stage::parse_key(&request.stage) else {
        let e = LessonError::UnknownStage(request.stage);
        return (error_status(&e), Json(TransitionResponse::error(e.to_string())));
    };

    let mut sessions = state.sessions.write().await;
    let Some(session) = sessions.get_mut(&session_id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(TransitionResponse::error("Session not found")),
        );
    };

    let outcome = session.sync(target);
    (
        StatusCode::OK,
        Json(TransitionResponse::success(outcome, session.stage().key())),
    )
}

// =============================================================================
// INTERACTION HANDLERS
// =============================================================================

/// Commit a prediction in the current prompt stage.
pub async fn prediction_handler(
    State(state): State<AppState>,
    Path(session_id): Path<u64>,
    Json(request): Json<PredictionRequest>,
) -> impl IntoResponse {
    let mut sessions = state.sessions.write().await;
    let Some(session) = sessions.get_mut(&session_id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(CorrectnessResponse::error("Session not found")),
        );
    };

    match session.predict(ChoiceIndex::new(request.choice)) {
        Ok(correct) => (StatusCode::OK, Json(CorrectnessResponse::success(correct))),
        Err(e) => (
            error_status(&e),
            Json(CorrectnessResponse::error(e.to_string())),
        ),
    }
}

/// Record a quiz answer.
pub async fn answer_handler(
    State(state): State<AppState>,
    Path(session_id): Path<u64>,
    Json(request): Json<AnswerRequest>,
) -> impl IntoResponse {
    let mut sessions = state.sessions.write().await;
    let Some(session) = sessions.get_mut(&session_id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(CorrectnessResponse::error("Session not found")),
        );
    };

    match session.answer(request.question, ChoiceIndex::new(request.choice)) {
        Ok(correct) => (StatusCode::OK, Json(CorrectnessResponse::success(correct))),
        Err(e) => (
            error_status(&e),
            Json(CorrectnessResponse::error(e.to_string())),
        ),
    }
}

/// Score the quiz attempt.
pub async fn submit_handler(
    State(state): State<AppState>,
    Path(session_id): Path<u64>,
) -> impl IntoResponse {
    let mut sessions = state.sessions.write().await;
    let Some(session) = sessions.get_mut(&session_id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(QuizSubmitResponse::error("Session not found")),
        );
    };

    match session.submit_quiz() {
        Ok(outcome) => (StatusCode::OK, Json(QuizSubmitResponse::success(outcome))),
        Err(e) => (
            error_status(&e),
            Json(QuizSubmitResponse::error(e.to_string())),
        ),
    }
}

/// Record a slider position.
pub async fn slider_handler(
    State(state): State<AppState>,
    Path(session_id): Path<u64>,
    Json(request): Json<SliderRequest>,
) -> impl IntoResponse {
    let mut sessions = state.sessions.write().await;
    let Some(session) = sessions.get_mut(&session_id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(AckResponse::error("Session not found")),
        );
    };

    match session.set_slider(&request.name, request.value) {
        Ok(()) => (StatusCode::OK, Json(AckResponse::success())),
        Err(e) => (error_status(&e), Json(AckResponse::error(e.to_string()))),
    }
}

/// Mark a transfer application viewed.
pub async fn application_handler(
    State(state): State<AppState>,
    Path(session_id): Path<u64>,
    Json(request): Json<ApplicationRequest>,
) -> impl IntoResponse {
    let mut sessions = state.sessions.write().await;
    let Some(session) = sessions.get_mut(&session_id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(AckResponse::error("Session not found")),
        );
    };

    match session.view_application(request.index) {
        Ok(()) => (StatusCode::OK, Json(AckResponse::success())),
        Err(e) => (error_status(&e), Json(AckResponse::error(e.to_string()))),
    }
}

// =============================================================================
// EVENTS & SNAPSHOT HANDLERS
// =============================================================================

/// Read a session's event log from the journal.
pub async fn events_handler(
    State(state): State<AppState>,
    Path(session_id): Path<u64>,
) -> impl IntoResponse {
    if !state.sessions.read().await.contains_key(&session_id) {
        return (
            StatusCode::NOT_FOUND,
            Json(EventsResponse::error("Session not found")),
        );
    }

    match state.journal.read(session_id) {
        Ok(events) => (StatusCode::OK, Json(EventsResponse::success(events))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(EventsResponse::error(format!("Journal read failed: {e}"))),
        ),
    }
}

/// Export a session snapshot (base64-encoded bytes).
pub async fn snapshot_handler(
    State(state): State<AppState>,
    Path(session_id): Path<u64>,
) -> impl IntoResponse {
    let sessions = state.sessions.read().await;
    let Some(session) = sessions.get(&session_id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(SnapshotResponse::error("Session not found")),
        );
    };

    match snapshot_to_bytes(&session.snapshot()) {
        Ok(bytes) => (StatusCode::OK, Json(SnapshotResponse::success(bytes))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(SnapshotResponse::error(format!("Export failed: {e}"))),
        ),
    }
}

/// Restore a session from a base64 snapshot, allocating a fresh id.
pub async fn restore_handler(
    State(state): State<AppState>,
    Json(request): Json<RestoreRequest>,
) -> impl IntoResponse {
    let bytes = match base64::engine::general_purpose::STANDARD.decode(&request.snapshot) {
        Ok(b) => b,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(SessionResponse::error(format!("Invalid base64: {e}"))),
            );
        }
    };

    let snapshot = match snapshot_from_bytes(&bytes) {
        Ok(s) => s,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(SessionResponse::error(e.to_string())),
            );
        }
    };

    let descriptor = match catalog::find(snapshot.lesson_id.as_str()) {
        Ok(d) => d,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(SessionResponse::error(e.to_string())),
            );
        }
    };

    let session_id = state.allocate_session_id();
    let sink = JournalSink::new(session_id, state.journal.clone());
    let session = match LessonSession::restore(
        descriptor,
        snapshot,
        Box::new(sink),
        Box::new(lessonlab_core::MonotonicClock::new()),
    ) {
        Ok(s) => s,
        Err(e) => {
            return (
                error_status(&e),
                Json(SessionResponse::error(e.to_string())),
            );
        }
    };

    let stage = session.stage().key();
    state.sessions.write().await.insert(session_id, session);
    tracing::info!(session_id, stage, "Session restored from snapshot");

    (StatusCode::OK, Json(SessionResponse::success(session_id, stage)))
}

// =============================================================================
// MODEL EVALUATION HANDLER
// =============================================================================

/// Stateless model evaluation.
pub async fn eval_handler(Json(request): Json<ModelRequest>) -> impl IntoResponse {
    match models::evaluate(&request) {
        Ok(result) => (StatusCode::OK, Json(EvalResponse::success(result))),
        Err(e) => (error_status(&e), Json(EvalResponse::error(e.to_string()))),
    }
}
