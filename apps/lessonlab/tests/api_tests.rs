//! Integration tests for the LessonLab HTTP API.
//!
//! Uses axum-test to test the API handlers without starting a real server.

// Allow unwrap and panic in tests - these are standard for test code
// Allow holding MutexGuard across await in auth tests - tests are serialized
// intentionally to avoid env var conflicts
#![allow(clippy::unwrap_used, clippy::panic, clippy::await_holding_lock)]

use axum::http::HeaderValue;
use axum_test::TestServer;
use lessonlab::api::{
    AppState, CreateSessionRequest, EventsResponse, HealthResponse, LessonDetailResponse,
    LessonListResponse, SessionResponse, SessionStateResponse, SnapshotResponse,
    TransitionResponse, create_router,
};
use lessonlab::journal::EventJournal;
use lessonlab_core::{ControllerConfig, EventKind, JumpPolicy, TransitionOutcome};
use serde_json::json;
use std::sync::Mutex;

/// Mutex to serialize auth tests since they modify env vars.
static AUTH_TEST_MUTEX: Mutex<()> = Mutex::new(());

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Guard wrapper that holds the mutex and ensures cleanup on drop.
struct TestGuard {
    _guard: std::sync::MutexGuard<'static, ()>,
}

impl Drop for TestGuard {
    fn drop(&mut self) {
        // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
        unsafe { std::env::remove_var("LESSONLAB_API_KEY") };
    }
}

/// Create a test server with an in-memory journal and debouncing off.
/// Returns a guard that must be kept alive during the test.
fn create_test_server() -> (TestServer, TestGuard) {
    let guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::remove_var("LESSONLAB_API_KEY") };

    // Scripted requests arrive faster than a human click; disable debounce
    let defaults = ControllerConfig {
        debounce_ms: 0,
        jump_policy: JumpPolicy::Unrestricted,
    };
    let state = AppState::new(EventJournal::in_memory(), defaults);
    let router = create_router(state);
    (
        TestServer::new(router).unwrap(),
        TestGuard { _guard: guard },
    )
}

/// Create a session for `lesson_id` and return its id.
async fn create_session(server: &TestServer, lesson_id: &str) -> u64 {
    let request = CreateSessionRequest {
        lesson_id: lesson_id.to_string(),
        resume_hint: None,
        debounce_ms: None,
        jump_policy: None,
    };
    let response = server.post("/sessions").json(&request).await;
    response.assert_status_ok();
    let result: SessionResponse = response.json();
    assert!(result.success);
    result.session_id.unwrap()
}

/// Advance a session one stage, asserting the transition committed.
async fn advance(server: &TestServer, session_id: u64) -> String {
    let response = server
        .post(&format!("/sessions/{}/advance", session_id))
        .await;
    response.assert_status_ok();
    let result: TransitionResponse = response.json();
    assert!(result.success);
    assert_eq!(result.outcome, Some(TransitionOutcome::Committed));
    result.stage.unwrap()
}

/// Current stage of a session.
async fn current_stage(server: &TestServer, session_id: u64) -> String {
    let response = server.get(&format!("/sessions/{}", session_id)).await;
    response.assert_status_ok();
    let result: SessionStateResponse = response.json();
    result.session.unwrap().stage
}

// =============================================================================
// HEALTH ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (server, _guard) = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

// =============================================================================
// CATALOG ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_lessons_list() {
    let (server, _guard) = create_test_server();

    let response = server.get("/lessons").await;

    response.assert_status_ok();
    let result: LessonListResponse = response.json();
    assert!(result.success);
    assert_eq!(result.lessons.len(), 5);
    assert!(result.lessons.iter().any(|l| l.id == "projectile_motion"));
    assert!(result.lessons.iter().any(|l| l.id == "pll_lock"));
}

#[tokio::test]
async fn test_lesson_detail_redacts_correct_answers() {
    let (server, _guard) = create_test_server();

    let response = server.get("/lessons/projectile_motion").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    let lesson = &body["lesson"];
    assert_eq!(lesson["id"], "projectile_motion");
    assert!(!lesson["predict"]["choices"].as_array().unwrap().is_empty());

    // The widget must not be able to read answers out of the payload
    assert!(lesson["predict"].get("correct").is_none());
    assert!(lesson["twist_predict"].get("correct").is_none());
    for question in lesson["quiz"].as_array().unwrap() {
        assert!(question.get("correct").is_none());
        assert!(question.get("explanation").is_none());
    }
}

#[tokio::test]
async fn test_lesson_detail_unknown_returns_404() {
    let (server, _guard) = create_test_server();

    let response = server.get("/lessons/underwater_basket_weaving").await;

    response.assert_status(axum::http::StatusCode::NOT_FOUND);
    let result: LessonDetailResponse = response.json();
    assert!(!result.success);
    assert!(result.error.is_some());
}

// =============================================================================
// SESSION LIFECYCLE TESTS
// =============================================================================

#[tokio::test]
async fn test_create_session_starts_at_hook() {
    let (server, _guard) = create_test_server();

    let session_id = create_session(&server, "boiling_point").await;
    assert_eq!(current_stage(&server, session_id).await, "hook");
}

#[tokio::test]
async fn test_create_session_unknown_lesson_returns_404() {
    let (server, _guard) = create_test_server();

    let request = json!({ "lesson_id": "nope" });
    let response = server.post("/sessions").json(&request).await;

    response.assert_status(axum::http::StatusCode::NOT_FOUND);
    let result: SessionResponse = response.json();
    assert!(!result.success);
}

#[tokio::test]
async fn test_create_session_with_resume_hint() {
    let (server, _guard) = create_test_server();

    let request = json!({ "lesson_id": "pll_lock", "resume_hint": "play" });
    let response = server.post("/sessions").json(&request).await;
    response.assert_status_ok();
    let result: SessionResponse = response.json();
    assert_eq!(result.stage.as_deref(), Some("play"));
}

#[tokio::test]
async fn test_create_session_garbage_resume_hint_starts_at_hook() {
    let (server, _guard) = create_test_server();

    let request = json!({ "lesson_id": "pll_lock", "resume_hint": "PLAY " });
    let response = server.post("/sessions").json(&request).await;
    response.assert_status_ok();
    let result: SessionResponse = response.json();
    assert_eq!(result.stage.as_deref(), Some("hook"));
}

#[tokio::test]
async fn test_session_ids_are_unique() {
    let (server, _guard) = create_test_server();

    let a = create_session(&server, "pll_lock").await;
    let b = create_session(&server, "pll_lock").await;
    assert_ne!(a, b);
}

#[tokio::test]
async fn test_unknown_session_returns_404() {
    let (server, _guard) = create_test_server();

    let response = server.get("/sessions/424242").await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);

    let response = server.post("/sessions/424242/advance").await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

// =============================================================================
// FULL LESSON FLOW
// =============================================================================

/// Walk a pll_lock session from hook to mastery through the HTTP surface.
/// All pll_lock prompt and quiz answers are choice 1.
#[tokio::test]
async fn test_full_lesson_reaches_mastery() {
    let (server, _guard) = create_test_server();
    let id = create_session(&server, "pll_lock").await;

    assert_eq!(advance(&server, id).await, "predict");

    let response = server
        .post(&format!("/sessions/{}/prediction", id))
        .json(&json!({ "choice": 1 }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["correct"], true);

    assert_eq!(advance(&server, id).await, "play");

    let response = server
        .post(&format!("/sessions/{}/slider", id))
        .json(&json!({ "name": "loop_bandwidth", "value": 0.4 }))
        .await;
    response.assert_status_ok();

    assert_eq!(advance(&server, id).await, "review");
    assert_eq!(advance(&server, id).await, "twist_predict");

    let response = server
        .post(&format!("/sessions/{}/prediction", id))
        .json(&json!({ "choice": 1 }))
        .await;
    response.assert_status_ok();

    assert_eq!(advance(&server, id).await, "twist_play");
    assert_eq!(advance(&server, id).await, "twist_review");
    assert_eq!(advance(&server, id).await, "transfer");

    let response = server
        .post(&format!("/sessions/{}/application", id))
        .json(&json!({ "index": 0 }))
        .await;
    response.assert_status_ok();

    assert_eq!(advance(&server, id).await, "test");

    for question in 0..3 {
        let response = server
            .post(&format!("/sessions/{}/answer", id))
            .json(&json!({ "question": question, "choice": 1 }))
            .await;
        response.assert_status_ok();
    }

    let response = server.post(&format!("/sessions/{}/submit", id)).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["outcome"]["passed"], true);
    assert_eq!(body["outcome"]["percent"], 100);

    assert_eq!(advance(&server, id).await, "mastery");
}

// =============================================================================
// GATE TESTS
// =============================================================================

#[tokio::test]
async fn test_advance_without_prediction_returns_409() {
    let (server, _guard) = create_test_server();
    let id = create_session(&server, "overlay_error").await;

    assert_eq!(advance(&server, id).await, "predict");

    let response = server.post(&format!("/sessions/{}/advance", id)).await;
    response.assert_status(axum::http::StatusCode::CONFLICT);
    let result: TransitionResponse = response.json();
    assert!(!result.success);
    assert!(result.error.is_some());

    // The gate held: no state change
    assert_eq!(current_stage(&server, id).await, "predict");
}

#[tokio::test]
async fn test_failed_quiz_blocks_mastery() {
    let (server, _guard) = create_test_server();
    let id = create_session(&server, "pll_lock").await;

    // Host sync is not gated; drop straight onto the test stage
    let response = server
        .post(&format!("/sessions/{}/sync", id))
        .json(&json!({ "stage": "test" }))
        .await;
    response.assert_status_ok();

    // Answer everything wrong (correct is choice 1)
    for question in 0..3 {
        let response = server
            .post(&format!("/sessions/{}/answer", id))
            .json(&json!({ "question": question, "choice": 0 }))
            .await;
        response.assert_status_ok();
    }

    let response = server.post(&format!("/sessions/{}/submit", id)).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["outcome"]["passed"], false);

    let response = server.post(&format!("/sessions/{}/advance", id)).await;
    response.assert_status(axum::http::StatusCode::CONFLICT);
    assert_eq!(current_stage(&server, id).await, "test");
}

#[tokio::test]
async fn test_prediction_outside_prompt_stage_returns_409() {
    let (server, _guard) = create_test_server();
    let id = create_session(&server, "pll_lock").await;

    // Still at hook
    let response = server
        .post(&format!("/sessions/{}/prediction", id))
        .json(&json!({ "choice": 0 }))
        .await;
    response.assert_status(axum::http::StatusCode::CONFLICT);
}

// =============================================================================
// NAVIGATION TESTS
// =============================================================================

#[tokio::test]
async fn test_goto_unknown_stage_returns_400_without_state_change() {
    let (server, _guard) = create_test_server();
    let id = create_session(&server, "assumption_audit").await;

    let response = server
        .post(&format!("/sessions/{}/goto", id))
        .json(&json!({ "stage": "warp_speed" }))
        .await;
    response.assert_status_bad_request();
    let result: TransitionResponse = response.json();
    assert!(!result.success);
    assert!(
        result
            .error
            .as_deref()
            .unwrap_or_default()
            .contains("Unknown stage")
    );

    assert_eq!(current_stage(&server, id).await, "hook");
}

#[tokio::test]
async fn test_goto_and_back() {
    let (server, _guard) = create_test_server();
    let id = create_session(&server, "assumption_audit").await;

    let response = server
        .post(&format!("/sessions/{}/goto", id))
        .json(&json!({ "stage": "transfer" }))
        .await;
    response.assert_status_ok();
    let result: TransitionResponse = response.json();
    assert_eq!(result.outcome, Some(TransitionOutcome::Committed));
    assert_eq!(result.stage.as_deref(), Some("transfer"));

    let response = server.post(&format!("/sessions/{}/back", id)).await;
    response.assert_status_ok();
    let result: TransitionResponse = response.json();
    assert_eq!(result.stage.as_deref(), Some("twist_review"));
}

#[tokio::test]
async fn test_back_at_hook_reports_boundary() {
    let (server, _guard) = create_test_server();
    let id = create_session(&server, "assumption_audit").await;

    let response = server.post(&format!("/sessions/{}/back", id)).await;
    response.assert_status_ok();
    let result: TransitionResponse = response.json();
    assert_eq!(result.outcome, Some(TransitionOutcome::AtBoundary));
    assert_eq!(result.stage.as_deref(), Some("hook"));
}

#[tokio::test]
async fn test_visited_only_policy_denies_far_jump() {
    let (server, _guard) = create_test_server();

    let request = CreateSessionRequest {
        lesson_id: "boiling_point".to_string(),
        resume_hint: None,
        debounce_ms: Some(0),
        jump_policy: Some(JumpPolicy::VisitedOnly),
    };
    let response = server.post("/sessions").json(&request).await;
    response.assert_status_ok();
    let id: SessionResponse = response.json();
    let id = id.session_id.unwrap();

    let response = server
        .post(&format!("/sessions/{}/goto", id))
        .json(&json!({ "stage": "transfer" }))
        .await;
    response.assert_status_ok();
    let result: TransitionResponse = response.json();
    assert_eq!(result.outcome, Some(TransitionOutcome::PolicyDenied));
    assert_eq!(current_stage(&server, id).await, "hook");
}

#[tokio::test]
async fn test_rapid_advance_is_debounced() {
    let (server, _guard) = create_test_server();

    let request = CreateSessionRequest {
        lesson_id: "boiling_point".to_string(),
        resume_hint: None,
        debounce_ms: Some(5000),
        jump_policy: None,
    };
    let response = server.post("/sessions").json(&request).await;
    let id: SessionResponse = response.json();
    let id = id.session_id.unwrap();

    // First advance commits, the immediate second one lands in the window
    assert_eq!(advance(&server, id).await, "predict");
    let response = server.post(&format!("/sessions/{}/advance", id)).await;
    response.assert_status_ok();
    let result: TransitionResponse = response.json();
    assert_eq!(result.outcome, Some(TransitionOutcome::Debounced));
    assert_eq!(result.stage.as_deref(), Some("predict"));
}

// =============================================================================
// EVENTS & SNAPSHOT TESTS
// =============================================================================

#[tokio::test]
async fn test_events_are_journaled_per_session() {
    let (server, _guard) = create_test_server();
    let id = create_session(&server, "boiling_point").await;
    let other = create_session(&server, "boiling_point").await;

    advance(&server, id).await;

    let response = server.get(&format!("/sessions/{}/events", id)).await;
    response.assert_status_ok();
    let result: EventsResponse = response.json();
    assert!(result.success);
    assert_eq!(result.events.len(), 1);
    assert_eq!(result.events[0].kind, EventKind::StageChanged);

    // The sibling session's log is untouched
    let response = server.get(&format!("/sessions/{}/events", other)).await;
    let result: EventsResponse = response.json();
    assert!(result.events.is_empty());
}

#[tokio::test]
async fn test_sync_emits_state_synced_event() {
    let (server, _guard) = create_test_server();
    let id = create_session(&server, "boiling_point").await;

    let response = server
        .post(&format!("/sessions/{}/sync", id))
        .json(&json!({ "stage": "review" }))
        .await;
    response.assert_status_ok();

    let response = server.get(&format!("/sessions/{}/events", id)).await;
    let result: EventsResponse = response.json();
    assert_eq!(result.events.len(), 1);
    assert_eq!(result.events[0].kind, EventKind::StateSynced);
}

#[tokio::test]
async fn test_snapshot_and_restore_round_trip() {
    let (server, _guard) = create_test_server();
    let id = create_session(&server, "pll_lock").await;

    advance(&server, id).await; // predict
    let response = server
        .post(&format!("/sessions/{}/prediction", id))
        .json(&json!({ "choice": 1 }))
        .await;
    response.assert_status_ok();
    advance(&server, id).await; // play

    let response = server.get(&format!("/sessions/{}/snapshot", id)).await;
    response.assert_status_ok();
    let snapshot: SnapshotResponse = response.json();
    assert!(snapshot.success);
    let data = snapshot.data.unwrap();

    let response = server
        .post("/sessions/restore")
        .json(&json!({ "snapshot": data }))
        .await;
    response.assert_status_ok();
    let restored: SessionResponse = response.json();
    assert!(restored.success);
    let restored_id = restored.session_id.unwrap();
    assert_ne!(restored_id, id);
    assert_eq!(restored.stage.as_deref(), Some("play"));

    // The restored session carries the committed prediction
    let response = server.get(&format!("/sessions/{}", restored_id)).await;
    let state: SessionStateResponse = response.json();
    assert_eq!(state.session.unwrap().prediction, Some(1));
}

#[tokio::test]
async fn test_restore_rejects_garbage() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/sessions/restore")
        .json(&json!({ "snapshot": "!!not base64!!" }))
        .await;
    response.assert_status_bad_request();

    let valid_b64_garbage =
        base64::Engine::encode(&base64::engine::general_purpose::STANDARD, b"XXXXXXXX");
    let response = server
        .post("/sessions/restore")
        .json(&json!({ "snapshot": valid_b64_garbage }))
        .await;
    response.assert_status_bad_request();
}

// =============================================================================
// MODEL EVALUATION TESTS
// =============================================================================

#[tokio::test]
async fn test_eval_projectile() {
    let (server, _guard) = create_test_server();

    let request = json!({
        "model": "projectile",
        "speed_mps": 30.0,
        "angle_deg": 45.0,
        "gravity_mps2": 9.81,
        "samples": 16
    });
    let response = server.post("/eval").json(&request).await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    let range = body["result"]["range_m"].as_f64().unwrap();
    // v²·sin(2θ)/g = 900/9.81 ≈ 91.74 at 45°
    assert!((range - 91.74).abs() < 0.1, "range was {}", range);
    assert_eq!(body["result"]["trajectory"].as_array().unwrap().len(), 16);
}

#[tokio::test]
async fn test_eval_rejects_out_of_range_params() {
    let (server, _guard) = create_test_server();

    let request = json!({
        "model": "projectile",
        "speed_mps": 30.0,
        "angle_deg": 181.0,
        "gravity_mps2": 9.81,
        "samples": 16
    });
    let response = server.post("/eval").json(&request).await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
}

// =============================================================================
// ERROR HANDLING TESTS
// =============================================================================

#[tokio::test]
async fn test_404_on_unknown_endpoint() {
    let (server, _guard) = create_test_server();

    let response = server.get("/unknown").await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_method_not_allowed() {
    let (server, _guard) = create_test_server();

    // /health is GET only
    let response = server.post("/health").await;
    assert_eq!(response.status_code().as_u16(), 405);
}

#[tokio::test]
async fn test_invalid_json_body() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/sessions")
        .bytes(bytes::Bytes::from("not valid json"))
        .content_type("application/json")
        .await;

    assert!(response.status_code().is_client_error());
}

// =============================================================================
// AUTHENTICATION MIDDLEWARE TESTS
// =============================================================================

/// Create a test server with authentication enabled.
/// Must be called while holding AUTH_TEST_MUTEX.
fn create_auth_test_server(api_key: &str) -> TestServer {
    // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::set_var("LESSONLAB_API_KEY", api_key) };
    let state = AppState::new(EventJournal::in_memory(), ControllerConfig::default());
    let router = create_router(state);
    TestServer::new(router).unwrap()
}

/// Clean up auth env var after test.
fn cleanup_auth_env() {
    // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::remove_var("LESSONLAB_API_KEY") };
}

#[tokio::test]
async fn test_auth_valid_bearer_token() {
    let _guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let api_key = "test-secret-key-12345";
    let server = create_auth_test_server(api_key);

    let response = server
        .get("/lessons")
        .add_header(
            axum::http::header::AUTHORIZATION,
            format!("Bearer {}", api_key)
                .parse::<HeaderValue>()
                .unwrap(),
        )
        .await;

    cleanup_auth_env();

    response.assert_status_ok();
    let result: LessonListResponse = response.json();
    assert!(result.success);
}

#[tokio::test]
async fn test_auth_invalid_token_rejected() {
    let _guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let api_key = "correct-key";
    let server = create_auth_test_server(api_key);

    let response = server
        .get("/lessons")
        .add_header(
            axum::http::header::AUTHORIZATION,
            "Bearer wrong-key".parse::<HeaderValue>().unwrap(),
        )
        .await;

    cleanup_auth_env();

    assert_eq!(
        response.status_code().as_u16(),
        401,
        "Invalid token should return 401 Unauthorized"
    );
}

#[tokio::test]
async fn test_auth_missing_header_rejected() {
    let _guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let api_key = "required-key";
    let server = create_auth_test_server(api_key);

    let response = server.get("/lessons").await;

    cleanup_auth_env();

    assert_eq!(
        response.status_code().as_u16(),
        401,
        "Missing Authorization header should return 401 Unauthorized"
    );
}

#[tokio::test]
async fn test_auth_health_endpoint_bypasses_auth() {
    let _guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let api_key = "secret-key-for-bypass-test";
    let server = create_auth_test_server(api_key);

    let response = server.get("/health").await;

    cleanup_auth_env();

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
}
