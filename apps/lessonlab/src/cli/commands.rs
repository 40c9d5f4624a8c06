//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api;
use crate::config::AppConfig;
use crate::journal::{EventJournal, JournalSink};
use lessonlab_core::{
    ControllerConfig, LessonError, LessonSession, ModelRequest, Stage, catalog, models,
};
use std::path::Path;
use std::sync::Arc;

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum file size for model evaluation requests (1 MB).
///
/// A request is a handful of named parameters; anything larger is a
/// mistake or an attack.
const MAX_EVAL_FILE_SIZE: u64 = 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), LessonError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| LessonError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(LessonError::DeserializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Validate file path for security.
///
/// This function:
/// 1. Canonicalizes the path to resolve symlinks and ".."
/// 2. Ensures the path exists
/// 3. Ensures the path is a file (not a directory)
fn validate_file_path(path: &Path) -> Result<std::path::PathBuf, LessonError> {
    // Canonicalize resolves "..", symlinks, and validates existence
    let canonical = path.canonicalize().map_err(|e| {
        LessonError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    // Ensure it's a file, not a directory
    if !canonical.is_file() {
        return Err(LessonError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    config_path: Option<&Path>,
    journal_path: Option<&Path>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), LessonError> {
    let mut config = match config_path {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::load_default()?,
    };
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }

    // CLI flag beats the config file for the journal location
    let journal_path = journal_path
        .map(Path::to_path_buf)
        .or_else(|| config.journal_path.clone());
    let journal = match &journal_path {
        Some(path) => EventJournal::open(path)?,
        None => EventJournal::in_memory(),
    };

    println!("LessonLab Micro-Lesson Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:        {}", config.host);
    println!("  Port:        {}", config.port);
    println!("  Debounce:    {} ms", config.debounce_ms);
    println!("  Jump policy: {:?}", config.jump_policy);
    match &journal_path {
        Some(path) => println!("  Journal:     {:?}", path),
        None => println!("  Journal:     in-memory"),
    }
    println!();
    println!("Endpoints:");
    println!("  GET  /lessons            - List the lesson catalog");
    println!("  POST /sessions           - Create a lesson session");
    println!("  POST /sessions/{{id}}/...  - Navigate and interact");
    println!("  GET  /sessions/{{id}}      - Inspect session state");
    println!("  POST /eval               - Evaluate a lesson model");
    println!("  GET  /health             - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = config.bind_addr();
    api::run_server(&addr, journal, config.controller_config()).await
}

// =============================================================================
// LESSONS COMMAND
// =============================================================================

/// List the catalog, or show one lesson in full.
pub fn cmd_lessons(json_mode: bool, lesson: Option<&str>) -> Result<(), LessonError> {
    match lesson {
        Some(id) => {
            let lesson = catalog::find(id)?;

            if json_mode {
                let output = serde_json::json!({
                    "id": lesson.id.as_str(),
                    "title": lesson.title,
                    "concept": lesson.concept,
                    "model": lesson.model.key(),
                    "hook": lesson.hook,
                    "predict_question": lesson.predict.question,
                    "twist_question": lesson.twist_predict.question,
                    "quiz_questions": lesson.quiz.len(),
                    "applications": lesson.applications.len(),
                });
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output).unwrap_or_default()
                );
                return Ok(());
            }

            println!("{} ({})", lesson.title, lesson.id);
            println!("{}", "=".repeat(lesson.title.len() + lesson.id.as_str().len() + 3));
            println!();
            println!("Concept: {}", lesson.concept);
            println!("Model:   {}", lesson.model);
            println!();
            println!("Hook: {}", lesson.hook);
            println!();
            println!("Predict: {}", lesson.predict.question);
            for (i, choice) in lesson.predict.choices.iter().enumerate() {
                println!("  [{}] {}", i, choice);
            }
            println!();
            println!("Twist: {}", lesson.twist_predict.question);
            for (i, choice) in lesson.twist_predict.choices.iter().enumerate() {
                println!("  [{}] {}", i, choice);
            }
            println!();
            println!("Quiz ({} questions):", lesson.quiz.len());
            for (i, question) in lesson.quiz.questions().iter().enumerate() {
                println!("  {}. {}", i + 1, question.prompt);
            }
            println!();
            println!("Applications:");
            for application in &lesson.applications {
                println!("  - {}: {}", application.title, application.blurb);
            }
        }
        None => {
            let lessons = catalog::catalog()?;

            if json_mode {
                let output: Vec<_> = lessons
                    .iter()
                    .map(|l| {
                        serde_json::json!({
                            "id": l.id.as_str(),
                            "title": l.title,
                            "concept": l.concept,
                            "model": l.model.key(),
                        })
                    })
                    .collect();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output).unwrap_or_default()
                );
                return Ok(());
            }

            println!("LessonLab Catalog");
            println!("=================");
            println!();
            for lesson in &lessons {
                println!("{:<20} {} [{}]", lesson.id.as_str(), lesson.title, lesson.model);
            }
            println!();
            println!("{} lessons. Use `lessonlab lessons --lesson <id>` for detail.", lessons.len());
        }
    }

    Ok(())
}

// =============================================================================
// WALK COMMAND
// =============================================================================

/// Run a scripted walkthrough of one lesson from hook toward mastery.
///
/// The walk answers every prediction and quiz question correctly (or,
/// with `--fail-quiz`, every quiz question wrong) so the full stage
/// sequence and the mastery gate can be observed from the terminal.
pub fn cmd_walk(json_mode: bool, lesson: &str, fail_quiz: bool) -> Result<(), LessonError> {
    let descriptor = catalog::find(lesson)?;

    let title = descriptor.title.clone();
    let predict_correct = descriptor.predict.correct;
    let twist_correct = descriptor.twist_predict.correct;
    let quiz = descriptor.quiz.clone();
    let application_count = descriptor.applications.len();

    // Debounce off: a scripted walk is not a double-click
    let config = ControllerConfig {
        debounce_ms: 0,
        ..ControllerConfig::default()
    };
    let journal = Arc::new(EventJournal::in_memory());
    let sink = JournalSink::new(1, Arc::clone(&journal));
    let mut session = LessonSession::new(descriptor, config, None, Box::new(sink));

    let mut trail = vec![session.stage().key().to_string()];
    let step = |session: &mut LessonSession, trail: &mut Vec<String>| -> Result<(), LessonError> {
        let from = session.stage();
        session.advance()?;
        let to = session.stage();
        trail.push(to.key().to_string());
        if !json_mode {
            println!("  {} -> {}", from.key(), to.key());
        }
        Ok(())
    };

    if !json_mode {
        println!("Walking \"{}\"", title);
        println!();
    }

    // hook -> predict
    step(&mut session, &mut trail)?;

    // predict: commit before the gate lets us leave
    let correct = session.predict(predict_correct)?;
    if !json_mode {
        println!("  predicted choice {} ({})", predict_correct.value(), if correct { "correct" } else { "incorrect" });
    }
    step(&mut session, &mut trail)?;

    // play -> review -> twist_predict
    session.set_slider("main", 0.5)?;
    step(&mut session, &mut trail)?;
    step(&mut session, &mut trail)?;

    // twist_predict
    let correct = session.predict(twist_correct)?;
    if !json_mode {
        println!("  predicted choice {} ({})", twist_correct.value(), if correct { "correct" } else { "incorrect" });
    }
    step(&mut session, &mut trail)?;

    // twist_play -> twist_review -> transfer
    step(&mut session, &mut trail)?;
    step(&mut session, &mut trail)?;

    // transfer: view every application
    for index in 0..application_count {
        session.view_application(index as u8)?;
    }
    if !json_mode {
        println!("  viewed {} applications", application_count);
    }
    step(&mut session, &mut trail)?;

    // test: answer every question, then submit
    for (index, question) in quiz.questions().iter().enumerate() {
        let choice = if fail_quiz {
            lessonlab_core::ChoiceIndex::new(
                (question.correct.value() + 1) % question.choices.len() as u8,
            )
        } else {
            question.correct
        };
        session.answer(index, choice)?;
    }
    let outcome = session.submit_quiz()?;
    if !json_mode {
        println!(
            "  quiz: {}/{} ({}%) - {}",
            outcome.score,
            outcome.total,
            outcome.percent,
            if outcome.passed { "PASSED" } else { "FAILED" }
        );
    }

    // test -> mastery, unless the gate holds
    let mastered = match step(&mut session, &mut trail) {
        Ok(()) => true,
        Err(LessonError::GateBlocked { requirement, .. }) => {
            if !json_mode {
                println!("  mastery blocked: {}", requirement);
            }
            false
        }
        Err(e) => return Err(e),
    };

    let event_count = journal.len(1)?;

    if json_mode {
        let output = serde_json::json!({
            "lesson": lesson,
            "trail": trail,
            "quiz": {
                "score": outcome.score,
                "total": outcome.total,
                "percent": outcome.percent,
                "passed": outcome.passed,
            },
            "mastered": mastered,
            "events": event_count,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!();
    if mastered {
        println!("Reached mastery at stage {}", Stage::Mastery.key());
    } else {
        println!("Stopped at stage {}", session.stage().key());
    }
    println!("{} events journaled", event_count);

    Ok(())
}

// =============================================================================
// EVAL COMMAND
// =============================================================================

/// Evaluate a model request read from a JSON file.
pub fn cmd_eval(json_mode: bool, file: &Path) -> Result<(), LessonError> {
    // Validate file path for security (prevents path traversal)
    let validated_path = validate_file_path(file)?;
    validate_file_size(&validated_path, MAX_EVAL_FILE_SIZE)?;

    let contents = std::fs::read(&validated_path)
        .map_err(|e| LessonError::IoError(format!("Read file: {}", e)))?;

    let request: ModelRequest = serde_json::from_slice(&contents)
        .map_err(|e| LessonError::DeserializationError(format!("Parse request: {}", e)))?;

    let response = models::evaluate(&request)?;

    if !json_mode {
        println!("Model: {}", request.kind());
        println!();
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&response)
            .map_err(|e| LessonError::SerializationError(e.to_string()))?
    );

    Ok(())
}

// =============================================================================
// EVENTS COMMAND
// =============================================================================

/// Dump a session's event log from a persistent journal.
pub fn cmd_events(
    json_mode: bool,
    journal_path: Option<&Path>,
    session_id: u64,
) -> Result<(), LessonError> {
    let Some(path) = journal_path else {
        return Err(LessonError::IoError(
            "Events require a persistent journal. Pass --journal <path>.".to_string(),
        ));
    };

    let journal = EventJournal::open(path)?;
    let events = journal.read(session_id)?;

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&events)
                .map_err(|e| LessonError::SerializationError(e.to_string()))?
        );
        return Ok(());
    }

    println!("Session {} events ({} total)", session_id, events.len());
    println!("================================");
    for (index, event) in events.iter().enumerate() {
        println!(
            "{:>4}  {:>8}ms  {:<16} stage={}",
            index,
            event.timestamp_ms.value(),
            format!("{:?}", event.kind),
            event.stage.key()
        );
    }

    Ok(())
}
