//! # Lesson Session
//!
//! One learner working one lesson family: the phase controller plus the
//! per-widget ephemeral state (slider positions, committed predictions,
//! quiz answers, viewed transfer applications) and the pedagogical gates
//! the controller deliberately does not know about.
//!
//! Gates live here because they need lesson state:
//! - leaving `predict` / `twist_predict` forward requires a committed
//!   prediction
//! - entering `mastery` requires a passed quiz
//!
//! Backward navigation is never gated. A session is created when the
//! widget mounts and discarded when it unmounts; [`crate::formats`]
//! snapshots bridge the gap for hosts that resume.

use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::LessonDescriptor;
use crate::controller::{Clock, ControllerConfig, PhaseController, TransitionOutcome};
use crate::event::{EventKind, EventPayload, EventSink, LessonEvent};
use crate::formats::snapshot::SessionSnapshot;
use crate::primitives::{MAX_SLIDER_NAME_LENGTH, MAX_SLIDERS};
use crate::quiz::{QuizOutcome, QuizState};
use crate::stage::Stage;
use crate::types::{ChoiceIndex, LessonError};

// =============================================================================
// SESSION
// =============================================================================

/// A live lesson session.
pub struct LessonSession {
    descriptor: LessonDescriptor,
    controller: PhaseController,
    sink: Box<dyn EventSink>,
    sliders: BTreeMap<String, f64>,
    prediction: Option<ChoiceIndex>,
    twist_prediction: Option<ChoiceIndex>,
    quiz_state: QuizState,
    quiz_outcome: Option<QuizOutcome>,
    viewed_applications: BTreeSet<u8>,
}

impl std::fmt::Debug for LessonSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LessonSession")
            .field("lesson", &self.descriptor.id)
            .field("stage", &self.controller.current())
            .field("prediction", &self.prediction)
            .field("twist_prediction", &self.twist_prediction)
            .field("quiz_outcome", &self.quiz_outcome)
            .finish_non_exhaustive()
    }
}

impl LessonSession {
    /// Start a session at the resolved resume stage.
    #[must_use]
    pub fn new(
        descriptor: LessonDescriptor,
        config: ControllerConfig,
        resume_hint: Option<&str>,
        sink: Box<dyn EventSink>,
    ) -> Self {
        Self {
            descriptor,
            controller: PhaseController::new(config, resume_hint),
            sink,
            sliders: BTreeMap::new(),
            prediction: None,
            twist_prediction: None,
            quiz_state: QuizState::new(),
            quiz_outcome: None,
            viewed_applications: BTreeSet::new(),
        }
    }

    /// Start a session with an injected clock.
    #[must_use]
    pub fn with_clock(
        descriptor: LessonDescriptor,
        config: ControllerConfig,
        resume_hint: Option<&str>,
        sink: Box<dyn EventSink>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            descriptor,
            controller: PhaseController::with_clock(config, resume_hint, clock),
            sink,
            sliders: BTreeMap::new(),
            prediction: None,
            twist_prediction: None,
            quiz_state: QuizState::new(),
            quiz_outcome: None,
            viewed_applications: BTreeSet::new(),
        }
    }

    // -------------------------------------------------------------------------
    // ACCESSORS
    // -------------------------------------------------------------------------

    /// The lesson this session is working.
    #[must_use]
    pub fn descriptor(&self) -> &LessonDescriptor {
        &self.descriptor
    }

    /// The current stage.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.controller.current()
    }

    /// The underlying controller (read-only).
    #[must_use]
    pub fn controller(&self) -> &PhaseController {
        &self.controller
    }

    /// Current slider positions.
    #[must_use]
    pub fn sliders(&self) -> &BTreeMap<String, f64> {
        &self.sliders
    }

    /// The committed prediction for a prompt stage, if any.
    #[must_use]
    pub fn prediction_for(&self, stage: Stage) -> Option<ChoiceIndex> {
        match stage {
            Stage::Predict => self.prediction,
            Stage::TwistPredict => self.twist_prediction,
            _ => None,
        }
    }

    /// The recorded quiz attempt.
    #[must_use]
    pub fn quiz_state(&self) -> &QuizState {
        &self.quiz_state
    }

    /// The scored quiz outcome, once submitted.
    #[must_use]
    pub fn quiz_outcome(&self) -> Option<QuizOutcome> {
        self.quiz_outcome
    }

    /// Indices of transfer applications viewed so far.
    #[must_use]
    pub fn viewed_applications(&self) -> &BTreeSet<u8> {
        &self.viewed_applications
    }

    // -------------------------------------------------------------------------
    // NAVIGATION
    // -------------------------------------------------------------------------

    /// Advance to the next stage, subject to pedagogical gates.
    ///
    /// Gates apply only to a transition the controller would actually
    /// commit: a request the guard chain drops (debounce, reentrancy)
    /// reports its drop outcome instead of a gate error.
    pub fn advance(&mut self) -> Result<TransitionOutcome, LessonError> {
        if self.controller.check_go_next() == TransitionOutcome::Committed {
            let current = self.controller.current();
            if let Some(target) = current.next() {
                self.check_gate(current, target)?;
            }
        }
        let outcome = self.controller.go_next(self.sink.as_mut());
        self.after_commit(outcome);
        Ok(outcome)
    }

    /// Step back one stage. Never gated.
    pub fn back(&mut self) -> TransitionOutcome {
        self.controller.go_back(self.sink.as_mut())
    }

    /// Jump directly to a stage.
    ///
    /// Deliberate navigation skips the prediction gates (the learner can
    /// always revisit), but mastery stays locked behind a passed quiz.
    pub fn jump(&mut self, target: Stage) -> Result<TransitionOutcome, LessonError> {
        if target == Stage::Mastery
            && self.controller.check_go_to(target) == TransitionOutcome::Committed
        {
            self.check_mastery_gate()?;
        }
        let outcome = self.controller.go_to(target, self.sink.as_mut());
        self.after_commit(outcome);
        Ok(outcome)
    }

    /// Host re-synchronization to a saved stage. Bypasses gates: the host
    /// is the authority on its own saved state.
    pub fn sync(&mut self, target: Stage) -> TransitionOutcome {
        self.controller.sync_external(target, self.sink.as_mut())
    }

    fn check_gate(&self, current: Stage, target: Stage) -> Result<(), LessonError> {
        match current {
            Stage::Predict if self.prediction.is_none() => Err(LessonError::GateBlocked {
                stage: current,
                requirement: "a prediction must be committed first",
            }),
            Stage::TwistPredict if self.twist_prediction.is_none() => {
                Err(LessonError::GateBlocked {
                    stage: current,
                    requirement: "a prediction must be committed first",
                })
            }
            _ if target == Stage::Mastery => self.check_mastery_gate(),
            _ => Ok(()),
        }
    }

    fn check_mastery_gate(&self) -> Result<(), LessonError> {
        match self.quiz_outcome {
            Some(outcome) if outcome.passed => Ok(()),
            _ => Err(LessonError::GateBlocked {
                stage: self.controller.current(),
                requirement: "the knowledge test must be passed first",
            }),
        }
    }

    /// Post-commit hook: reaching mastery completes the lesson.
    fn after_commit(&mut self, outcome: TransitionOutcome) {
        if outcome.is_committed() && self.controller.current() == Stage::Mastery {
            let payload = match self.quiz_outcome {
                Some(result) => EventPayload::Quiz(result),
                None => EventPayload::Empty,
            };
            self.sink.emit(&LessonEvent::new(
                EventKind::LessonCompleted,
                Stage::Mastery,
                payload,
                self.controller.now_ms(),
            ));
        }
    }

    // -------------------------------------------------------------------------
    // IN-STAGE INTERACTIONS
    // -------------------------------------------------------------------------

    /// Record a slider position for the play labs.
    ///
    /// Sliders are untyped `name -> value` pairs; the host maps them onto
    /// model parameters. Values must be finite, names bounded.
    pub fn set_slider(&mut self, name: &str, value: f64) -> Result<(), LessonError> {
        if name.is_empty() || name.len() > MAX_SLIDER_NAME_LENGTH {
            return Err(LessonError::LimitExceeded("slider name length"));
        }
        if !value.is_finite() {
            return Err(LessonError::InvalidParameter {
                name: "slider",
                reason: "value must be finite",
            });
        }
        if !self.sliders.contains_key(name) && self.sliders.len() >= MAX_SLIDERS {
            return Err(LessonError::LimitExceeded("slider count"));
        }
        self.sliders.insert(name.to_string(), value);
        Ok(())
    }

    /// Commit a prediction in the current prompt stage.
    ///
    /// Valid only in `predict` and `twist_predict`; each prompt accepts
    /// exactly one commitment per session. Returns whether the choice is
    /// the one the review stage vindicates, and emits `prediction_made`.
    pub fn predict(&mut self, choice: ChoiceIndex) -> Result<bool, LessonError> {
        let stage = self.controller.current();
        let prompt = self
            .descriptor
            .prompt_for(stage)
            .ok_or(LessonError::WrongStage(stage))?;
        let slot = match stage {
            Stage::Predict => &mut self.prediction,
            Stage::TwistPredict => &mut self.twist_prediction,
            _ => return Err(LessonError::WrongStage(stage)),
        };
        if slot.is_some() {
            return Err(LessonError::LimitExceeded("prediction already committed"));
        }

        let correct = prompt.validate_choice(choice)?;
        *slot = Some(choice);
        self.sink.emit(&LessonEvent::new(
            EventKind::PredictionMade,
            stage,
            EventPayload::Prediction {
                prompt: stage,
                choice,
                correct,
            },
            self.controller.now_ms(),
        ));
        Ok(correct)
    }

    /// Record (or replace) a quiz answer. Valid only in the test stage.
    pub fn answer(&mut self, question: usize, choice: ChoiceIndex) -> Result<bool, LessonError> {
        let stage = self.controller.current();
        if stage != Stage::Test {
            return Err(LessonError::WrongStage(stage));
        }

        let correct = self
            .quiz_state
            .record(&self.descriptor.quiz, question, choice)?;
        self.sink.emit(&LessonEvent::new(
            EventKind::AnswerSubmitted,
            stage,
            EventPayload::Answer {
                question,
                choice,
                correct,
            },
            self.controller.now_ms(),
        ));
        Ok(correct)
    }

    /// Score the quiz attempt. Valid only in the test stage; unanswered
    /// questions count as incorrect.
    pub fn submit_quiz(&mut self) -> Result<QuizOutcome, LessonError> {
        let stage = self.controller.current();
        if stage != Stage::Test {
            return Err(LessonError::WrongStage(stage));
        }

        let outcome = self.quiz_state.submit(&self.descriptor.quiz)?;
        self.quiz_outcome = Some(outcome);
        self.sink.emit(&LessonEvent::new(
            EventKind::QuizCompleted,
            stage,
            EventPayload::Quiz(outcome),
            self.controller.now_ms(),
        ));
        Ok(outcome)
    }

    /// Mark a transfer application viewed. Valid only in the transfer
    /// stage; re-viewing is quiet (no duplicate event).
    pub fn view_application(&mut self, index: u8) -> Result<(), LessonError> {
        let stage = self.controller.current();
        if stage != Stage::Transfer {
            return Err(LessonError::WrongStage(stage));
        }
        if usize::from(index) >= self.descriptor.applications.len() {
            return Err(LessonError::ChoiceOutOfRange {
                context: "application",
                choice: index,
                len: self.descriptor.applications.len(),
            });
        }
        if self.viewed_applications.insert(index) {
            self.sink.emit(&LessonEvent::new(
                EventKind::ApplicationViewed,
                stage,
                EventPayload::Application { index },
                self.controller.now_ms(),
            ));
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // SNAPSHOT
    // -------------------------------------------------------------------------

    /// Capture the resumable state of this session.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            lesson_id: self.descriptor.id.clone(),
            stage: self.controller.current(),
            visited: self.controller.visited().clone(),
            config: self.controller.config(),
            sliders: self.sliders.clone(),
            prediction: self.prediction,
            twist_prediction: self.twist_prediction,
            quiz_state: self.quiz_state.clone(),
            quiz_outcome: self.quiz_outcome,
            viewed_applications: self.viewed_applications.clone(),
        }
    }

    /// Rebuild a session from a snapshot.
    ///
    /// The snapshot must belong to the given descriptor's lesson, and its
    /// recorded state must fit the lesson (answer indices in range). The
    /// debounce window restarts empty.
    pub fn restore(
        descriptor: LessonDescriptor,
        snapshot: SessionSnapshot,
        sink: Box<dyn EventSink>,
        clock: Box<dyn Clock>,
    ) -> Result<Self, LessonError> {
        if snapshot.lesson_id != descriptor.id {
            return Err(LessonError::UnknownLesson(snapshot.lesson_id.0));
        }
        for (question, choice) in &snapshot.quiz_state.answers {
            let q = descriptor.quiz.question(*question)?;
            if usize::from(choice.value()) >= q.choices.len() {
                return Err(LessonError::ChoiceOutOfRange {
                    context: "answer",
                    choice: choice.value(),
                    len: q.choices.len(),
                });
            }
        }
        if snapshot.sliders.len() > MAX_SLIDERS {
            return Err(LessonError::LimitExceeded("slider count"));
        }

        let controller = PhaseController::from_parts(
            snapshot.config,
            snapshot.stage,
            snapshot.visited,
            clock,
        );
        Ok(Self {
            descriptor,
            controller,
            sink,
            sliders: snapshot.sliders,
            prediction: snapshot.prediction,
            twist_prediction: snapshot.twist_prediction,
            quiz_state: snapshot.quiz_state,
            quiz_outcome: snapshot.quiz_outcome,
            viewed_applications: snapshot.viewed_applications,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
