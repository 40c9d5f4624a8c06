//! # Quiz Scoring
//!
//! Fixed-choice questions for the test stage, answer recording, and the
//! pass/fail outcome that gates mastery.
//!
//! Scoring is pure integer arithmetic over recorded answers; there is no
//! partial credit and no re-grading. Re-answering a question before
//! submission replaces the recorded choice.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::primitives::{MASTERY_THRESHOLD_PERCENT, MAX_CHOICES, MAX_QUIZ_QUESTIONS};
use crate::types::{ChoiceIndex, LessonError};

// =============================================================================
// QUESTIONS
// =============================================================================

/// One fixed-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Question text shown to the learner.
    pub prompt: String,
    /// Answer choices, in display order.
    pub choices: Vec<String>,
    /// Index of the correct choice.
    pub correct: ChoiceIndex,
    /// Explanation revealed after answering.
    pub explanation: String,
}

impl Question {
    /// Create a question, validating choice count and correct index.
    pub fn new(
        prompt: impl Into<String>,
        choices: Vec<String>,
        correct: u8,
        explanation: impl Into<String>,
    ) -> Result<Self, LessonError> {
        if choices.is_empty() || choices.len() > MAX_CHOICES {
            return Err(LessonError::LimitExceeded("question choices"));
        }
        if usize::from(correct) >= choices.len() {
            return Err(LessonError::ChoiceOutOfRange {
                context: "question",
                choice: correct,
                len: choices.len(),
            });
        }
        Ok(Self {
            prompt: prompt.into(),
            choices,
            correct: ChoiceIndex::new(correct),
            explanation: explanation.into(),
        })
    }

    /// Whether a choice is the correct one.
    #[must_use]
    pub fn is_correct(&self, choice: ChoiceIndex) -> bool {
        self.correct == choice
    }
}

/// The scored knowledge test for one lesson family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    questions: Vec<Question>,
}

impl Quiz {
    /// Create a quiz from its questions.
    pub fn new(questions: Vec<Question>) -> Result<Self, LessonError> {
        if questions.is_empty() || questions.len() > MAX_QUIZ_QUESTIONS {
            return Err(LessonError::LimitExceeded("quiz questions"));
        }
        Ok(Self { questions })
    }

    /// The questions, in display order.
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Number of questions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// A quiz is never empty by construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Look up a question by index.
    pub fn question(&self, index: usize) -> Result<&Question, LessonError> {
        self.questions
            .get(index)
            .ok_or(LessonError::QuestionOutOfRange(index))
    }
}

// =============================================================================
// ANSWER STATE & OUTCOME
// =============================================================================

/// Recorded answers for one quiz attempt.
///
/// Part of the per-widget ephemeral state: reset when the session resets,
/// serialized only through the session snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct QuizState {
    /// Question index -> chosen answer.
    pub answers: BTreeMap<usize, ChoiceIndex>,
    /// Whether the attempt has been submitted and scored.
    pub submitted: bool,
}

impl QuizState {
    /// Create an empty attempt.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or replace) an answer. Rejected after submission.
    pub fn record(
        &mut self,
        quiz: &Quiz,
        question: usize,
        choice: ChoiceIndex,
    ) -> Result<bool, LessonError> {
        if self.submitted {
            return Err(LessonError::LimitExceeded("quiz already submitted"));
        }
        let q = quiz.question(question)?;
        if usize::from(choice.value()) >= q.choices.len() {
            return Err(LessonError::ChoiceOutOfRange {
                context: "answer",
                choice: choice.value(),
                len: q.choices.len(),
            });
        }
        self.answers.insert(question, choice);
        Ok(q.is_correct(choice))
    }

    /// Whether every question has a recorded answer.
    #[must_use]
    pub fn is_complete(&self, quiz: &Quiz) -> bool {
        (0..quiz.len()).all(|i| self.answers.contains_key(&i))
    }

    /// Score the attempt and mark it submitted.
    ///
    /// Unanswered questions count as incorrect; widgets are allowed to
    /// submit a partial test.
    pub fn submit(&mut self, quiz: &Quiz) -> Result<QuizOutcome, LessonError> {
        if self.submitted {
            return Err(LessonError::LimitExceeded("quiz already submitted"));
        }
        self.submitted = true;

        let score = self
            .answers
            .iter()
            .filter(|(question, choice)| {
                quiz.questions
                    .get(**question)
                    .is_some_and(|q| q.is_correct(**choice))
            })
            .count();

        Ok(QuizOutcome::from_score(score, quiz.len()))
    }
}

/// The scored result of a quiz attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOutcome {
    /// Questions answered correctly.
    pub score: usize,
    /// Total questions.
    pub total: usize,
    /// Integer percent correct.
    pub percent: u8,
    /// Whether the attempt clears the mastery threshold.
    pub passed: bool,
}

impl QuizOutcome {
    /// Compute an outcome from a raw score.
    #[must_use]
    pub fn from_score(score: usize, total: usize) -> Self {
        let percent = if total > 0 {
            ((score.min(total) as u64).saturating_mul(100) / (total as u64)) as u8
        } else {
            0
        };
        Self {
            score: score.min(total),
            total,
            percent,
            passed: percent >= MASTERY_THRESHOLD_PERCENT,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
