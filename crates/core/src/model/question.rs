use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shuffle::fisher_yates;

/// Number of answer options every multiple-choice question carries.
pub const ANSWER_COUNT: usize = 4;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("expected {expected} answers, found {found}")]
    WrongAnswerCount { expected: usize, found: usize },

    #[error("correct answer is not among the answers")]
    CorrectAnswerMissing,

    #[error("correct answer appears {count} times")]
    CorrectAnswerDuplicated { count: usize },
}

/// A normalized multiple-choice question.
///
/// Invariant: `answers` has exactly [`ANSWER_COUNT`] entries and contains
/// `correct_answer` exactly once. The order is fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    text: String,
    correct_answer: String,
    answers: Vec<String>,
}

impl Question {
    /// Build a question from an already ordered answer list.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the text is blank, the answer count is wrong,
    /// or the correct answer is missing or repeated.
    pub fn new(
        text: impl Into<String>,
        correct_answer: impl Into<String>,
        answers: Vec<String>,
    ) -> Result<Self, QuestionError> {
        let text = text.into();
        let correct_answer = correct_answer.into();

        if text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if answers.len() != ANSWER_COUNT {
            return Err(QuestionError::WrongAnswerCount {
                expected: ANSWER_COUNT,
                found: answers.len(),
            });
        }
        match answers.iter().filter(|a| **a == correct_answer).count() {
            0 => return Err(QuestionError::CorrectAnswerMissing),
            1 => {}
            count => return Err(QuestionError::CorrectAnswerDuplicated { count }),
        }

        Ok(Self {
            text,
            correct_answer,
            answers,
        })
    }

    /// Build a question from one correct and several incorrect answers.
    ///
    /// Incorrect answers are de-duplicated (keeping first occurrence) before
    /// the correct answer is appended, then the whole sequence is shuffled.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the resulting answer set violates the
    /// question invariant (e.g. too few distinct incorrect answers).
    pub fn shuffled<R: Rng + ?Sized>(
        text: impl Into<String>,
        correct_answer: impl Into<String>,
        incorrect_answers: impl IntoIterator<Item = String>,
        rng: &mut R,
    ) -> Result<Self, QuestionError> {
        let correct_answer = correct_answer.into();

        let mut answers: Vec<String> = Vec::with_capacity(ANSWER_COUNT);
        for answer in incorrect_answers {
            if !answers.contains(&answer) {
                answers.push(answer);
            }
        }
        answers.push(correct_answer.clone());
        fisher_yates(&mut answers, rng);

        Self::new(text, correct_answer, answers)
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    /// Position of the correct answer within `answers`.
    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.answers
            .iter()
            .position(|a| *a == self.correct_answer)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_correct(&self, selected: &str) -> bool {
        self.correct_answer == selected
    }

    /// Re-check the invariant on an existing value.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.answers.len() == ANSWER_COUNT
            && self
                .answers
                .iter()
                .filter(|a| **a == self.correct_answer)
                .count()
                == 1
    }
}
