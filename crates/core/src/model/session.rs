use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{GameMode, Question};

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    LivesExhausted,
    TimeExpired,
    WrongAnswer,
    Abandoned,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EndReason::LivesExhausted => "out of lives",
            EndReason::TimeExpired => "time expired",
            EndReason::WrongAnswer => "wrong answer",
            EndReason::Abandoned => "abandoned",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Ended(EndReason),
}

impl SessionStatus {
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, SessionStatus::Active)
    }

    #[must_use]
    pub fn end_reason(self) -> Option<EndReason> {
        match self {
            SessionStatus::Active => None,
            SessionStatus::Ended(reason) => Some(reason),
        }
    }
}

/// Lives (lives mode) or points (score mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Tally {
    Lives(u32),
    Score(u32),
}

impl Tally {
    #[must_use]
    pub fn initial(mode: GameMode, starting_lives: u32) -> Self {
        match mode {
            GameMode::Lives => Tally::Lives(starting_lives),
            GameMode::Score => Tally::Score(0),
        }
    }

    #[must_use]
    pub fn lives(self) -> Option<u32> {
        match self {
            Tally::Lives(n) => Some(n),
            Tally::Score(_) => None,
        }
    }

    #[must_use]
    pub fn score(self) -> Option<u32> {
        match self {
            Tally::Score(n) => Some(n),
            Tally::Lives(_) => None,
        }
    }
}

/// Result of grading one submitted answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOutcome {
    pub selected: String,
    pub correct_answer: String,
    pub correct: bool,
}

/// Read-only view of the session, published on every state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub mode: GameMode,
    pub status: SessionStatus,
    pub tally: Tally,
    pub time_remaining: u32,
    pub current_question: Option<Question>,
    /// True while an answer is resolved and the next question is pending.
    pub locked: bool,
    pub last_outcome: Option<AnswerOutcome>,
    pub last_error: Option<String>,
}

impl SessionSnapshot {
    #[must_use]
    pub fn is_ended(&self) -> bool {
        !self.status.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_tally_follows_mode() {
        assert_eq!(Tally::initial(GameMode::Lives, 3), Tally::Lives(3));
        assert_eq!(Tally::initial(GameMode::Score, 3), Tally::Score(0));
        assert_eq!(Tally::Lives(2).lives(), Some(2));
        assert_eq!(Tally::Lives(2).score(), None);
    }

    #[test]
    fn status_reports_reason() {
        assert!(SessionStatus::Active.is_active());
        assert_eq!(
            SessionStatus::Ended(EndReason::TimeExpired).end_reason(),
            Some(EndReason::TimeExpired)
        );
        assert_eq!(EndReason::LivesExhausted.to_string(), "out of lives");
    }
}
