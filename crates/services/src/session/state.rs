use tokio_util::sync::CancellationToken;
use trivia_core::model::{
    AnswerOutcome, GameMode, GameSettings, Question, SessionSnapshot, SessionStatus, Tally,
};

use super::timer::PeriodicTask;

/// Mutable session state. Only `SessionController` touches it.
#[derive(Debug)]
pub(crate) struct SessionState {
    pub(crate) status: SessionStatus,
    pub(crate) tally: Tally,
    pub(crate) time_remaining: u32,
    pub(crate) current_question: Option<Question>,
    pub(crate) locked: bool,
    pub(crate) last_outcome: Option<AnswerOutcome>,
    pub(crate) last_error: Option<String>,
    /// A question fetch is outstanding for this epoch.
    pub(crate) loading: bool,
    /// Bumped on every start/reset; in-flight work from an older epoch is dropped.
    pub(crate) epoch: u64,
    /// Bumped whenever the displayed question changes.
    pub(crate) question_seq: u64,
    /// Parent of the timer and any pending delayed transition.
    pub(crate) scope: CancellationToken,
    pub(crate) timer: Option<PeriodicTask>,
}

impl SessionState {
    pub(crate) fn new(settings: &GameSettings) -> Self {
        Self {
            status: SessionStatus::Active,
            tally: Tally::initial(settings.mode(), settings.starting_lives()),
            time_remaining: settings.question_time_secs(),
            current_question: None,
            locked: false,
            last_outcome: None,
            last_error: None,
            loading: false,
            epoch: 0,
            question_seq: 0,
            scope: CancellationToken::new(),
            timer: None,
        }
    }

    /// Tear down scheduled work and restore configured defaults.
    pub(crate) fn reset(&mut self, settings: &GameSettings) {
        self.cancel_scheduled();
        let epoch = self.epoch + 1;
        *self = Self::new(settings);
        self.epoch = epoch;
    }

    pub(crate) fn cancel_scheduled(&mut self) {
        self.stop_timer();
        self.scope.cancel();
    }

    pub(crate) fn stop_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }

    pub(crate) fn timer_running(&self) -> bool {
        self.timer.as_ref().is_some_and(PeriodicTask::is_running)
    }

    /// Remove one life and return how many are left.
    pub(crate) fn lose_life(&mut self) -> u32 {
        match &mut self.tally {
            Tally::Lives(lives) => {
                *lives = lives.saturating_sub(1);
                *lives
            }
            Tally::Score(_) => 0,
        }
    }

    pub(crate) fn add_points(&mut self, points: u32) {
        if let Tally::Score(score) = &mut self.tally {
            *score = score.saturating_add(points);
        }
    }

    /// Clear the displayed question while the next one is fetched.
    pub(crate) fn begin_transition(&mut self, question_time_secs: u32) {
        self.time_remaining = question_time_secs;
        self.current_question = None;
        self.locked = true;
        self.loading = true;
        self.question_seq += 1;
    }

    pub(crate) fn snapshot(&self, mode: GameMode) -> SessionSnapshot {
        SessionSnapshot {
            mode,
            status: self.status,
            tally: self.tally,
            time_remaining: self.time_remaining,
            current_question: self.current_question.clone(),
            locked: self.locked,
            last_outcome: self.last_outcome.clone(),
            last_error: self.last_error.clone(),
        }
    }
}
