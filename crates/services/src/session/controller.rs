use std::fmt;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use storage::repository::HistoryRepository;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use trivia_core::Clock;
use trivia_core::model::{
    AnswerOutcome, EndReason, GameMode, GameSettings, HistoryRecord, HistoryRecordId,
    SessionSnapshot, SessionStatus,
};

use super::state::SessionState;
use super::timer::{PeriodicTask, spawn_delayed};
use crate::error::SessionError;
use crate::source::QuestionSource;

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// What to do once the state lock is released.
enum Transition {
    Stay,
    Advance { epoch: u64 },
    AdvanceLater {
        epoch: u64,
        seq: u64,
        token: CancellationToken,
    },
    End(EndReason),
}

struct Inner {
    clock: Clock,
    settings: GameSettings,
    source: Arc<dyn QuestionSource>,
    history: Arc<dyn HistoryRepository>,
    state: Mutex<SessionState>,
    updates: watch::Sender<SessionSnapshot>,
}

/// Drives one trivia session: timer, answers, lives or score, and history.
///
/// Cheap to clone; clones share the same session. State changes are
/// published to [`subscribe`](Self::subscribe) receivers. The state lock is
/// never held across an `.await`, so a tick and an answer can interleave only
/// at question fetches, and the `locked` flag rejects answers during those.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

impl SessionController {
    #[must_use]
    pub fn new(
        clock: Clock,
        settings: GameSettings,
        source: Arc<dyn QuestionSource>,
        history: Arc<dyn HistoryRepository>,
    ) -> Self {
        let state = SessionState::new(&settings);
        let (updates, _) = watch::channel(state.snapshot(settings.mode()));
        Self {
            inner: Arc::new(Inner {
                clock,
                settings,
                source,
                history,
                state: Mutex::new(state),
                updates,
            }),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &GameSettings {
        &self.inner.settings
    }

    #[must_use]
    pub fn mode(&self) -> GameMode {
        self.inner.settings.mode()
    }

    /// Receive a snapshot after every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.updates.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.updates.borrow().clone()
    }

    #[must_use]
    pub fn is_timer_running(&self) -> bool {
        self.lock().timer_running()
    }

    /// Begin a fresh session: tear down any previous timer, restore defaults,
    /// load the first question, then start the one-second timer.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Provider` if the first question cannot be
    /// fetched. The timer stays stopped until [`retry`](Self::retry).
    pub async fn start(&self) -> Result<(), SessionError> {
        let epoch = {
            let mut state = self.lock();
            state.reset(&self.inner.settings);
            self.publish(&state);
            state.epoch
        };
        info!(mode = %self.mode(), "session started");

        self.load_question(epoch).await?;
        self.start_timer(epoch);
        Ok(())
    }

    /// Restore configured defaults and clear the current question.
    ///
    /// Stops the timer and drops any pending transition. Call
    /// [`start`](Self::start) to play again.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.reset(&self.inner.settings);
        self.publish(&state);
        debug!("session reset");
    }

    /// Fetch again after a provider failure and resume the timer.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Ended` once the session is over,
    /// `SessionError::Locked` while a fetch is still outstanding, or
    /// `SessionError::Provider` if the fetch fails again.
    pub async fn retry(&self) -> Result<(), SessionError> {
        let (epoch, has_question) = {
            let state = self.lock();
            if !state.status.is_active() {
                return Err(SessionError::Ended);
            }
            (state.epoch, state.current_question.is_some())
        };

        if !has_question {
            self.load_question(epoch).await?;
        }
        self.start_timer(epoch);
        Ok(())
    }

    /// One second of wall-clock time passed.
    ///
    /// No-op while no question is displayed or while an answer is resolving.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Ended` after the session is over, and
    /// propagates fetch or history failures from the resulting transition.
    pub async fn tick(&self) -> Result<(), SessionError> {
        let transition = {
            let mut state = self.lock();
            if !state.status.is_active() {
                return Err(SessionError::Ended);
            }
            if state.current_question.is_none() || state.locked {
                return Ok(());
            }

            state.time_remaining = state.time_remaining.saturating_sub(1);
            let transition = if state.time_remaining > 0 {
                Transition::Stay
            } else {
                state.locked = true;
                match self.mode() {
                    GameMode::Lives => Self::after_life_lost(&mut state),
                    GameMode::Score => Transition::End(EndReason::TimeExpired),
                }
            };
            self.publish(&state);
            transition
        };

        if !matches!(transition, Transition::Stay) {
            debug!("question timer expired");
        }
        self.apply(transition).await
    }

    /// Grade `selected` against the displayed question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Ended`, `SessionError::NoQuestion`, or
    /// `SessionError::Locked` without changing anything when the answer
    /// cannot be accepted. Fetch or history failures from the resulting
    /// transition are propagated after the answer has been applied.
    pub async fn submit_answer(&self, selected: &str) -> Result<AnswerOutcome, SessionError> {
        let (outcome, transition) = {
            let mut state = self.lock();
            if !state.status.is_active() {
                return Err(SessionError::Ended);
            }
            let Some(question) = state.current_question.as_ref() else {
                return Err(SessionError::NoQuestion);
            };
            if state.locked {
                return Err(SessionError::Locked);
            }

            let outcome = AnswerOutcome {
                selected: selected.to_string(),
                correct_answer: question.correct_answer().to_string(),
                correct: question.is_correct(selected),
            };
            state.locked = true;
            state.last_outcome = Some(outcome.clone());

            let transition = match (self.mode(), outcome.correct) {
                (GameMode::Lives, true) => Transition::Advance { epoch: state.epoch },
                (GameMode::Lives, false) => Self::after_life_lost(&mut state),
                (GameMode::Score, true) => {
                    state.add_points(self.inner.settings.reward_per_correct());
                    Transition::AdvanceLater {
                        epoch: state.epoch,
                        seq: state.question_seq,
                        token: state.scope.child_token(),
                    }
                }
                (GameMode::Score, false) => Transition::End(EndReason::WrongAnswer),
            };
            self.publish(&state);
            (outcome, transition)
        };

        debug!(correct = outcome.correct, "answer submitted");
        self.apply(transition).await?;
        Ok(outcome)
    }

    /// Reset the per-question timer and display a freshly fetched question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Ended` after the session is over,
    /// `SessionError::Locked` while another fetch is outstanding, or
    /// `SessionError::Provider` if the fetch fails.
    pub async fn next_question(&self) -> Result<(), SessionError> {
        let epoch = {
            let state = self.lock();
            if !state.status.is_active() {
                return Err(SessionError::Ended);
            }
            state.epoch
        };
        self.load_question(epoch).await
    }

    /// Stop the session. In score mode the final score is appended to history.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Ended` if the session already ended, or
    /// `SessionError::Storage` if the history record cannot be written (the
    /// session is still ended).
    pub async fn end(&self, reason: EndReason) -> Result<Option<HistoryRecordId>, SessionError> {
        let record = {
            let mut state = self.lock();
            if !state.status.is_active() {
                return Err(SessionError::Ended);
            }
            state.status = SessionStatus::Ended(reason);
            state.locked = true;
            state.cancel_scheduled();
            self.publish(&state);

            state
                .tally
                .score()
                .map(|score| HistoryRecord::new(score, self.inner.clock.now()))
        };
        info!(%reason, "session ended");

        let Some(record) = record else {
            return Ok(None);
        };
        let id = self
            .inner
            .history
            .append_record(&record)
            .await
            .inspect_err(|err| warn!(error = %err, "failed to persist history record"))?;
        debug!(%id, score = record.score(), "history record appended");
        Ok(Some(id))
    }

    fn after_life_lost(state: &mut SessionState) -> Transition {
        if state.lose_life() > 0 {
            Transition::Advance { epoch: state.epoch }
        } else {
            Transition::End(EndReason::LivesExhausted)
        }
    }

    async fn apply(&self, transition: Transition) -> Result<(), SessionError> {
        match transition {
            Transition::Stay => Ok(()),
            Transition::Advance { epoch } => self.load_question(epoch).await,
            Transition::AdvanceLater { epoch, seq, token } => {
                let weak = Arc::downgrade(&self.inner);
                let delay = self.inner.settings.answer_display_delay();
                spawn_delayed(token, delay, async move {
                    if let Some(controller) = Self::upgrade(&weak) {
                        controller.advance_if_current(epoch, seq).await;
                    }
                });
                Ok(())
            }
            Transition::End(reason) => self.end(reason).await.map(|_| ()),
        }
    }

    async fn advance_if_current(&self, epoch: u64, seq: u64) {
        let current = {
            let state = self.lock();
            state.status.is_active() && state.epoch == epoch && state.question_seq == seq
        };
        if !current {
            return;
        }
        if let Err(err) = self.load_question(epoch).await {
            warn!(error = %err, "delayed advance failed");
        }
    }

    /// Fetch and install the next question for `epoch`.
    ///
    /// Only one fetch runs at a time; a second request while one is
    /// outstanding is rejected with `SessionError::Locked`. A result that
    /// arrives after a reset or end is discarded.
    async fn load_question(&self, epoch: u64) -> Result<(), SessionError> {
        {
            let mut state = self.lock();
            if state.epoch != epoch || !state.status.is_active() {
                return Ok(());
            }
            if state.loading {
                return Err(SessionError::Locked);
            }
            state.begin_transition(self.inner.settings.question_time_secs());
            self.publish(&state);
        }

        let fetched = self.inner.source.fetch_question().await;

        let mut state = self.lock();
        if state.epoch != epoch {
            debug!("discarding question fetched for a stale session");
            return Ok(());
        }
        state.loading = false;
        if !state.status.is_active() {
            debug!("discarding question fetched after the session ended");
            return Ok(());
        }
        match fetched {
            Ok(question) => {
                debug_assert!(
                    question.is_well_formed(),
                    "question source returned a malformed question"
                );
                state.current_question = Some(question);
                state.locked = false;
                state.last_error = None;
                state.question_seq += 1;
                self.publish(&state);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "question fetch failed; timer halted");
                state.stop_timer();
                state.last_error = Some(err.to_string());
                self.publish(&state);
                Err(err.into())
            }
        }
    }

    fn start_timer(&self, epoch: u64) {
        let mut state = self.lock();
        if state.epoch != epoch || !state.status.is_active() || state.timer_running() {
            return;
        }

        let weak = Arc::downgrade(&self.inner);
        let timer = PeriodicTask::spawn(&state.scope, TICK_PERIOD, move || {
            let weak = weak.clone();
            async move {
                let Some(controller) = Self::upgrade(&weak) else {
                    return ControlFlow::Break(());
                };
                match controller.tick().await {
                    Err(SessionError::Ended) => ControlFlow::Break(()),
                    Err(err) => {
                        warn!(error = %err, "timer tick failed");
                        ControlFlow::Continue(())
                    }
                    Ok(()) => ControlFlow::Continue(()),
                }
            }
        });
        state.timer = Some(timer);
    }

    fn upgrade(weak: &Weak<Inner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &SessionState) {
        self.inner
            .updates
            .send_replace(state.snapshot(self.inner.settings.mode()));
    }
}

impl fmt::Debug for SessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("SessionController")
            .field("mode", &self.mode())
            .field("status", &state.status)
            .field("tally", &state.tally)
            .field("time_remaining", &state.time_remaining)
            .field("locked", &state.locked)
            .field("epoch", &state.epoch)
            .finish_non_exhaustive()
    }
}
