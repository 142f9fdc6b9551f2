use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use services::{Clock, ProviderError, QuestionSource, SessionController, SessionError};
use storage::repository::{HistoryRepository, InMemoryRepository};
use trivia_core::model::{
    EndReason, GameMode, GameSettingsDraft, Question, SessionStatus, Tally,
};
use trivia_core::time::{fixed_clock, fixed_now};

const RIGHT: &str = "right";
const WRONG: &str = "wrong 1";

#[derive(Default)]
struct ScriptedSource {
    served: AtomicUsize,
    failing: AtomicBool,
    delay_ms: AtomicU64,
}

impl ScriptedSource {
    fn served(&self) -> usize {
        self.served.load(Ordering::SeqCst)
    }

    fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn set_delay(&self, delay: Duration) {
        let ms = u64::try_from(delay.as_millis()).unwrap();
        self.delay_ms.store(ms, Ordering::SeqCst);
    }
}

#[async_trait]
impl QuestionSource for ScriptedSource {
    async fn fetch_question(&self) -> Result<Question, ProviderError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ProviderError::EmptyBatch);
        }
        let n = self.served.fetch_add(1, Ordering::SeqCst) + 1;
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        Ok(Question::new(
            format!("Question {n}"),
            RIGHT,
            vec![
                "wrong 1".into(),
                RIGHT.into(),
                "wrong 2".into(),
                "wrong 3".into(),
            ],
        )
        .unwrap())
    }
}

struct Harness {
    controller: SessionController,
    source: Arc<ScriptedSource>,
    history: InMemoryRepository,
}

fn harness(mode: GameMode, tweak: impl FnOnce(&mut GameSettingsDraft)) -> Harness {
    let mut draft = GameSettingsDraft {
        mode: Some(mode),
        ..GameSettingsDraft::default()
    };
    tweak(&mut draft);
    let settings = draft.validate().unwrap();

    let source = Arc::new(ScriptedSource::default());
    let history = InMemoryRepository::new();
    let controller = SessionController::new(
        fixed_clock(),
        settings,
        source.clone(),
        Arc::new(history.clone()),
    );
    Harness {
        controller,
        source,
        history,
    }
}

async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

async fn advance_ms(ms: u64) {
    tokio::time::advance(Duration::from_millis(ms)).await;
    settle().await;
}

async fn advance_secs(secs: u64) {
    for _ in 0..secs {
        advance_ms(1_000).await;
    }
}

fn current_text(controller: &SessionController) -> Option<String> {
    controller
        .snapshot()
        .current_question
        .map(|q| q.text().to_string())
}

#[tokio::test(start_paused = true)]
async fn start_displays_first_question_with_defaults() {
    let h = harness(GameMode::Lives, |_| {});
    h.controller.start().await.unwrap();

    let snap = h.controller.snapshot();
    assert_eq!(snap.status, SessionStatus::Active);
    assert_eq!(snap.tally, Tally::Lives(3));
    assert_eq!(snap.time_remaining, 60);
    assert!(!snap.locked);
    assert_eq!(current_text(&h.controller).as_deref(), Some("Question 1"));
    assert!(h.controller.is_timer_running());
}

#[tokio::test(start_paused = true)]
async fn lives_mode_three_wrong_answers_end_the_session() {
    let h = harness(GameMode::Lives, |_| {});
    h.controller.start().await.unwrap();

    for expected_lives in [2, 1] {
        let outcome = h.controller.submit_answer(WRONG).await.unwrap();
        assert!(!outcome.correct);
        assert_eq!(outcome.correct_answer, RIGHT);
        assert_eq!(h.controller.snapshot().tally, Tally::Lives(expected_lives));
    }
    h.controller.submit_answer(WRONG).await.unwrap();

    let snap = h.controller.snapshot();
    assert_eq!(snap.status, SessionStatus::Ended(EndReason::LivesExhausted));
    assert_eq!(snap.tally, Tally::Lives(0));
    assert!(!h.controller.is_timer_running());
    assert!(h.history.list_records().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn lives_mode_two_wrong_and_one_correct_keeps_playing() {
    let h = harness(GameMode::Lives, |_| {});
    h.controller.start().await.unwrap();

    h.controller.submit_answer(WRONG).await.unwrap();
    h.controller.submit_answer(RIGHT).await.unwrap();
    h.controller.submit_answer(WRONG).await.unwrap();

    let snap = h.controller.snapshot();
    assert_eq!(snap.status, SessionStatus::Active);
    assert_eq!(snap.tally, Tally::Lives(1));
    assert_eq!(h.source.served(), 4);
    assert_eq!(current_text(&h.controller).as_deref(), Some("Question 4"));
}

#[tokio::test(start_paused = true)]
async fn score_mode_correct_answer_scores_and_advances_after_delay() {
    let h = harness(GameMode::Score, |_| {});
    h.controller.start().await.unwrap();

    let outcome = h.controller.submit_answer(RIGHT).await.unwrap();
    assert!(outcome.correct);
    let snap = h.controller.snapshot();
    assert_eq!(snap.tally, Tally::Score(10));
    assert!(snap.locked);
    assert_eq!(current_text(&h.controller).as_deref(), Some("Question 1"));

    advance_ms(999).await;
    assert_eq!(current_text(&h.controller).as_deref(), Some("Question 1"));
    assert_eq!(h.source.served(), 1);

    advance_ms(1).await;
    assert_eq!(current_text(&h.controller).as_deref(), Some("Question 2"));
    let snap = h.controller.snapshot();
    assert!(!snap.locked);
    assert_eq!(snap.tally, Tally::Score(10));
    assert!(snap.time_remaining >= 59);
}

#[tokio::test(start_paused = true)]
async fn score_mode_wrong_answer_ends_and_records_history_once() {
    let h = harness(GameMode::Score, |_| {});
    h.controller.start().await.unwrap();

    h.controller.submit_answer(RIGHT).await.unwrap();
    advance_secs(1).await;
    h.controller.submit_answer(RIGHT).await.unwrap();
    advance_secs(1).await;

    let outcome = h.controller.submit_answer(WRONG).await.unwrap();
    assert!(!outcome.correct);
    assert_eq!(
        h.controller.snapshot().status,
        SessionStatus::Ended(EndReason::WrongAnswer)
    );

    let err = h.controller.submit_answer(WRONG).await.unwrap_err();
    assert!(matches!(err, SessionError::Ended));

    let records = h.history.list_records().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].record.score(), 20);
    assert_eq!(records[0].record.recorded_at(), fixed_now());
}

#[tokio::test(start_paused = true)]
async fn resubmitting_before_the_delay_has_no_effect() {
    let h = harness(GameMode::Score, |_| {});
    h.controller.start().await.unwrap();

    h.controller.submit_answer(RIGHT).await.unwrap();
    let err = h.controller.submit_answer(RIGHT).await.unwrap_err();
    assert!(matches!(err, SessionError::Locked));
    let err = h.controller.submit_answer(WRONG).await.unwrap_err();
    assert!(matches!(err, SessionError::Locked));

    assert_eq!(h.controller.snapshot().tally, Tally::Score(10));
    assert_eq!(h.controller.snapshot().status, SessionStatus::Active);
    assert!(h.history.list_records().await.unwrap().is_empty());

    advance_secs(1).await;
    assert_eq!(h.source.served(), 2);
}

#[tokio::test(start_paused = true)]
async fn lives_mode_timeout_costs_a_life_and_resets_timer() {
    let h = harness(GameMode::Lives, |d| d.question_time_secs = Some(3));
    h.controller.start().await.unwrap();

    advance_secs(2).await;
    assert_eq!(h.controller.snapshot().time_remaining, 1);

    advance_secs(1).await;
    let snap = h.controller.snapshot();
    assert_eq!(snap.tally, Tally::Lives(2));
    assert_eq!(snap.status, SessionStatus::Active);
    assert_eq!(snap.time_remaining, 3);
    assert_eq!(current_text(&h.controller).as_deref(), Some("Question 2"));
}

#[tokio::test(start_paused = true)]
async fn lives_mode_timeout_with_last_life_ends_session() {
    let h = harness(GameMode::Lives, |d| {
        d.question_time_secs = Some(3);
        d.starting_lives = Some(1);
    });
    h.controller.start().await.unwrap();

    advance_secs(3).await;
    assert_eq!(
        h.controller.snapshot().status,
        SessionStatus::Ended(EndReason::LivesExhausted)
    );
    assert!(!h.controller.is_timer_running());
}

#[tokio::test(start_paused = true)]
async fn score_mode_timeout_ends_session_and_records_score() {
    let h = harness(GameMode::Score, |d| d.reduced_timer = true);
    h.controller.start().await.unwrap();
    assert_eq!(h.controller.snapshot().time_remaining, 10);

    advance_secs(10).await;
    let snap = h.controller.snapshot();
    assert_eq!(snap.status, SessionStatus::Ended(EndReason::TimeExpired));

    let records = h.history.list_records().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].record.score(), 0);

    advance_secs(3).await;
    assert_eq!(h.history.list_records().await.unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn operations_after_end_are_rejected() {
    let h = harness(GameMode::Lives, |_| {});
    h.controller.start().await.unwrap();
    h.controller.end(EndReason::Abandoned).await.unwrap();

    assert!(matches!(h.controller.tick().await, Err(SessionError::Ended)));
    assert!(matches!(
        h.controller.submit_answer(RIGHT).await,
        Err(SessionError::Ended)
    ));
    assert!(matches!(
        h.controller.next_question().await,
        Err(SessionError::Ended)
    ));
    assert!(matches!(
        h.controller.end(EndReason::Abandoned).await,
        Err(SessionError::Ended)
    ));
    assert_eq!(
        h.controller.snapshot().status,
        SessionStatus::Ended(EndReason::Abandoned)
    );
}

#[tokio::test(start_paused = true)]
async fn reset_restores_defaults_and_clears_question() {
    let h = harness(GameMode::Score, |_| {});
    h.controller.start().await.unwrap();
    h.controller.submit_answer(RIGHT).await.unwrap();
    advance_secs(3).await;

    h.controller.reset();
    let snap = h.controller.snapshot();
    assert_eq!(snap.status, SessionStatus::Active);
    assert_eq!(snap.tally, Tally::Score(0));
    assert_eq!(snap.time_remaining, 60);
    assert!(snap.current_question.is_none());
    assert!(snap.last_outcome.is_none());
    assert!(!h.controller.is_timer_running());

    advance_secs(2).await;
    assert_eq!(h.controller.snapshot().time_remaining, 60);
}

#[tokio::test(start_paused = true)]
async fn reset_drops_pending_delayed_advance() {
    let h = harness(GameMode::Score, |_| {});
    h.controller.start().await.unwrap();
    h.controller.submit_answer(RIGHT).await.unwrap();

    h.controller.reset();
    advance_secs(2).await;
    assert_eq!(h.source.served(), 1);
    assert!(h.controller.snapshot().current_question.is_none());
}

#[tokio::test(start_paused = true)]
async fn restarting_does_not_leave_two_timers_running() {
    let h = harness(GameMode::Lives, |_| {});
    h.controller.start().await.unwrap();
    h.controller.start().await.unwrap();

    advance_secs(1).await;
    assert_eq!(h.controller.snapshot().time_remaining, 59);
}

#[tokio::test(start_paused = true)]
async fn manual_tick_counts_down() {
    let h = harness(GameMode::Lives, |_| {});
    h.controller.start().await.unwrap();

    h.controller.tick().await.unwrap();
    h.controller.tick().await.unwrap();
    assert_eq!(h.controller.snapshot().time_remaining, 58);
}

#[tokio::test(start_paused = true)]
async fn provider_failure_halts_timer_until_retry() {
    let h = harness(GameMode::Lives, |_| {});
    h.source.set_failing(true);

    let err = h.controller.start().await.unwrap_err();
    assert!(matches!(err, SessionError::Provider(_)));
    let snap = h.controller.snapshot();
    assert!(snap.last_error.is_some());
    assert!(snap.current_question.is_none());
    assert_eq!(snap.status, SessionStatus::Active);
    assert!(!h.controller.is_timer_running());

    advance_secs(2).await;
    assert_eq!(h.controller.snapshot().time_remaining, 60);

    h.source.set_failing(false);
    h.controller.retry().await.unwrap();
    let snap = h.controller.snapshot();
    assert!(snap.last_error.is_none());
    assert_eq!(current_text(&h.controller).as_deref(), Some("Question 1"));
    assert!(h.controller.is_timer_running());
}

#[tokio::test(start_paused = true)]
async fn submit_without_question_is_rejected() {
    let h = harness(GameMode::Lives, |_| {});
    let err = h.controller.submit_answer(RIGHT).await.unwrap_err();
    assert!(matches!(err, SessionError::NoQuestion));
    assert!(err.is_invalid_state());
}

#[tokio::test(start_paused = true)]
async fn subscribers_see_state_changes() {
    let h = harness(GameMode::Score, |_| {});
    let mut rx = h.controller.subscribe();
    assert!(rx.borrow_and_update().current_question.is_none());

    h.controller.start().await.unwrap();
    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().current_question.is_some());

    h.controller.submit_answer(RIGHT).await.unwrap();
    let snap = rx.borrow_and_update().clone();
    assert_eq!(snap.tally, Tally::Score(10));
    assert_eq!(snap.last_outcome.map(|o| o.correct), Some(true));
}

#[tokio::test]
async fn controller_uses_injected_clock_for_history() {
    let at = fixed_now() + chrono::Duration::hours(1);
    let history = InMemoryRepository::new();
    let controller = SessionController::new(
        Clock::fixed(at),
        GameSettingsDraft {
            mode: Some(GameMode::Score),
            ..GameSettingsDraft::default()
        }
        .validate()
        .unwrap(),
        Arc::new(ScriptedSource::default()),
        Arc::new(history.clone()),
    );
    controller.start().await.unwrap();
    let id = controller.end(EndReason::Abandoned).await.unwrap().unwrap();
    assert_eq!(history.get_record(id).await.unwrap().recorded_at(), at);
}

#[tokio::test(start_paused = true)]
async fn second_load_while_fetching_is_rejected() {
    let h = harness(GameMode::Lives, |_| {});
    h.controller.start().await.unwrap();
    h.source.set_delay(Duration::from_secs(5));

    let (advance, retry, again) = tokio::join!(
        h.controller.next_question(),
        async {
            settle().await;
            h.controller.retry().await
        },
        async {
            settle().await;
            h.controller.next_question().await
        },
    );

    advance.unwrap();
    assert!(matches!(retry, Err(SessionError::Locked)));
    assert!(matches!(again, Err(SessionError::Locked)));
    assert_eq!(h.source.served(), 2);
    assert_eq!(current_text(&h.controller).as_deref(), Some("Question 2"));
    assert_eq!(h.controller.snapshot().tally, Tally::Lives(3));
    assert!(h.controller.is_timer_running());
}

#[tokio::test(start_paused = true)]
async fn retry_after_failed_advance_loads_once() {
    let h = harness(GameMode::Lives, |_| {});
    h.controller.start().await.unwrap();

    h.source.set_failing(true);
    assert!(h.controller.next_question().await.is_err());
    h.source.set_failing(false);

    h.controller.retry().await.unwrap();
    h.controller.retry().await.unwrap();
    assert_eq!(h.source.served(), 2);
    assert_eq!(current_text(&h.controller).as_deref(), Some("Question 2"));
}

#[tokio::test(start_paused = true)]
async fn score_mode_timer_restarts_for_each_question() {
    let h = harness(GameMode::Score, |d| d.question_time_secs = Some(5));
    h.controller.start().await.unwrap();

    advance_secs(3).await;
    assert_eq!(h.controller.snapshot().time_remaining, 2);

    h.controller.submit_answer(RIGHT).await.unwrap();
    advance_secs(1).await;
    assert_eq!(current_text(&h.controller).as_deref(), Some("Question 2"));
    assert!(h.controller.snapshot().time_remaining >= 4);

    advance_secs(5).await;
    assert_eq!(
        h.controller.snapshot().status,
        SessionStatus::Ended(EndReason::TimeExpired)
    );
    assert_eq!(h.history.list_records().await.unwrap()[0].record.score(), 10);
}
