use services::HistoryListItem;
use trivia_core::model::{AnswerOutcome, Question, SessionSnapshot, Tally};

const TIME_WARNINGS: [u32; 2] = [10, 5];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Answer(usize),
    Quit,
    Retry,
    Unknown,
}

pub fn parse_input(line: &str) -> Input {
    match line.trim() {
        "q" | "Q" | "quit" => Input::Quit,
        "r" | "R" | "retry" => Input::Retry,
        other => match other.parse::<usize>() {
            Ok(n) if (1..=4).contains(&n) => Input::Answer(n - 1),
            _ => Input::Unknown,
        },
    }
}

/// Turns successive snapshots into lines of terminal output.
///
/// Only changes are printed, so the one-second ticks stay quiet except for
/// the low-time warnings.
#[derive(Debug, Default)]
pub struct Screen {
    previous: Option<SessionSnapshot>,
}

impl Screen {
    pub fn update(&mut self, next: &SessionSnapshot) -> Vec<String> {
        let mut lines = Vec::new();
        let prev = self.previous.as_ref();

        if let Some(reason) = next.status.end_reason() {
            if prev.is_none_or(|p| !p.is_ended()) {
                lines.push(format!("Game over ({reason}). {}", tally_label(next.tally)));
            }
            self.previous = Some(next.clone());
            return lines;
        }

        if let Some(err) = &next.last_error {
            if prev.is_none_or(|p| p.last_error.as_ref() != Some(err)) {
                lines.push(format!("Could not load a question: {err}"));
                lines.push("Press r to retry or q to quit.".into());
            }
        }

        if let Some(question) = &next.current_question {
            let changed = prev.is_none_or(|p| p.current_question.as_ref() != Some(question));
            if changed {
                lines.push(String::new());
                lines.push(format!(
                    "{} | {}s per question",
                    tally_label(next.tally),
                    next.time_remaining
                ));
                lines.extend(question_block(question));
            } else if !next.locked
                && prev.is_some_and(|p| p.time_remaining != next.time_remaining)
                && TIME_WARNINGS.contains(&next.time_remaining)
            {
                lines.push(format!("  {}s left", next.time_remaining));
            }
        }

        self.previous = Some(next.clone());
        lines
    }
}

pub fn tally_label(tally: Tally) -> String {
    match tally {
        Tally::Lives(lives) => format!("Lives: {lives}"),
        Tally::Score(score) => format!("Score: {score}"),
    }
}

pub fn question_block(question: &Question) -> Vec<String> {
    let mut lines = vec![question.text().to_string()];
    lines.extend(
        question
            .answers()
            .iter()
            .enumerate()
            .map(|(i, answer)| format!("  {}) {answer}", i + 1)),
    );
    lines
}

pub fn outcome_line(outcome: &AnswerOutcome) -> String {
    if outcome.correct {
        "Correct!".into()
    } else {
        format!("Wrong. The answer was: {}", outcome.correct_answer)
    }
}

pub fn history_lines(items: &[HistoryListItem], best: Option<u32>) -> Vec<String> {
    if items.is_empty() {
        return vec!["No scores recorded yet.".into()];
    }
    let mut lines: Vec<String> = items
        .iter()
        .map(|item| {
            format!(
                "{:>5}  {}",
                item.score,
                item.recorded_at.format("%Y-%m-%d %H:%M")
            )
        })
        .collect();
    if let Some(best) = best {
        lines.push(format!("Best: {best}"));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use trivia_core::model::{EndReason, GameMode, HistoryRecordId, SessionStatus};
    use trivia_core::time::fixed_now;

    fn question(text: &str) -> Question {
        Question::new(
            text,
            "b",
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
        )
        .unwrap()
    }

    fn snapshot(question: Option<Question>, time_remaining: u32) -> SessionSnapshot {
        SessionSnapshot {
            mode: GameMode::Lives,
            status: SessionStatus::Active,
            tally: Tally::Lives(3),
            time_remaining,
            current_question: question,
            locked: false,
            last_outcome: None,
            last_error: None,
        }
    }

    #[test]
    fn input_maps_numbers_to_answer_slots() {
        assert_eq!(parse_input("1"), Input::Answer(0));
        assert_eq!(parse_input(" 4 \n"), Input::Answer(3));
        assert_eq!(parse_input("5"), Input::Unknown);
        assert_eq!(parse_input("0"), Input::Unknown);
        assert_eq!(parse_input("q"), Input::Quit);
        assert_eq!(parse_input("r"), Input::Retry);
        assert_eq!(parse_input("maybe"), Input::Unknown);
    }

    #[test]
    fn new_question_is_printed_once() {
        let mut screen = Screen::default();
        let first = snapshot(Some(question("Q1")), 60);
        let lines = screen.update(&first);
        assert!(lines.contains(&"Q1".to_string()));
        assert!(lines.contains(&"  2) b".to_string()));

        let ticked = snapshot(Some(question("Q1")), 59);
        assert!(screen.update(&ticked).is_empty());
    }

    #[test]
    fn warns_when_time_runs_low() {
        let mut screen = Screen::default();
        screen.update(&snapshot(Some(question("Q1")), 11));
        assert_eq!(screen.update(&snapshot(Some(question("Q1")), 10)), vec!["  10s left"]);
        assert!(screen.update(&snapshot(Some(question("Q1")), 9)).is_empty());
    }

    #[test]
    fn end_is_reported_once() {
        let mut screen = Screen::default();
        screen.update(&snapshot(Some(question("Q1")), 60));

        let mut ended = snapshot(Some(question("Q1")), 60);
        ended.status = SessionStatus::Ended(EndReason::LivesExhausted);
        ended.tally = Tally::Lives(0);
        assert_eq!(
            screen.update(&ended),
            vec!["Game over (out of lives). Lives: 0"]
        );
        assert!(screen.update(&ended).is_empty());
    }

    #[test]
    fn provider_error_prompts_for_retry() {
        let mut screen = Screen::default();
        let mut failed = snapshot(None, 60);
        failed.last_error = Some("rate limited".into());
        let lines = screen.update(&failed);
        assert_eq!(lines[0], "Could not load a question: rate limited");
        assert!(screen.update(&failed).is_empty());
    }

    #[test]
    fn outcome_names_the_correct_answer() {
        let wrong = AnswerOutcome {
            selected: "a".into(),
            correct_answer: "b".into(),
            correct: false,
        };
        assert_eq!(outcome_line(&wrong), "Wrong. The answer was: b");
    }

    #[test]
    fn history_lists_scores_and_best() {
        let items = vec![HistoryListItem {
            id: HistoryRecordId::new(1),
            score: 30,
            recorded_at: fixed_now(),
        }];
        let lines = history_lines(&items, Some(30));
        assert_eq!(lines[0], "   30  2023-11-14 22:13");
        assert_eq!(lines[1], "Best: 30");
        assert_eq!(history_lines(&[], None), vec!["No scores recorded yet."]);
    }
}
