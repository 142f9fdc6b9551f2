mod cli;
mod screen;

use anyhow::Context;
use clap::Parser;
use services::{AppServices, Clock, SessionController};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use trivia_core::model::{EndReason, GameMode, SessionSnapshot};

use crate::cli::{Cli, Command};
use crate::screen::{Input, Screen, history_lines, outcome_line, parse_input};

const HISTORY_AFTER_GAME: u32 = 5;

fn init_tracing() {
    // stderr keeps log lines out of the game output on stdout
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn render(screen: &mut Screen, snapshot: &SessionSnapshot) {
    for line in screen.update(snapshot) {
        println!("{line}");
    }
}

async fn print_history(services: &AppServices, limit: u32) -> anyhow::Result<()> {
    let history = services.history();
    let items = history.recent(limit).await.context("reading history")?;
    let best = history.best_score().await.context("reading history")?;
    for line in history_lines(&items, best) {
        println!("{line}");
    }
    Ok(())
}

async fn handle_input(session: &SessionController, line: &str) {
    match parse_input(line) {
        Input::Answer(slot) => {
            let answer = session
                .snapshot()
                .current_question
                .and_then(|q| q.answers().get(slot).cloned());
            let Some(answer) = answer else {
                println!("No question on screen yet.");
                return;
            };
            match session.submit_answer(&answer).await {
                Ok(outcome) => println!("{}", outcome_line(&outcome)),
                Err(err) if err.is_invalid_state() => debug!(error = %err, "answer ignored"),
                Err(err) => {
                    if let Some(outcome) = session.snapshot().last_outcome {
                        println!("{}", outcome_line(&outcome));
                    }
                    warn!(error = %err, "answer could not be fully applied");
                }
            }
        }
        Input::Retry => {
            match session.retry().await {
                Ok(()) => {}
                Err(err) if err.is_invalid_state() => debug!(error = %err, "retry ignored"),
                Err(err) => println!("Still failing: {err}"),
            }
        }
        Input::Quit => {
            if let Err(err) = session.end(EndReason::Abandoned).await {
                warn!(error = %err, "failed to end session");
            }
        }
        Input::Unknown => println!("Type 1-4 to answer, r to retry, q to quit."),
    }
}

async fn play(services: &AppServices) -> anyhow::Result<()> {
    let session = services.session();
    let mut updates = session.subscribe();
    let mut screen = Screen::default();
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    println!("{} mode. Type 1-4 to answer, q to quit.", session.mode());
    if let Err(err) = session.start().await {
        debug!(error = %err, "first question unavailable");
    }
    render(&mut screen, &updates.borrow_and_update());

    while !session.snapshot().is_ended() {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                render(&mut screen, &snapshot);
            }
            line = input.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    handle_input(&session, "q").await;
                    break;
                };
                handle_input(&session, &line).await;
            }
        }
    }

    render(&mut screen, &session.snapshot());
    if session.mode() == GameMode::Score {
        println!();
        println!("Recent scores:");
        print_history(services, HISTORY_AFTER_GAME).await?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let db_url = cli::normalize_sqlite_url(&cli.db_url);
    cli::prepare_sqlite_dir(&db_url)?;
    let settings = cli.play.settings()?;
    let services = AppServices::new_sqlite(&db_url, Clock::system(), settings, cli.play.api_config())
        .await
        .with_context(|| format!("opening {db_url}"))?;

    match cli.command {
        Some(Command::History { limit }) => print_history(&services, limit).await,
        None => play(&services).await,
    }
}
