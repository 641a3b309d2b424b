// src/main.rs

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use quiz_client::{
    AppError, HttpQuizApi, QuizApi, ResultView, SessionController, SessionError, SessionState,
    SubmitOutcome, SubmitTrigger,
    config::Config,
    models::QuizId,
    terminal::{self, Command, HELP},
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, fmt, fmt::writer::MakeWriterExt, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Take a timed quiz from the terminal.
#[derive(Debug, Parser)]
#[command(name = "quiz-taker", version)]
struct Args {
    /// Identifier of the quiz to take.
    quiz_id: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), AppError> {
    // Load configuration from environment (.env included)
    let config = Config::from_env()?;
    let _guard = init_tracing(&config);

    let api: Arc<dyn QuizApi> = Arc::new(HttpQuizApi::new(&config)?);
    let quiz_id = QuizId::from(args.quiz_id);
    let session = SessionController::load(&quiz_id, api).await?;

    println!("{}", terminal::render_intro(session.quiz()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        println!("Press Enter to start the quiz, or type 'quit' to go back.");
        let Some(line) = lines.next_line().await? else {
            session.teardown();
            return Ok(());
        };
        if Command::parse(&line) == Some(Command::Quit) {
            session.teardown();
            return Ok(());
        }

        match session.start().await {
            Ok(()) => break,
            Err(SessionError::Registration(err)) => println!("Error starting quiz: {err}"),
            Err(err) => return Err(err.into()),
        }
    }

    print_questions(&session);
    println!("{HELP}\n");
    println!("{}", terminal::render_time_left(session.quiz().duration_seconds()));

    if !take_quiz(&session, &mut lines).await? {
        return Ok(());
    }

    if let Some(result) = session.result() {
        println!("\n{}", ResultView::new(session.quiz(), &result));
    }
    Ok(())
}

/// Runs the answer loop until the attempt is submitted (`true`) or the
/// student leaves (`false`).
async fn take_quiz<R>(
    session: &SessionController,
    lines: &mut tokio::io::Lines<R>,
) -> Result<bool, AppError>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    let mut status_rx = session.subscribe();
    let mut last_announced = None;
    let mut last_error = None;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                session.teardown();
                println!("\nLeaving the quiz without submitting.");
                return Ok(false);
            }
            changed = status_rx.changed() => {
                if changed.is_err() {
                    return Ok(session.state() == SessionState::Submitted);
                }
                let status = status_rx.borrow_and_update().clone();

                if status.state == SessionState::Submitted {
                    return Ok(true);
                }
                if status.submitting && status.remaining_seconds == 0 && last_announced != Some(0) {
                    last_announced = Some(0);
                    println!("Time is up! Submitting your answers...");
                }
                if !status.submitting
                    && terminal::should_announce(status.remaining_seconds)
                    && last_announced != Some(status.remaining_seconds)
                {
                    last_announced = Some(status.remaining_seconds);
                    println!("{}", terminal::render_time_left(status.remaining_seconds));
                }
                if status.last_error != last_error {
                    if let (Some(error), 0) = (&status.last_error, status.remaining_seconds) {
                        println!("Automatic submission failed: {error}. Type 'submit' to try again.");
                    }
                    last_error = status.last_error.clone();
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    session.teardown();
                    return Ok(false);
                };
                match Command::parse(&line) {
                    Some(Command::Answer { question, value }) => record(session, question, &value),
                    Some(Command::List) => print_questions(session),
                    Some(Command::Time) => {
                        let remaining = session.remaining_seconds().unwrap_or_default();
                        println!("{}", terminal::render_time_left(remaining));
                    }
                    Some(Command::Help) => println!("{HELP}"),
                    Some(Command::Submit) => match session.submit(SubmitTrigger::Manual).await {
                        Ok(SubmitOutcome::Submitted(_)) => return Ok(true),
                        Ok(SubmitOutcome::Skipped) => println!("Your answers are already being submitted."),
                        Ok(SubmitOutcome::Discarded) => return Ok(false),
                        Err(SessionError::Submission(err)) => {
                            println!("Error submitting quiz: {err}. Type 'submit' to try again.");
                        }
                        Err(err) => return Err(err.into()),
                    },
                    Some(Command::Quit) => {
                        session.teardown();
                        return Ok(false);
                    }
                    None if line.trim().is_empty() => {}
                    None => println!("Unrecognised input. Type 'help' for the list of commands."),
                }
            }
        }
    }
}

fn record(session: &SessionController, number: usize, raw: &str) {
    let Some(question) = session.quiz().questions.get(number - 1) else {
        println!("There is no question {number}.");
        return;
    };

    let answer = terminal::resolve_answer(question, raw);
    if session.record_answer(&question.id, answer.clone()) {
        println!("Saved answer for question {number}: {answer}");
    } else {
        println!("Answers can no longer be changed.");
    }
}

fn print_questions(session: &SessionController) {
    for (index, question) in session.quiz().questions.iter().enumerate() {
        let current = session.answer(&question.id);
        println!(
            "{}",
            terminal::render_question(index + 1, question, current.as_deref())
        );
    }
}

fn init_tracing(config: &Config) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "quiz-client.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    // The terminal belongs to the quiz; only warnings and errors go there.
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr.with_max_level(tracing::Level::WARN))
        .with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}
