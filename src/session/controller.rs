// src/session/controller.rs

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use validator::Validate;

use super::answers::AnswerStore;
use super::clock::{Clock, ClockListener};
use super::gate::SubmissionGate;
use crate::{
    api::QuizApi,
    config::TICK_INTERVAL,
    error::SessionError,
    models::{AnswerMap, QuizDefinition, QuizId, SubmissionResult},
};

/// Lifecycle of one attempt. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SessionState {
    NotStarted,
    InProgress,
    Submitted,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::NotStarted => "not started",
            SessionState::InProgress => "in progress",
            SessionState::Submitted => "submitted",
        };
        f.write_str(label)
    }
}

/// What asked for the submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SubmitTrigger {
    /// The student asked to submit.
    Manual,
    /// The countdown reached zero.
    Timeout,
}

#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// This call won the gate and the answers were graded.
    Submitted(Arc<SubmissionResult>),
    /// Another submission is in flight or already done; nothing was sent.
    Skipped,
    /// The answers were graded but the session was torn down meanwhile,
    /// so the result was dropped.
    Discarded,
}

/// Snapshot published to the rendering layer on every change.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    pub state: SessionState,
    pub remaining_seconds: u64,
    pub submitting: bool,
    pub last_error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Drives one student's attempt at one quiz.
///
/// Cloning yields another handle to the same session. The countdown task
/// only holds the session weakly, so dropping every handle stops it.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

pub struct SessionControllerBuilder {
    quiz: Arc<QuizDefinition>,
    api: Arc<dyn QuizApi>,
    tick_period: Duration,
}

impl SessionControllerBuilder {
    /// Length of one countdown tick. Defaults to one second.
    pub fn tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    pub fn build(self) -> SessionController {
        let (status, _) = watch::channel(SessionStatus {
            state: SessionState::NotStarted,
            remaining_seconds: self.quiz.duration_seconds(),
            submitting: false,
            last_error: None,
            started_at: None,
            submitted_at: None,
        });

        let inner = Arc::new_cyclic(|me| Inner {
            me: me.clone(),
            quiz: self.quiz,
            api: self.api,
            clock: Clock::new(self.tick_period),
            answers: Mutex::new(AnswerStore::new()),
            gate: SubmissionGate::new(),
            progress: Mutex::new(Progress::default()),
            torn_down: AtomicBool::new(false),
            status,
        });

        SessionController { inner }
    }
}

struct Inner {
    me: Weak<Inner>,
    quiz: Arc<QuizDefinition>,
    api: Arc<dyn QuizApi>,
    clock: Clock,
    answers: Mutex<AnswerStore>,
    gate: SubmissionGate,
    progress: Mutex<Progress>,
    torn_down: AtomicBool,
    status: watch::Sender<SessionStatus>,
}

struct Progress {
    state: SessionState,
    starting: bool,
    attempt_id: Option<String>,
    result: Option<Arc<SubmissionResult>>,
    /// The exact answers sent with the successful submission.
    submitted_answers: Option<AnswerMap>,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            state: SessionState::NotStarted,
            starting: false,
            attempt_id: None,
            result: None,
            submitted_answers: None,
        }
    }
}

/// Issued to the caller that won the submission gate.
struct Ticket {
    trigger: SubmitTrigger,
    answers: AnswerMap,
}

impl SessionController {
    pub fn builder(
        quiz: impl Into<Arc<QuizDefinition>>,
        api: Arc<dyn QuizApi>,
    ) -> SessionControllerBuilder {
        SessionControllerBuilder {
            quiz: quiz.into(),
            api,
            tick_period: TICK_INTERVAL,
        }
    }

    pub fn new(quiz: impl Into<Arc<QuizDefinition>>, api: Arc<dyn QuizApi>) -> Self {
        Self::builder(quiz, api).build()
    }

    /// Fetches and validates the quiz, then builds a session for it.
    pub async fn load(quiz_id: &QuizId, api: Arc<dyn QuizApi>) -> Result<Self, SessionError> {
        let quiz = api.fetch_quiz(quiz_id).await.map_err(SessionError::Load)?;
        quiz.validate()?;

        tracing::info!(
            quiz_id = %quiz.id,
            questions = quiz.questions.len(),
            time_limit_minutes = quiz.time_limit_minutes,
            "quiz loaded"
        );
        Ok(Self::new(quiz, api))
    }

    pub fn quiz(&self) -> &QuizDefinition {
        &self.inner.quiz
    }

    pub fn quiz_id(&self) -> &QuizId {
        &self.inner.quiz.id
    }

    pub fn state(&self) -> SessionState {
        lock(&self.inner.progress).state
    }

    /// Seconds left on the countdown; `None` before the attempt starts.
    pub fn remaining_seconds(&self) -> Option<u64> {
        match self.state() {
            SessionState::NotStarted => None,
            _ => Some(self.inner.clock.remaining_seconds()),
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.inner.gate.is_closed() && self.state() == SessionState::InProgress
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.status.borrow().clone()
    }

    /// Receiver notified on every tick, transition and failure.
    ///
    /// Do not keep a `borrow()` of the receiver alive across calls into the
    /// controller; clone the status out instead.
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.inner.status.subscribe()
    }

    pub fn answer(&self, question_id: &str) -> Option<String> {
        lock(&self.inner.answers).get(question_id).map(str::to_string)
    }

    /// Copy of the answers recorded so far.
    pub fn answers(&self) -> AnswerMap {
        lock(&self.inner.answers).get_all()
    }

    /// Answers that were actually graded, once submitted.
    pub fn submitted_answers(&self) -> Option<AnswerMap> {
        lock(&self.inner.progress).submitted_answers.clone()
    }

    pub fn result(&self) -> Option<Arc<SubmissionResult>> {
        lock(&self.inner.progress).result.clone()
    }

    pub fn attempt_id(&self) -> Option<String> {
        lock(&self.inner.progress).attempt_id.clone()
    }

    /// Registers the attempt with the quiz service and starts the countdown.
    ///
    /// On failure the session stays `NotStarted` and `start` may be retried.
    pub async fn start(&self) -> Result<(), SessionError> {
        let inner = &self.inner;
        {
            let mut progress = lock(&inner.progress);
            if progress.state != SessionState::NotStarted {
                return Err(SessionError::InvalidState {
                    action: "start",
                    state: progress.state,
                });
            }
            if progress.starting {
                return Err(SessionError::StartPending);
            }
            if inner.torn_down.load(Ordering::Acquire) {
                return Err(SessionError::TornDown);
            }
            progress.starting = true;
        }

        tracing::info!(quiz_id = %inner.quiz.id, "registering attempt");
        let registration = inner.api.start_attempt(&inner.quiz.id).await;

        let mut progress = lock(&inner.progress);
        progress.starting = false;

        let response = match registration {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(quiz_id = %inner.quiz.id, error = %err, "attempt registration failed");
                drop(progress);
                inner.publish(|status| status.last_error = Some(err.to_string()));
                return Err(SessionError::Registration(err));
            }
        };

        if inner.torn_down.load(Ordering::Acquire) {
            tracing::info!(quiz_id = %inner.quiz.id, "session torn down during registration");
            return Err(SessionError::TornDown);
        }

        if let Some(limit) = response.time_limit {
            if limit != inner.quiz.time_limit_minutes {
                tracing::warn!(
                    quiz_id = %inner.quiz.id,
                    service_limit = limit,
                    local_limit = inner.quiz.time_limit_minutes,
                    "time limit changed since the quiz was loaded; keeping the loaded one"
                );
            }
        }

        let duration = inner.quiz.duration_seconds();
        let listener: Weak<dyn ClockListener> = inner.me.clone();
        inner.clock.start(duration, listener)?;

        progress.state = SessionState::InProgress;
        progress.attempt_id = response.attempt_id;
        drop(progress);

        let started_at = Utc::now();
        inner.publish(|status| {
            status.state = SessionState::InProgress;
            status.remaining_seconds = duration;
            status.last_error = None;
            status.started_at = Some(started_at);
        });
        tracing::info!(quiz_id = %inner.quiz.id, duration_seconds = duration, "attempt started");
        Ok(())
    }

    /// Records an answer. Returns `false` when the edit was ignored: the
    /// session is not in progress, or the question is not part of the quiz.
    pub fn record_answer(&self, question_id: &str, value: impl Into<String>) -> bool {
        let inner = &self.inner;
        let progress = lock(&inner.progress);
        if progress.state != SessionState::InProgress {
            tracing::debug!(question_id, state = %progress.state, "ignoring stale answer edit");
            return false;
        }
        if !inner.quiz.contains_question(question_id) {
            tracing::warn!(question_id, "ignoring answer for unknown question");
            return false;
        }

        lock(&inner.answers).set(question_id, value);
        true
    }

    /// Submits the answers for grading, at most once per session.
    ///
    /// Only the first caller through the gate sends anything; concurrent or
    /// later calls return `SubmitOutcome::Skipped`. If grading fails the
    /// gate reopens and the error is returned so either trigger can retry.
    pub async fn submit(&self, trigger: SubmitTrigger) -> Result<SubmitOutcome, SessionError> {
        match self.inner.begin_submission(trigger)? {
            Some(ticket) => self.inner.finish_submission(ticket).await,
            None => Ok(SubmitOutcome::Skipped),
        }
    }

    /// Ends the session from the outside (the student left the quiz).
    ///
    /// Stops the countdown. A grading response that arrives afterwards is
    /// discarded.
    pub fn teardown(&self) {
        if self.inner.torn_down.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.clock.stop();
        tracing::info!(quiz_id = %self.inner.quiz.id, "session torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.torn_down.load(Ordering::Acquire)
    }
}

impl Inner {
    fn publish(&self, update: impl FnOnce(&mut SessionStatus)) {
        self.status.send_modify(update);
    }

    /// Synchronous half of a submission: everything up to the network call.
    ///
    /// Runs without suspending, so the gate is closed before any other
    /// trigger can observe it open.
    fn begin_submission(&self, trigger: SubmitTrigger) -> Result<Option<Ticket>, SessionError> {
        let state = lock(&self.progress).state;
        match state {
            SessionState::NotStarted => {
                return Err(SessionError::InvalidState {
                    action: "submit",
                    state,
                });
            }
            SessionState::Submitted => {
                tracing::debug!(?trigger, "session already submitted, ignoring");
                return Ok(None);
            }
            SessionState::InProgress => {}
        }

        if self.torn_down.load(Ordering::Acquire) {
            tracing::debug!(?trigger, "session torn down, ignoring submit");
            return Ok(None);
        }

        if !self.gate.try_acquire() {
            tracing::debug!(?trigger, "submission already in flight, ignoring");
            return Ok(None);
        }

        // No lock may be held here: a tick being delivered on another thread
        // could be waiting for one while stop() waits for that tick.
        self.clock.stop();
        let answers = lock(&self.answers).get_all();

        let remaining = self.clock.remaining_seconds();
        self.publish(|status| {
            status.submitting = true;
            status.remaining_seconds = remaining;
        });
        tracing::info!(
            quiz_id = %self.quiz.id,
            ?trigger,
            answered = answers.len(),
            remaining_seconds = remaining,
            "submitting attempt"
        );

        Ok(Some(Ticket { trigger, answers }))
    }

    async fn finish_submission(&self, ticket: Ticket) -> Result<SubmitOutcome, SessionError> {
        let Ticket { trigger, answers } = ticket;
        let graded = self.api.submit_answers(&self.quiz.id, &answers).await;

        if self.torn_down.load(Ordering::Acquire) {
            tracing::info!(
                quiz_id = %self.quiz.id,
                succeeded = graded.is_ok(),
                "discarding grading response for torn-down session"
            );
            return Ok(SubmitOutcome::Discarded);
        }

        match graded {
            Ok(result) => {
                let result = Arc::new(result);
                {
                    let mut progress = lock(&self.progress);
                    progress.state = SessionState::Submitted;
                    progress.result = Some(Arc::clone(&result));
                    progress.submitted_answers = Some(answers);
                }

                let submitted_at = Utc::now();
                self.publish(|status| {
                    status.state = SessionState::Submitted;
                    status.submitting = false;
                    status.last_error = None;
                    status.submitted_at = Some(submitted_at);
                });
                tracing::info!(
                    quiz_id = %self.quiz.id,
                    ?trigger,
                    score = result.score,
                    max_score = result.max_score,
                    "attempt submitted"
                );
                Ok(SubmitOutcome::Submitted(result))
            }
            Err(err) => {
                tracing::warn!(quiz_id = %self.quiz.id, ?trigger, error = %err, "submission failed");

                // Resume before reopening the gate, so a trigger that slips in
                // between still finds a running clock to stop.
                let remaining = self.clock.remaining_seconds();
                if remaining > 0 {
                    let listener: Weak<dyn ClockListener> = self.me.clone();
                    if let Err(clock_err) = self.clock.start(remaining, listener) {
                        tracing::warn!(error = %clock_err, "could not resume countdown");
                    }
                }
                self.gate.release();

                self.publish(|status| {
                    status.submitting = false;
                    status.remaining_seconds = remaining;
                    status.last_error = Some(err.to_string());
                });
                Err(SessionError::Submission(err))
            }
        }
    }
}

impl ClockListener for Inner {
    fn on_tick(&self, remaining_seconds: u64) {
        tracing::trace!(remaining_seconds, "tick");
        self.publish(|status| status.remaining_seconds = remaining_seconds);
    }

    fn on_expired(&self) {
        tracing::info!(quiz_id = %self.quiz.id, "time limit reached");

        let Some(inner) = self.me.upgrade() else {
            return;
        };
        match inner.begin_submission(SubmitTrigger::Timeout) {
            Ok(Some(ticket)) => {
                tokio::spawn(async move {
                    if let Err(err) = inner.finish_submission(ticket).await {
                        tracing::error!(error = %err, "automatic submission failed");
                    }
                });
            }
            Ok(None) => {}
            Err(err) => tracing::warn!(error = %err, "automatic submission rejected"),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
