// tests/common/mod.rs

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use quiz_client::{
    ApiError, QuizApi,
    models::{AnswerMap, QuizDefinition, QuizId, StartAttemptResponse, SubmissionResult},
};
use reqwest::StatusCode;
use serde_json::json;

/// Builds a quiz with the given time limit and questions.
/// Each question is `(id, objective options)`; no options means theory.
pub fn quiz_with(time_limit: u32, questions: &[(&str, &[&str])]) -> QuizDefinition {
    let details: Vec<serde_json::Value> = questions
        .iter()
        .map(|(id, options)| {
            if options.is_empty() {
                json!({
                    "id": id,
                    "question_text": format!("Explain {id}"),
                    "question_type": "theory",
                    "options": null
                })
            } else {
                json!({
                    "id": id,
                    "question_text": format!("Pick an option for {id}"),
                    "question_type": "objective",
                    "options": options
                })
            }
        })
        .collect();
    let order: Vec<&str> = questions.iter().map(|(id, _)| *id).collect();

    serde_json::from_value(json!({
        "id": "quiz-1",
        "title": "Timed quiz",
        "description": "A quiz used in tests",
        "time_limit": time_limit,
        "questions": order,
        "question_details": details
    }))
    .expect("fixture quiz must deserialize")
}

/// One-minute quiz with a single objective question `q1`.
pub fn one_question_quiz() -> QuizDefinition {
    quiz_with(1, &[("q1", &["A", "B", "C"])])
}

pub fn graded(answers: &AnswerMap) -> SubmissionResult {
    let results: serde_json::Map<String, serde_json::Value> = answers
        .iter()
        .map(|(id, answer)| {
            (
                id.clone(),
                json!({
                    "student_answer": answer,
                    "correct_answer": "A",
                    "is_correct": answer == "A",
                    "explanation": null,
                    "question_text": format!("Question {id}")
                }),
            )
        })
        .collect();
    let score = answers.values().filter(|a| a.as_str() == "A").count();

    serde_json::from_value(json!({
        "score": score,
        "max_score": answers.len().max(1),
        "percentage": 0.0,
        "time_taken": 10,
        "results": results
    }))
    .expect("fixture result must deserialize")
}

fn server_error(detail: &str) -> ApiError {
    ApiError::Status {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        detail: detail.to_string(),
    }
}

/// In-memory quiz service recording every call.
pub struct FakeQuizApi {
    quiz: QuizDefinition,
    latency: Duration,
    fetches: AtomicUsize,
    starts: AtomicUsize,
    submissions: Mutex<Vec<(QuizId, AnswerMap, tokio::time::Instant)>>,
    start_failures: Mutex<VecDeque<ApiError>>,
    submit_failures: Mutex<VecDeque<ApiError>>,
}

impl FakeQuizApi {
    pub fn new(quiz: QuizDefinition) -> Self {
        Self {
            quiz,
            latency: Duration::ZERO,
            fetches: AtomicUsize::new(0),
            starts: AtomicUsize::new(0),
            submissions: Mutex::new(Vec::new()),
            start_failures: Mutex::new(VecDeque::new()),
            submit_failures: Mutex::new(VecDeque::new()),
        }
    }

    /// Every call waits this long before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn fail_next_start(&self, detail: &str) {
        self.start_failures.lock().unwrap().push_back(server_error(detail));
    }

    pub fn fail_next_submit(&self, detail: &str) {
        self.submit_failures.lock().unwrap().push_back(server_error(detail));
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    /// Number of grading requests that reached the service.
    pub fn submit_count(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }

    pub fn submitted_payloads(&self) -> Vec<AnswerMap> {
        self.submissions
            .lock()
            .unwrap()
            .iter()
            .map(|(_, answers, _)| answers.clone())
            .collect()
    }

    pub fn submitted_at(&self) -> Vec<tokio::time::Instant> {
        self.submissions
            .lock()
            .unwrap()
            .iter()
            .map(|(_, _, at)| *at)
            .collect()
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl QuizApi for FakeQuizApi {
    async fn fetch_quiz(&self, _quiz_id: &QuizId) -> Result<QuizDefinition, ApiError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        Ok(self.quiz.clone())
    }

    async fn start_attempt(&self, _quiz_id: &QuizId) -> Result<StartAttemptResponse, ApiError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        if let Some(err) = self.start_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        Ok(StartAttemptResponse {
            attempt_id: Some(format!("attempt-{}", self.start_count())),
            message: Some("Quiz started".to_string()),
            time_limit: Some(self.quiz.time_limit_minutes),
        })
    }

    async fn submit_answers(
        &self,
        quiz_id: &QuizId,
        answers: &AnswerMap,
    ) -> Result<SubmissionResult, ApiError> {
        self.submissions.lock().unwrap().push((
            quiz_id.clone(),
            answers.clone(),
            tokio::time::Instant::now(),
        ));
        self.delay().await;
        if let Some(err) = self.submit_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        Ok(graded(answers))
    }
}
