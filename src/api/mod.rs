// src/api/mod.rs

mod http;

use async_trait::async_trait;

use crate::{
    error::ApiError,
    models::{AnswerMap, QuizDefinition, QuizId, StartAttemptResponse, SubmissionResult},
};

pub use http::HttpQuizApi;

/// Calls a quiz-taking session makes to the quiz service.
///
/// Grading, persistence and authentication all live behind this seam.
#[async_trait]
pub trait QuizApi: Send + Sync {
    /// `GET quizzes/{id}`
    async fn fetch_quiz(&self, quiz_id: &QuizId) -> Result<QuizDefinition, ApiError>;

    /// `POST quizzes/{id}/start`
    async fn start_attempt(&self, quiz_id: &QuizId) -> Result<StartAttemptResponse, ApiError>;

    /// `POST quizzes/{id}/submit`
    async fn submit_answers(
        &self,
        quiz_id: &QuizId,
        answers: &AnswerMap,
    ) -> Result<SubmissionResult, ApiError>;
}
