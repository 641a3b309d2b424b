// src/routes.rs

use url::Url;

use crate::{error::ApiError, models::QuizId};

/// Endpoints of the quiz service consumed by a quiz-taking session.
///
/// * `GET  quizzes/{id}`        - quiz definition with question details.
/// * `POST quizzes/{id}/start`  - registers the attempt.
/// * `POST quizzes/{id}/submit` - sends answers for grading.
pub fn quiz(base: &Url, quiz_id: &QuizId) -> Result<Url, ApiError> {
    endpoint(base, &["quizzes", quiz_id.as_str()])
}

pub fn start_attempt(base: &Url, quiz_id: &QuizId) -> Result<Url, ApiError> {
    endpoint(base, &["quizzes", quiz_id.as_str(), "start"])
}

pub fn submit_attempt(base: &Url, quiz_id: &QuizId) -> Result<Url, ApiError> {
    endpoint(base, &["quizzes", quiz_id.as_str(), "submit"])
}

fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = base.clone();
    // Segments are percent-encoded, so an id can never escape its path slot.
    url.path_segments_mut()
        .map_err(|_| ApiError::Endpoint(format!("{base} cannot be used as a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
