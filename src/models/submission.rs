// src/models/submission.rs

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Deserializer, Serialize};

use super::quiz::QuizId;

/// Student answers keyed by question id.
/// Value is the selected option text or the free-text answer.
pub type AnswerMap = BTreeMap<String, String>;

/// Body of `POST quizzes/{id}/submit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitQuizRequest {
    pub quiz_id: QuizId,
    pub answers: AnswerMap,
}

/// Response of `POST quizzes/{id}/start`.
#[derive(Debug, Clone, Deserialize)]
pub struct StartAttemptResponse {
    #[serde(default)]
    pub attempt_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Time limit in minutes as known by the service.
    #[serde(default)]
    pub time_limit: Option<u32>,
}

/// Grading outcome for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResult {
    /// Filled from the key of the `results` map.
    #[serde(default)]
    pub question_id: String,
    pub question_text: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub student_answer: Option<String>,
    pub is_correct: bool,
    pub correct_answer: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub explanation: Option<String>,
}

/// Result returned by the grading service for a submitted attempt.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubmissionResult {
    pub score: u32,
    pub max_score: u32,
    #[serde(default)]
    pub percentage: f64,
    #[serde(rename = "time_taken", default)]
    pub time_taken_seconds: u64,
    #[serde(deserialize_with = "results_from_map", default)]
    pub results: Vec<QuestionResult>,
}

impl SubmissionResult {
    pub fn correct_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_correct).count()
    }

    pub fn result_for(&self, question_id: &str) -> Option<&QuestionResult> {
        self.results.iter().find(|r| r.question_id == question_id)
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// The service keys per-question results by question id.
fn results_from_map<'de, D>(deserializer: D) -> Result<Vec<QuestionResult>, D::Error>
where
    D: Deserializer<'de>,
{
    let map = HashMap::<String, QuestionResult>::deserialize(deserializer)?;
    let mut results: Vec<QuestionResult> = map
        .into_iter()
        .map(|(question_id, mut result)| {
            result.question_id = question_id;
            result
        })
        .collect();
    results.sort_by(|a, b| a.question_id.cmp(&b.question_id));
    Ok(results)
}
