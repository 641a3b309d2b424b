// src/models/quiz.rs

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::config::SECONDS_PER_MINUTE;

/// Identifier of a quiz on the quiz service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuizId(String);

impl QuizId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuizId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QuizId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for QuizId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    /// Answered by picking one of the listed options.
    Objective,
    /// Answered with free text.
    Theory,
}

/// A question as shown to a student taking the quiz.
/// The service strips the correct answer and explanation for students.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRef {
    pub id: String,

    #[serde(rename = "question_text")]
    pub text: String,

    pub question_type: QuestionType,

    /// Only present for objective questions.
    #[serde(default)]
    pub options: Option<Vec<String>>,

    #[serde(default = "default_points")]
    pub points: u32,
}

fn default_points() -> u32 {
    1
}

impl QuestionRef {
    pub fn options(&self) -> &[String] {
        self.options.as_deref().unwrap_or_default()
    }

    pub fn is_objective(&self) -> bool {
        self.question_type == QuestionType::Objective
    }
}

/// Quiz as returned by `GET quizzes/{id}`.
///
/// `question_details` comes back in storage order, so the definition is
/// rebuilt in the order given by `questions`.
#[derive(Debug, Deserialize)]
struct QuizPayload {
    id: QuizId,
    title: String,
    #[serde(default)]
    description: String,
    time_limit: u32,
    #[serde(default)]
    questions: Vec<String>,
    #[serde(default)]
    question_details: Vec<QuestionRef>,
}

/// Immutable quiz definition, loaded once per session.
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
#[serde(from = "QuizPayload")]
pub struct QuizDefinition {
    pub id: QuizId,

    #[validate(length(min = 1, max = 500))]
    pub title: String,

    pub description: String,

    #[validate(range(min = 1))]
    pub time_limit_minutes: u32,

    #[validate(length(min = 1), custom(function = validate_questions))]
    pub questions: Vec<QuestionRef>,
}

impl From<QuizPayload> for QuizDefinition {
    fn from(payload: QuizPayload) -> Self {
        let QuizPayload {
            id,
            title,
            description,
            time_limit,
            questions: order,
            question_details,
        } = payload;

        let mut remaining = question_details;
        let mut questions = Vec::with_capacity(remaining.len());
        for question_id in &order {
            if let Some(pos) = remaining.iter().position(|q| &q.id == question_id) {
                questions.push(remaining.remove(pos));
            }
        }
        // Details not referenced by the ordering keep their relative order.
        questions.extend(remaining);

        Self {
            id,
            title,
            description,
            time_limit_minutes: time_limit,
            questions,
        }
    }
}

impl QuizDefinition {
    /// Total countdown length for an attempt.
    pub fn duration_seconds(&self) -> u64 {
        u64::from(self.time_limit_minutes) * SECONDS_PER_MINUTE
    }

    pub fn question(&self, question_id: &str) -> Option<&QuestionRef> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    pub fn contains_question(&self, question_id: &str) -> bool {
        self.question(question_id).is_some()
    }

    /// Position of a question in the quiz, starting at zero.
    pub fn position(&self, question_id: &str) -> Option<usize> {
        self.questions.iter().position(|q| q.id == question_id)
    }
}

fn validate_questions(questions: &[QuestionRef]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for question in questions {
        if question.id.trim().is_empty() {
            return Err(ValidationError::new("question_id_empty"));
        }
        if !seen.insert(question.id.as_str()) {
            return Err(ValidationError::new("question_id_duplicated"));
        }
        if question.text.trim().is_empty() {
            return Err(ValidationError::new("question_text_empty"));
        }
        if question.is_objective() && question.options().is_empty() {
            return Err(ValidationError::new("objective_question_without_options"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn payload() -> serde_json::Value {
        json!({
            "id": "quiz-1",
            "title": "Rust basics",
            "description": "Ownership and borrowing",
            "time_limit": 2,
            "questions": ["q2", "q1"],
            "question_details": [
                {
                    "id": "q1",
                    "question_text": "Which keyword moves a closure's captures?",
                    "question_type": "objective",
                    "options": ["move", "ref", "box"],
                    "points": 2,
                    "created_by": "admin"
                },
                {
                    "id": "q2",
                    "question_text": "Explain borrowing.",
                    "question_type": "theory",
                    "options": null
                }
            ],
            "is_active": true
        })
    }

    #[test]
    fn details_follow_question_order() {
        let quiz: QuizDefinition = serde_json::from_value(payload()).unwrap();

        let ids: Vec<&str> = quiz.questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, ["q2", "q1"]);
        assert_eq!(quiz.time_limit_minutes, 2);
        assert_eq!(quiz.duration_seconds(), 120);
        assert_eq!(quiz.questions[0].options(), &[] as &[String]);
        assert_eq!(quiz.questions[1].points, 2);
        assert_eq!(quiz.questions[0].points, 1);
        assert!(quiz.validate().is_ok());
    }

    #[test]
    fn unlisted_details_are_appended() {
        let mut value = payload();
        value["questions"] = json!(["q1"]);
        let quiz: QuizDefinition = serde_json::from_value(value).unwrap();

        assert_eq!(quiz.position("q1"), Some(0));
        assert_eq!(quiz.position("q2"), Some(1));
    }

    #[test]
    fn zero_time_limit_fails_validation() {
        let mut value = payload();
        value["time_limit"] = json!(0);
        let quiz: QuizDefinition = serde_json::from_value(value).unwrap();

        let errors = quiz.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("time_limit_minutes"));
    }

    #[test]
    fn objective_question_needs_options() {
        let mut value = payload();
        value["question_details"][0]["options"] = json!([]);
        let quiz: QuizDefinition = serde_json::from_value(value).unwrap();

        let errors = quiz.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("questions"));
    }

    #[test]
    fn duplicate_question_ids_fail_validation() {
        let mut value = payload();
        value["question_details"][1]["id"] = json!("q1");
        let quiz: QuizDefinition = serde_json::from_value(value).unwrap();

        assert!(quiz.validate().is_err());
    }
}
