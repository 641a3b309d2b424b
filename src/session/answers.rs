// src/session/answers.rs

use crate::models::AnswerMap;

/// The student's in-progress answers.
///
/// Questions without an entry are unanswered. There is no removal; an answer
/// can only be overwritten.
#[derive(Debug, Default, Clone)]
pub struct AnswerStore {
    answers: AnswerMap,
}

impl AnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` for `question_id`, replacing any earlier answer.
    pub fn set(&mut self, question_id: impl Into<String>, value: impl Into<String>) {
        self.answers.insert(question_id.into(), value.into());
    }

    pub fn get(&self, question_id: &str) -> Option<&str> {
        self.answers.get(question_id).map(String::as_str)
    }

    /// Owned copy of every answer. Later edits do not affect the copy.
    pub fn get_all(&self) -> AnswerMap {
        self.answers.clone()
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}
