// src/models/mod.rs

pub mod quiz;
pub mod submission;

pub use quiz::{QuestionRef, QuestionType, QuizDefinition, QuizId};
pub use submission::{
    AnswerMap, QuestionResult, StartAttemptResponse, SubmissionResult, SubmitQuizRequest,
};
