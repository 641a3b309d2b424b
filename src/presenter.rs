// src/presenter.rs

use std::fmt;

use crate::{
    models::{QuestionResult, QuizDefinition, SubmissionResult},
    utils::format::{format_minutes, format_percentage},
};

const NO_ANSWER: &str = "No answer";

/// Display-ready form of a grading result.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultView {
    pub quiz_title: String,
    /// e.g. `3 / 4 (75%)`
    pub score_line: String,
    /// e.g. `Time taken: 12 minutes`
    pub time_line: String,
    pub items: Vec<ResultItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultItem {
    /// One-based position in the quiz.
    pub number: usize,
    pub question_text: String,
    pub is_correct: bool,
    pub your_answer: String,
    /// Only shown when the answer was wrong.
    pub correct_answer: Option<String>,
    pub explanation: Option<String>,
}

impl ResultItem {
    pub fn verdict(&self) -> &'static str {
        if self.is_correct { "Correct" } else { "Incorrect" }
    }
}

impl ResultView {
    /// Items follow the quiz's question order; results for questions the
    /// quiz does not list come last.
    pub fn new(quiz: &QuizDefinition, result: &SubmissionResult) -> Self {
        let mut ordered: Vec<&QuestionResult> = result.results.iter().collect();
        ordered.sort_by_key(|r| quiz.position(&r.question_id).unwrap_or(usize::MAX));

        let items = ordered
            .into_iter()
            .enumerate()
            .map(|(index, r)| ResultItem {
                number: index + 1,
                question_text: r.question_text.clone(),
                is_correct: r.is_correct,
                your_answer: r
                    .student_answer
                    .clone()
                    .unwrap_or_else(|| NO_ANSWER.to_string()),
                correct_answer: (!r.is_correct).then(|| r.correct_answer.clone()),
                explanation: r.explanation.clone(),
            })
            .collect();

        Self {
            quiz_title: quiz.title.clone(),
            score_line: format!(
                "{} / {} ({})",
                result.score,
                result.max_score,
                format_percentage(result.percentage)
            ),
            time_line: format!("Time taken: {}", format_minutes(result.time_taken_seconds)),
            items,
        }
    }
}

impl fmt::Display for ResultView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Quiz Results: {}", self.quiz_title)?;
        writeln!(f, "Your Score: {}", self.score_line)?;
        writeln!(f, "{}", self.time_line)?;

        for item in &self.items {
            writeln!(f)?;
            writeln!(f, "Question {} [{}]", item.number, item.verdict())?;
            writeln!(f, "  {}", item.question_text)?;
            writeln!(f, "  Your Answer: {}", item.your_answer)?;
            if let Some(correct) = &item.correct_answer {
                writeln!(f, "  Correct Answer: {correct}")?;
            }
            if let Some(explanation) = &item.explanation {
                writeln!(f, "  Explanation: {explanation}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn quiz() -> QuizDefinition {
        serde_json::from_value(json!({
            "id": "quiz-1",
            "title": "Rust basics",
            "description": "",
            "time_limit": 5,
            "questions": ["q1", "q2"],
            "question_details": [
                { "id": "q1", "question_text": "Pick one", "question_type": "objective", "options": ["A", "B"] },
                { "id": "q2", "question_text": "Explain", "question_type": "theory" }
            ]
        }))
        .unwrap()
    }

    fn result() -> SubmissionResult {
        serde_json::from_value(json!({
            "score": 1,
            "max_score": 2,
            "percentage": 50.0,
            "time_taken": 125,
            "results": {
                "q2": { "student_answer": "", "correct_answer": "Because", "is_correct": false,
                        "explanation": "See chapter 4", "question_text": "Explain" },
                "q1": { "student_answer": "A", "correct_answer": "A", "is_correct": true,
                        "explanation": null, "question_text": "Pick one" }
            }
        }))
        .unwrap()
    }

    #[test]
    fn builds_view_in_quiz_order() {
        let view = ResultView::new(&quiz(), &result());

        assert_eq!(view.score_line, "1 / 2 (50%)");
        assert_eq!(view.time_line, "Time taken: 2 minutes");
        assert_eq!(view.items.len(), 2);

        let first = &view.items[0];
        assert_eq!(first.number, 1);
        assert_eq!(first.question_text, "Pick one");
        assert_eq!(first.verdict(), "Correct");
        assert_eq!(first.correct_answer, None);

        let second = &view.items[1];
        assert_eq!(second.your_answer, "No answer");
        assert_eq!(second.correct_answer.as_deref(), Some("Because"));
        assert_eq!(second.explanation.as_deref(), Some("See chapter 4"));
    }

    #[test]
    fn renders_text() {
        let text = ResultView::new(&quiz(), &result()).to_string();

        assert!(text.contains("Your Score: 1 / 2 (50%)"));
        assert!(text.contains("Question 2 [Incorrect]"));
        assert!(text.contains("Correct Answer: Because"));
        assert!(!text.contains("Correct Answer: A"));
    }
}
