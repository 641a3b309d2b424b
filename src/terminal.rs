// src/terminal.rs

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    models::{QuestionRef, QuizDefinition},
    utils::format::format_countdown,
};

static ANSWER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\s*[:.)]?\s+(.+?)\s*$").expect("valid answer pattern"));

/// A line typed by the student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `<n> <answer>`; `question` is one-based.
    Answer { question: usize, value: String },
    List,
    Time,
    Submit,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "list" | "ls" => return Some(Command::List),
            "time" | "t" => return Some(Command::Time),
            "submit" => return Some(Command::Submit),
            "help" | "?" => return Some(Command::Help),
            "quit" | "exit" | "q" => return Some(Command::Quit),
            _ => {}
        }

        let captures = ANSWER_LINE.captures(trimmed)?;
        let question = captures[1].parse::<usize>().ok().filter(|n| *n > 0)?;
        Some(Command::Answer {
            question,
            value: captures[2].to_string(),
        })
    }
}

pub const HELP: &str = "\
Commands:
  <n> <answer>   answer question n (objective: option number or text)
  list           show all questions with your current answers
  time           show the remaining time
  submit         submit your answers for grading
  quit           leave the quiz without submitting";

/// Maps what the student typed to the stored answer value.
///
/// For objective questions an option number or a case-insensitive match of
/// the option text selects that option's exact text. Anything else is kept
/// as typed.
pub fn resolve_answer(question: &QuestionRef, raw: &str) -> String {
    let raw = raw.trim();
    if !question.is_objective() {
        return raw.to_string();
    }

    let options = question.options();
    if let Ok(index) = raw.parse::<usize>() {
        if let Some(option) = index.checked_sub(1).and_then(|i| options.get(i)) {
            return option.clone();
        }
    }
    options
        .iter()
        .find(|option| option.trim().eq_ignore_ascii_case(raw))
        .cloned()
        .unwrap_or_else(|| raw.to_string())
}

pub fn render_intro(quiz: &QuizDefinition) -> String {
    let mut out = format!("{}\n", quiz.title);
    if !quiz.description.trim().is_empty() {
        out.push_str(&format!("{}\n", quiz.description));
    }
    out.push_str(&format!("\nNumber of Questions: {}\n", quiz.questions.len()));
    out.push_str(&format!("Time Limit: {} minutes\n", quiz.time_limit_minutes));
    out
}

pub fn render_question(number: usize, question: &QuestionRef, current: Option<&str>) -> String {
    let mut out = format!("Question {number}: {}\n", question.text);
    if question.is_objective() {
        for (index, option) in question.options().iter().enumerate() {
            let marker = if current == Some(option.as_str()) { "(x)" } else { "( )" };
            out.push_str(&format!("  {marker} {}. {option}\n", index + 1));
        }
    } else {
        match current {
            Some(text) => out.push_str(&format!("  > {text}\n")),
            None => out.push_str("  > (free text answer)\n"),
        }
    }
    out
}

pub fn render_time_left(remaining_seconds: u64) -> String {
    format!("Time Left: {}", format_countdown(remaining_seconds))
}

/// Whether the countdown is worth announcing at this second.
pub fn should_announce(remaining_seconds: u64) -> bool {
    remaining_seconds > 0 && (remaining_seconds % 60 == 0 || remaining_seconds <= 10)
}
