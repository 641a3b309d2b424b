// src/error.rs

use reqwest::StatusCode;
use thiserror::Error;

use crate::session::SessionState;

/// Failures talking to the quiz service.
///
/// A response that arrives with a non-success status is kept apart from
/// transport failures so callers can show the server's own message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to quiz service failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("quiz service responded with {status}: {detail}")]
    Status { status: StatusCode, detail: String },

    #[error("cannot build endpoint URL: {0}")]
    Endpoint(String),
}

impl ApiError {
    /// Status code returned by the server, if the request got that far.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(err) => err.status(),
            ApiError::Endpoint(_) => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClockError {
    #[error("clock is already running")]
    AlreadyRunning,

    #[error("countdown duration must be at least one second")]
    ZeroDuration,

    #[error("no async runtime available to drive the clock")]
    NoRuntime,
}

/// Errors reported by the session controller.
///
/// Stale events (an edit or a duplicate submit after submission) are not
/// errors and never show up here.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot {action} while the session is {state}")]
    InvalidState {
        action: &'static str,
        state: SessionState,
    },

    #[error("attempt registration is already in progress")]
    StartPending,

    #[error("session has been torn down")]
    TornDown,

    #[error("failed to load quiz: {0}")]
    Load(#[source] ApiError),

    #[error("quiz definition is invalid: {0}")]
    InvalidQuiz(#[from] validator::ValidationErrors),

    #[error("failed to start attempt: {0}")]
    Registration(#[source] ApiError),

    #[error("failed to submit answers: {0}")]
    Submission(#[source] ApiError),

    #[error(transparent)]
    Clock(#[from] ClockError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Top-level error of the terminal front end.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
