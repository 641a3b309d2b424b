// src/lib.rs

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod presenter;
pub mod routes;
pub mod session;
pub mod terminal;
pub mod utils;

pub use api::{HttpQuizApi, QuizApi};
pub use error::{ApiError, AppError, ClockError, ConfigError, SessionError};
pub use presenter::ResultView;
pub use session::{SessionController, SessionState, SessionStatus, SubmitOutcome, SubmitTrigger};
