// src/session/mod.rs

mod answers;
mod clock;
mod controller;
mod gate;

pub use answers::AnswerStore;
pub use clock::{Clock, ClockListener};
pub use controller::{
    SessionController, SessionControllerBuilder, SessionState, SessionStatus, SubmitOutcome,
    SubmitTrigger,
};
pub use gate::SubmissionGate;
