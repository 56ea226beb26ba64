use thiserror::Error;

use crate::models::SessionStatus;

/// Failures surfaced to callers of the store and the runner.
///
/// Cancellation is deliberately absent: an interrupted wait is an expected
/// outcome, see [`crate::timer::WaitOutcome`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("session {id} is {status}")]
    InvalidState { id: u64, status: SessionStatus },
    #[error("session {0} is already running")]
    AlreadyRunning(u64),
    #[error("session {0} not found")]
    NotFound(u64),
}
