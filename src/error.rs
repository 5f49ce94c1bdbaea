//! Error types and handling
//!
//! The session-level error taxonomy. Backend and state machine failures
//! converge here; nothing in this crate panics across the session boundary.

use thiserror::Error;

use crate::capture::BackendError;
use crate::recorder::state::TransitionError;

/// Errors reported by the session controller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// A command was issued in a state where it is not legal.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Configuration change attempted while a session is underway.
    #[error("session is busy; options can only be replaced while idle")]
    SessionBusy,

    /// The capture backend failed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The session's worker task has shut down.
    #[error("recording session has terminated")]
    Terminated,
}

/// Result type alias using SessionError.
pub type SessionResult<T> = Result<T, SessionError>;
