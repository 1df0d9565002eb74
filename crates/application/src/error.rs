//! Application error types

use thiserror::Error;
use varscope_domain::{DomainError, Fault, FaultOrigin, FetchKind, GateState, LoadGate};

/// Application-level errors.
///
/// `Fetch` and `Resolution` faults are not recovered by the view that
/// raised them: they replace it with a fallback. `Commit` and `Validation`
/// keep the editing session open so the user can retry or abandon.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// A domain validation error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// A scope fetch failed.
    #[error("failed to load {kind}: {message}")]
    Fetch {
        /// Which fetch failed.
        kind: FetchKind,
        /// Error reported by the collaborator.
        message: String,
    },

    /// Saving or deleting a variable failed.
    #[error("commit failed: {0}")]
    Commit(String),

    /// The resolution context could not be composed.
    #[error("resolution failed: {0}")]
    Resolution(String),

    /// The draft violates validation rules.
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// A plugin failed.
    #[error("plugin error: {0}")]
    Plugin(String),

    /// The session does not accept changes.
    #[error("session is read-only")]
    ReadOnly,

    /// No editing session is open.
    #[error("no editing session is open")]
    SessionClosed,

    /// The delete confirmation is not open.
    #[error("delete confirmation is not open")]
    NotConfirming,

    /// The view is still loading or shows its fallback.
    #[error("view is not ready")]
    NotReady,

    /// The hosting view was torn down.
    #[error("operation cancelled")]
    Cancelled,
}

impl ApplicationError {
    /// Returns the fault this error raises in a fault boundary, if it is one
    /// that is not recovered locally.
    #[must_use]
    pub fn to_fault(&self) -> Option<Fault> {
        match self {
            Self::Fetch { kind, message } => Some(Fault::fetch(*kind, message.clone())),
            Self::Resolution(message) => Some(Fault::resolution(message.clone())),
            _ => None,
        }
    }
}

impl From<&Fault> for ApplicationError {
    fn from(fault: &Fault) -> Self {
        match fault.origin {
            FaultOrigin::Fetch(kind) => Self::Fetch {
                kind,
                message: fault.message.clone(),
            },
            FaultOrigin::Resolution => Self::Resolution(fault.message.clone()),
            FaultOrigin::Render => Self::Plugin(fault.message.clone()),
        }
    }
}

/// Returns `Ok` once `gate` is ready.
///
/// # Errors
/// Returns `ApplicationError::NotReady` while loading, or the error of the
/// fault the gate caught.
pub fn ensure_ready(gate: &LoadGate) -> ApplicationResult<()> {
    match gate.state() {
        GateState::Ready => Ok(()),
        GateState::Loading { .. } => Err(ApplicationError::NotReady),
        GateState::Faulted { fault } => Err(ApplicationError::from(&fault)),
    }
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
