use crate::phase::{Action, Phase};
use thiserror::Error;

/// Failure of a single remote call, normalized for display.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CallError {
    /// Network or parse failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// Well-formed reply carrying a non-empty `error` field.
    #[error("{0}")]
    Remote(String),
}

impl CallError {
    /// Treat a reply's `error` field as a remote failure when non-empty.
    pub fn from_reply_field(error: &str) -> Option<Self> {
        let e = error.trim();
        (!e.is_empty()).then(|| CallError::Remote(e.to_string()))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("cannot {action} while {phase}")]
    Rejected { action: Action, phase: Phase },
    #[error("{action} already in progress")]
    Pending { action: Action },
    #[error("{action} failed: {message}")]
    StepFailed { action: Action, message: String },
    #[error("timed out waiting for {action} to complete")]
    StepTimeout { action: Action },
    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
