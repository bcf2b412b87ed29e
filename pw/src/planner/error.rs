//! Planner service error types

use thiserror::Error;

/// Errors from a single planner service call.
///
/// All of these are soft failures from the dispatcher's point of view: they
/// advance the tier state machine instead of surfacing to the caller. The
/// variants exist so diagnostics can distinguish failure causes.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("planner service timed out")]
    Timeout,

    #[error("planner service unreachable: {0}")]
    Unreachable(reqwest::Error),

    #[error("planner service returned http {status}")]
    Http { status: u16 },

    #[error("planner service returned an empty response")]
    EmptyReply,

    #[error("planner service returned an invalid response")]
    InvalidReply,
}

impl PlannerError {
    /// Short reason string recorded in the diagnostic trailer.
    ///
    /// These strings are operator-facing only; control flow never branches
    /// on them.
    pub fn reason(&self) -> String {
        match self {
            PlannerError::Timeout => "timed out".to_string(),
            PlannerError::Unreachable(_) => "unreachable".to_string(),
            PlannerError::Http { status } => format!("http {}", status),
            PlannerError::EmptyReply => "empty response".to_string(),
            PlannerError::InvalidReply => "invalid response".to_string(),
        }
    }

    /// Classify a transport-level failure
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PlannerError::Timeout
        } else {
            PlannerError::Unreachable(err)
        }
    }
}
