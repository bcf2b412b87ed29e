//! Tier outcomes and dispatch results

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result of attempting one tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TierOutcome {
    /// The tier produced a payload (raw; the dispatcher normalizes it)
    Success(String),
    /// Expected, recoverable failure: advance to the next tier
    SoftFailure(String),
    /// Unrecoverable failure: short-circuit with a caller error
    HardFailure(String),
}

/// Which tier produced the final answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTier {
    Service,
    Process,
    Fallback,
}

impl fmt::Display for SourceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceTier::Service => write!(f, "service"),
            SourceTier::Process => write!(f, "process"),
            SourceTier::Fallback => write!(f, "fallback"),
        }
    }
}

/// Final answer handed back to the chat layer.
///
/// `degraded` is a rendering hint only; the chat layer must never block on
/// `diagnostic`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResult {
    pub markdown: String,
    pub degraded: bool,
    pub source_tier: SourceTier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

/// The only errors that cross the dispatcher boundary.
///
/// Every upstream failure is folded into tier outcomes instead; callers see
/// an error solely for requests that were malformed to begin with.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("missing 'query'")]
    MissingQuery,

    #[error("planner rejected request: {0}")]
    Rejected(String),
}
