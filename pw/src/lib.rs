//! Planwise - planning request dispatcher for conversational trip planning
//!
//! Given a user query and a session identifier, Planwise produces a usable
//! itinerary within a hard wall-clock deadline, even though the planners it
//! depends on may hang, crash, or return malformed output. Three tiers are
//! attempted in strict priority order:
//!
//! - **Service**: one bounded call to the long-running planner service
//! - **Process**: one supervised run of the ephemeral planner process
//! - **Fallback**: an always-valid synthesized quick plan
//!
//! Quality degrades silently under pressure; availability never does. The
//! only caller-visible error is a malformed request.
//!
//! # Modules
//!
//! - [`dispatch`] - The tiered-fallback state machine and outcome types
//! - [`deadline`] - Request budget clock consulted before every tier
//! - [`planner`] - Planner service client trait and HTTP implementation
//! - [`process`] - Ephemeral planner process resolution and supervision
//! - [`parse`] - Itinerary payload extraction strategy
//! - [`fallback`] - Trivial-query handling and fallback synthesis
//! - [`api`] - HTTP surface consumed by the chat layer
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod api;
pub mod cli;
pub mod config;
pub mod deadline;
pub mod dispatch;
pub mod fallback;
pub mod parse;
pub mod planner;
pub mod process;

// Re-export commonly used types
pub use config::Config;
pub use deadline::Deadline;
pub use dispatch::{DispatchError, DispatchResult, Dispatcher, DispatcherConfig, SourceTier, TierOutcome};
pub use parse::{DelimiterParser, ITINERARY_DELIMITER, PayloadParser};
pub use planner::{HttpPlannerClient, MessageType, PlanReply, PlanRequest, PlannerError, PlannerService};
pub use process::{
    KILLED_MARKER, PlannerRunner, ProcessRunner, ProcessStatus, ResolvedCommand, RunOutcome, probe_path,
    resolve_command,
};
