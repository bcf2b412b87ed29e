//! Planner service tier
//!
//! Client for the network-reachable planner service: wire types, a typed
//! error taxonomy, and the `PlannerService` seam the dispatcher calls
//! through (so tests can substitute a scripted mock).

pub mod client;
mod error;
mod http;
mod types;

pub use client::PlannerService;
pub use error::PlannerError;
pub use http::HttpPlannerClient;
pub use types::{MessageType, PlanReply, PlanRequest};
