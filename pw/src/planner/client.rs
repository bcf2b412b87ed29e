//! PlannerService trait definition

use async_trait::async_trait;
use std::time::Duration;

use crate::dispatch::TierOutcome;

use super::PlanRequest;

/// One bounded-duration call to the planner service.
///
/// Implementations issue exactly one request per call and honor the supplied
/// timeout; retries are a dispatcher-level policy and the dispatcher mandates
/// none. Every failure mode is folded into the returned [`TierOutcome`] so
/// the tier state machine never has to unwind an error.
#[async_trait]
pub trait PlannerService: Send + Sync {
    /// Ask the service to plan. `timeout` is a hard upper bound on the call.
    async fn call(&self, req: &PlanRequest, timeout: Duration) -> TierOutcome;
}
