//! Planning request dispatch
//!
//! The tiered-fallback state machine and its outcome types. One dispatcher
//! handles every request for the process lifetime; requests are independent
//! tasks sharing only read-only configuration and the spawn limiter.

mod dispatcher;
mod outcome;

pub use dispatcher::{Dispatcher, DispatcherConfig};
pub use outcome::{DispatchError, DispatchResult, SourceTier, TierOutcome};
