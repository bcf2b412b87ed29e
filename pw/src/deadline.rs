//! Deadline clock for request budgets

use std::time::{Duration, Instant};

/// Wall-clock budget for a single plan request.
///
/// Every tier consults the same deadline before starting: a tier is skipped
/// entirely (never merely shortened) when the remaining budget is below its
/// minimum viable duration.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started_at: Instant,
    budget: Duration,
}

impl Deadline {
    /// Start a new deadline with the given overall budget
    pub fn start(budget: Duration) -> Self {
        Self {
            started_at: Instant::now(),
            budget,
        }
    }

    /// Remaining budget, floored at zero
    pub fn remaining(&self) -> Duration {
        self.budget.saturating_sub(self.started_at.elapsed())
    }

    /// Whether the budget is exhausted
    pub fn expired(&self) -> bool {
        self.remaining() == Duration::ZERO
    }

    /// Whether a tier with the given minimum viable duration may start
    pub fn allows(&self, min_viable: Duration) -> bool {
        self.remaining() >= min_viable
    }

    /// Time spent since the deadline started
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    #[cfg(test)]
    fn backdated(budget: Duration, elapsed: Duration) -> Self {
        Self {
            started_at: Instant::now() - elapsed,
            budget,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_deadline_has_full_budget() {
        let d = Deadline::start(Duration::from_secs(30));

        assert!(!d.expired());
        assert!(d.remaining() <= Duration::from_secs(30));
        assert!(d.remaining() > Duration::from_secs(29));
    }

    #[test]
    fn test_remaining_floors_at_zero() {
        let d = Deadline::backdated(Duration::from_millis(100), Duration::from_secs(5));

        assert_eq!(d.remaining(), Duration::ZERO);
        assert!(d.expired());
    }

    #[test]
    fn test_allows_tier_admission() {
        let d = Deadline::backdated(Duration::from_secs(10), Duration::from_secs(9));

        assert!(d.allows(Duration::from_millis(500)));
        assert!(!d.allows(Duration::from_secs(2)));
    }

    #[test]
    fn test_expired_deadline_allows_nothing() {
        let d = Deadline::backdated(Duration::from_secs(1), Duration::from_secs(2));

        assert!(!d.allows(Duration::from_millis(1)));
        assert!(d.allows(Duration::ZERO));
    }
}
