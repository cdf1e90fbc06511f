//! Run budget: a unit count, a wall-clock deadline, and a cancel flag.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use super::cancellation::{Cancellable, CancellationToken};

/// Cooperative budget shared by the workers of one operation.
///
/// Workers call [`Budget::try_acquire`] before starting each unit (a file,
/// a commit). Once it returns `false` no new unit may start; units already
/// in flight finish normally. Callers then read [`Budget::is_exhausted`]
/// to mark their result partial.
#[derive(Debug)]
pub struct Budget {
    max_units: Option<usize>,
    deadline: Option<Instant>,
    consumed: AtomicUsize,
    exhausted: AtomicBool,
    token: CancellationToken,
}

impl Budget {
    pub fn unbounded() -> Self {
        Self {
            max_units: None,
            deadline: None,
            consumed: AtomicUsize::new(0),
            exhausted: AtomicBool::new(false),
            token: CancellationToken::new(),
        }
    }

    pub fn with_units(max_units: usize) -> Self {
        Self {
            max_units: Some(max_units),
            ..Self::unbounded()
        }
    }

    /// Build from optional limits, as read from settings.
    pub fn from_limits(max_units: Option<usize>, time_limit: Option<Duration>) -> Self {
        let budget = Self {
            max_units,
            ..Self::unbounded()
        };
        match time_limit {
            Some(limit) => budget.deadline_in(limit),
            None => budget,
        }
    }

    /// Add a wall-clock deadline `limit` from now.
    pub fn deadline_in(mut self, limit: Duration) -> Self {
        self.deadline = Some(Instant::now() + limit);
        self
    }

    /// Share an external cancellation token.
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Claim one unit. Returns `false` once the unit count, the deadline or
    /// cancellation stops further work.
    pub fn try_acquire(&self) -> bool {
        if self.token.is_cancelled() {
            self.exhausted.store(true, Ordering::SeqCst);
            return false;
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                self.exhausted.store(true, Ordering::SeqCst);
                return false;
            }
        }
        let acquired = match self.max_units {
            None => {
                self.consumed.fetch_add(1, Ordering::Relaxed);
                true
            }
            Some(max) => self
                .consumed
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                    (used < max).then_some(used + 1)
                })
                .is_ok(),
        };
        if !acquired {
            self.exhausted.store(true, Ordering::SeqCst);
        }
        acquired
    }

    /// True once any acquisition has been refused.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted.load(Ordering::SeqCst)
    }

    /// Units claimed so far.
    pub fn consumed(&self) -> usize {
        self.consumed.load(Ordering::Acquire)
    }

    pub fn max_units(&self) -> Option<usize> {
        self.max_units
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Default for Budget {
    fn default() -> Self {
        Self::unbounded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_budget_refuses_after_limit() {
        let budget = Budget::with_units(2);
        assert!(budget.try_acquire());
        assert!(budget.try_acquire());
        assert!(!budget.is_exhausted());
        assert!(!budget.try_acquire());
        assert!(budget.is_exhausted());
        assert_eq!(budget.consumed(), 2);
    }

    #[test]
    fn zero_deadline_is_exhausted_immediately() {
        let budget = Budget::unbounded().deadline_in(Duration::ZERO);
        assert!(!budget.try_acquire());
        assert!(budget.is_exhausted());
    }

    #[test]
    fn cancellation_stops_acquisition() {
        let token = CancellationToken::new();
        let budget = Budget::unbounded().with_token(token.clone());
        assert!(budget.try_acquire());
        token.cancel();
        assert!(!budget.try_acquire());
        assert!(budget.is_exhausted());
    }

    #[test]
    fn concurrent_acquisition_never_overshoots() {
        use rayon::prelude::*;

        let budget = Budget::with_units(50);
        let granted = (0..1_000)
            .into_par_iter()
            .filter(|_| budget.try_acquire())
            .count();
        assert_eq!(granted, 50);
        assert_eq!(budget.consumed(), 50);
    }
}
