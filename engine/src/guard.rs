use std::{
    cell::Cell,
    time::{Duration, Instant},
};

use plan::CancelToken;

/// Per-stage watchdog: one monotonic-clock check and one cancellation
/// poll per inner-loop iteration.
pub(crate) struct StageGuard<'a> {
    start: Instant,
    budget: Duration,
    cancel: Option<&'a CancelToken>,
    timed_out: Cell<bool>,
    cancelled: Cell<bool>,
}

impl<'a> StageGuard<'a> {
    pub fn new(timeout_ms: u64, cancel: Option<&'a CancelToken>) -> Self {
        StageGuard {
            start: Instant::now(),
            budget: Duration::from_millis(timeout_ms),
            cancel,
            timed_out: Cell::new(false),
            cancelled: Cell::new(false),
        }
    }

    /// False once the stage should stop; latches the reason.
    pub fn keep_going(&self) -> bool {
        if self.cancelled.get() || self.timed_out.get() {
            return false;
        }
        if self.cancel.is_some_and(CancelToken::is_cancelled) {
            self.cancelled.set(true);
            return false;
        }
        if self.start.elapsed() >= self.budget {
            self.timed_out.set(true);
            return false;
        }
        true
    }

    pub fn timed_out(&self) -> bool {
        self.timed_out.get()
    }

    pub fn cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latches_cancellation() {
        let token = CancelToken::new();
        let guard = StageGuard::new(60_000, Some(&token));
        assert!(guard.keep_going());
        token.cancel();
        assert!(!guard.keep_going());
        assert!(guard.cancelled());
        assert!(!guard.timed_out());
    }

    #[test]
    fn zero_budget_times_out() {
        let guard = StageGuard::new(0, None);
        assert!(!guard.keep_going());
        assert!(guard.timed_out());
    }
}
