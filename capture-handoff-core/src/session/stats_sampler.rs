use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Interval timer for statistics sampling on the delivery path.
///
/// Lock-free: `try_claim` is a load plus at most one compare-exchange, so a
/// caller that loses the race simply skips this sample instead of waiting.
#[derive(Debug)]
pub struct StatsSampler {
    origin: Instant,
    interval: Duration,
    next_due_nanos: AtomicU64,
}

impl StatsSampler {
    /// First sample becomes due one interval after construction.
    pub fn new(interval: Duration) -> Self {
        Self {
            origin: Instant::now(),
            interval,
            next_due_nanos: AtomicU64::new(duration_nanos(interval)),
        }
    }

    /// True at most once per interval. Claiming resets the timer.
    pub fn try_claim(&self) -> bool {
        let now = duration_nanos(self.origin.elapsed());
        let due = self.next_due_nanos.load(Ordering::Acquire);
        if now < due {
            return false;
        }
        let next = now.saturating_add(duration_nanos(self.interval));
        self.next_due_nanos
            .compare_exchange(due, next, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

fn duration_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}
