use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::models::config::{HandoffConfig, OverflowPolicy};
use crate::models::item::Item;
use crate::models::statistics::QueueCounters;
use crate::processing::item_buffer::ItemBuffer;

/// Everything behind the queue lock.
#[derive(Debug, Default)]
struct QueueState {
    live: ItemBuffer,
    shutdown: bool,
    counters: QueueCounters,
}

/// The live buffer, the shutdown flag and the queue counters, guarded by a
/// single `parking_lot::Mutex`.
///
/// Every operation holds the lock for O(1) work: one append, one buffer
/// replacement or one flag/counter update. The time the delivery thread
/// spends in `append` therefore does not depend on how slow the consumer is.
///
/// ```text
/// delivery thread ── append ──▶ [live buffer] ── swap ──▶ consumer thread
/// ```
#[derive(Debug)]
pub struct SharedQueue {
    state: Mutex<QueueState>,
    wake: Condvar,
    max_buffered: Option<usize>,
    overflow_policy: OverflowPolicy,
}

impl SharedQueue {
    pub fn new(config: &HandoffConfig) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            wake: Condvar::new(),
            max_buffered: config.max_buffered_items,
            overflow_policy: config.overflow_policy,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(&HandoffConfig::default())
    }

    /// Add an item to the live buffer.
    ///
    /// Returns false if the overflow policy discarded an item (the arriving
    /// one or the evicted head). Discarded items are freed after the lock is
    /// released.
    pub fn append(&self, item: Item) -> bool {
        let (discarded, was_empty) = {
            let mut s = self.state.lock();
            let was_empty = s.live.is_empty();
            let discarded = match self.max_buffered {
                Some(limit) => s.live.push_bounded(item, limit, self.overflow_policy),
                None => {
                    s.live.push(item);
                    None
                }
            };
            match (&discarded, self.overflow_policy, self.max_buffered) {
                (None, _, _) => s.counters.appended += 1,
                (Some(_), OverflowPolicy::DropOldest, Some(limit)) if limit > 0 => {
                    s.counters.appended += 1;
                    s.counters.overflow_dropped += 1;
                }
                (Some(_), _, _) => s.counters.overflow_dropped += 1,
            }
            (discarded, was_empty)
        };

        if was_empty {
            self.wake.notify_one();
        }
        if let Some(item) = &discarded {
            log::trace!("overflow: discarded item #{}", item.seq());
        }
        discarded.is_none()
    }

    /// Replace the live buffer with an empty one and return the old one.
    ///
    /// Items appended before the swap are in the returned buffer; items
    /// appended after it land in the new live buffer.
    pub fn swap(&self) -> ItemBuffer {
        let mut s = self.state.lock();
        let drained = std::mem::take(&mut s.live);
        if !drained.is_empty() {
            s.counters.swaps += 1;
        }
        drained
    }

    /// Poll and swap under one lock acquisition. None if the live buffer
    /// was empty, in which case nothing changes.
    pub fn swap_if_nonempty(&self) -> Option<ItemBuffer> {
        let mut s = self.state.lock();
        if s.live.is_empty() {
            return None;
        }
        s.counters.swaps += 1;
        Some(std::mem::take(&mut s.live))
    }

    /// Set the shutdown flag and wake a waiting consumer. Idempotent.
    pub fn request_shutdown(&self) {
        let first = {
            let mut s = self.state.lock();
            !std::mem::replace(&mut s.shutdown, true)
        };
        if first {
            log::debug!("shutdown requested");
        }
        self.wake.notify_all();
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.state.lock().shutdown
    }

    /// Block for at most `timeout` unless there is work or shutdown is
    /// already requested. Woken early by `append` into an empty buffer and
    /// by `request_shutdown`.
    pub fn wait_for_work(&self, timeout: Duration) {
        let mut s = self.state.lock();
        if s.live.is_empty() && !s.shutdown {
            self.wake.wait_for(&mut s, timeout);
        }
    }

    /// Fold the outcome of one drain into the counters.
    pub fn record_processed(&self, processed: u64, failed: u64) {
        let mut s = self.state.lock();
        s.counters.processed += processed;
        s.counters.failed += failed;
    }

    pub fn len(&self) -> usize {
        self.state.lock().live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().live.is_empty()
    }

    pub fn counters(&self) -> QueueCounters {
        let s = self.state.lock();
        QueueCounters {
            queued: s.live.len(),
            ..s.counters
        }
    }
}
