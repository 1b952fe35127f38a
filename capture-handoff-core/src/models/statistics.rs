use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counters reported by the capture facility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureStatistics {
    /// Items seen by the facility.
    pub received: u64,
    /// Items the facility lost before delivery (buffer overruns, delivery errors).
    pub dropped: u64,
    /// Items dropped by the interface or driver, when known.
    pub if_dropped: u64,
}

/// Queue-side counters, read under the queue lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounters {
    /// Items accepted into a live buffer.
    pub appended: u64,
    /// Items discarded by the overflow policy.
    pub overflow_dropped: u64,
    /// Items the consumer processed successfully.
    pub processed: u64,
    /// Items whose processing failed.
    pub failed: u64,
    /// Non-empty buffers handed to the consumer.
    pub swaps: u64,
    /// Items currently waiting in the live buffer.
    pub queued: usize,
}

/// Point-in-time view combining facility and queue counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    pub taken_at: DateTime<Utc>,
    pub capture: CaptureStatistics,
    pub queue: QueueCounters,
}

impl StatisticsSnapshot {
    pub fn new(capture: CaptureStatistics, queue: QueueCounters) -> Self {
        Self {
            taken_at: Utc::now(),
            capture,
            queue,
        }
    }

    pub fn received(&self) -> u64 {
        self.capture.received
    }

    /// Drops on either side of the hand-off.
    pub fn dropped(&self) -> u64 {
        self.capture.dropped + self.capture.if_dropped + self.queue.overflow_dropped
    }

    pub fn processed(&self) -> u64 {
        self.queue.processed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropped_sums_both_sides() {
        let snapshot = StatisticsSnapshot::new(
            CaptureStatistics {
                received: 100,
                dropped: 3,
                if_dropped: 1,
            },
            QueueCounters {
                appended: 96,
                overflow_dropped: 2,
                processed: 90,
                ..Default::default()
            },
        );
        assert_eq!(snapshot.received(), 100);
        assert_eq!(snapshot.dropped(), 6);
        assert_eq!(snapshot.processed(), 90);
    }
}
