use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::statistics::StatisticsSnapshot;

/// Result returned when a capture session completes.
///
/// Serializable for the JSON sidecar written by `storage::summary`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub id: String,
    pub device: String,
    pub started_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub processed: u64,
    pub failed: u64,
    /// Items left in the live buffer after the consumer terminated.
    pub stragglers: usize,
    pub final_statistics: StatisticsSnapshot,
}

impl RunSummary {
    pub fn new(
        device: &str,
        started_at: DateTime<Utc>,
        duration_secs: f64,
        processed: u64,
        failed: u64,
        stragglers: usize,
        final_statistics: StatisticsSnapshot,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            device: device.to_string(),
            started_at,
            duration_secs,
            processed,
            failed,
            stragglers,
            final_statistics,
        }
    }

    /// True when nothing was left in the live buffer after the final drain.
    pub fn is_fully_drained(&self) -> bool {
        self.stragglers == 0 && self.final_statistics.queue.queued == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::statistics::{CaptureStatistics, QueueCounters};

    #[test]
    fn new_assigns_unique_ids() {
        let snapshot = StatisticsSnapshot::new(CaptureStatistics::default(), QueueCounters::default());
        let a = RunSummary::new("synth0", Utc::now(), 1.0, 0, 0, 0, snapshot.clone());
        let b = RunSummary::new("synth0", Utc::now(), 1.0, 0, 0, 0, snapshot);
        assert_ne!(a.id, b.id);
        assert!(a.is_fully_drained());
    }

    #[test]
    fn stragglers_mean_not_drained() {
        let snapshot = StatisticsSnapshot::new(
            CaptureStatistics::default(),
            QueueCounters {
                appended: 5,
                processed: 4,
                queued: 1,
                ..Default::default()
            },
        );
        let summary = RunSummary::new("synth0", Utc::now(), 0.5, 4, 0, 1, snapshot);
        assert!(!summary.is_fully_drained());
    }
}
