use std::sync::Arc;
use std::time::Duration;

use crate::models::item::Item;
use crate::models::statistics::StatisticsSnapshot;
use crate::session::shared_queue::SharedQueue;
use crate::session::stats_sampler::StatsSampler;
use crate::traits::capture_device::{ItemCallback, StatisticsSource};
use crate::traits::handoff_delegate::HandoffDelegate;

/// Per-item work done on the capture facility's delivery thread.
///
/// Appends to the shared queue, then, outside the queue lock, emits a
/// statistics sample if the sampling interval has elapsed. Never waits on
/// the consumer and never handles delivery errors; those stay with the
/// facility.
pub struct ProducerPath {
    queue: Arc<SharedQueue>,
    stats: Arc<dyn StatisticsSource>,
    sampler: Option<StatsSampler>,
    delegate: Arc<dyn HandoffDelegate>,
}

impl ProducerPath {
    /// `stats_interval` of None disables sampling.
    pub fn new(
        queue: Arc<SharedQueue>,
        stats: Arc<dyn StatisticsSource>,
        stats_interval: Option<Duration>,
        delegate: Arc<dyn HandoffDelegate>,
    ) -> Self {
        Self {
            queue,
            stats,
            sampler: stats_interval.map(StatsSampler::new),
            delegate,
        }
    }

    pub fn on_item(&self, item: Item) {
        self.queue.append(item);

        if let Some(sampler) = &self.sampler {
            if sampler.try_claim() {
                self.emit_sample();
            }
        }
    }

    /// Combine facility and queue counters into a snapshot.
    pub fn snapshot(&self) -> Option<StatisticsSnapshot> {
        match self.stats.statistics() {
            Ok(capture) => Some(StatisticsSnapshot::new(capture, self.queue.counters())),
            Err(e) => {
                log::debug!("statistics unavailable: {}", e);
                None
            }
        }
    }

    fn emit_sample(&self) {
        let Some(snapshot) = self.snapshot() else {
            return;
        };
        log::debug!(
            "received:{} dropped:{} queued:{} processed:{}",
            snapshot.received(),
            snapshot.dropped(),
            snapshot.queue.queued,
            snapshot.processed()
        );
        self.delegate.on_statistics(&snapshot);
    }

    /// Wrap into the callback shape `CaptureDevice::on_item_arrival` takes.
    pub fn into_callback(self) -> ItemCallback {
        let path = Arc::new(self);
        Arc::new(move |item: Item| path.on_item(item))
    }
}
