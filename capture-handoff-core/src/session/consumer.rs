use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::models::config::{HandoffConfig, WakeStrategy};
use crate::models::state::ConsumerState;
use crate::processing::item_buffer::ItemBuffer;
use crate::session::shared_queue::SharedQueue;
use crate::traits::handoff_delegate::HandoffDelegate;
use crate::traits::item_processor::ItemProcessor;

/// What the consumer hands back when it terminates.
#[derive(Debug)]
pub struct ConsumerReport<P> {
    pub processor: P,
    pub processed: u64,
    pub failed: u64,
    /// Non-empty buffers drained.
    pub drains: u64,
    /// Times the live buffer was checked for work.
    pub polls: u64,
    /// Items still in the live buffer after termination. Non-zero only when
    /// the producer kept appending after shutdown was requested.
    pub stragglers: usize,
}

/// Observable consumer state, shared with the coordinator.
#[derive(Debug, Clone, Default)]
pub(crate) struct StateCell(Arc<AtomicU8>);

impl StateCell {
    pub(crate) fn get(&self) -> ConsumerState {
        ConsumerState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn set(&self, state: ConsumerState) -> bool {
        self.0.swap(state.as_u8(), Ordering::AcqRel) != state.as_u8()
    }
}

/// Background loop that moves items from the shared queue to a processor.
///
/// ```text
/// Idle ──(non-empty)──▶ Draining ──(done)──▶ Idle
///   │ (empty: wait one backoff)
///   └──(shutdown seen, from any state)──▶ Stopping ──(final drain)──▶ Terminated
/// ```
///
/// The queue lock is only taken to poll and swap; items are processed with
/// the lock released.
pub struct ConsumerLoop<P: ItemProcessor> {
    queue: Arc<SharedQueue>,
    processor: P,
    backoff: Duration,
    wake: WakeStrategy,
    delegate: Arc<dyn HandoffDelegate>,
    state: StateCell,
    processed: u64,
    failed: u64,
    drains: u64,
    polls: u64,
}

impl<P: ItemProcessor> ConsumerLoop<P> {
    pub fn new(
        queue: Arc<SharedQueue>,
        processor: P,
        config: &HandoffConfig,
        delegate: Arc<dyn HandoffDelegate>,
    ) -> Self {
        Self {
            queue,
            processor,
            backoff: config.backoff(),
            wake: config.wake_strategy,
            delegate,
            state: StateCell::default(),
            processed: 0,
            failed: 0,
            drains: 0,
            polls: 0,
        }
    }

    pub(crate) fn state_cell(&self) -> StateCell {
        self.state.clone()
    }

    /// Run until shutdown is observed and the final drain completes.
    pub fn run(mut self) -> ConsumerReport<P> {
        self.state.set(ConsumerState::Idle);
        self.delegate.on_consumer_state_changed(ConsumerState::Idle);

        loop {
            if self.queue.is_shutdown_requested() {
                self.transition(ConsumerState::Stopping);
                self.polls += 1;
                if let Some(buffer) = self.queue.swap_if_nonempty() {
                    self.drain(buffer);
                }
                break;
            }

            self.polls += 1;
            match self.queue.swap_if_nonempty() {
                Some(buffer) => {
                    self.transition(ConsumerState::Draining);
                    self.drain(buffer);
                    self.transition(ConsumerState::Idle);
                }
                None => self.idle_wait(),
            }
        }

        self.processor.finish();

        let stragglers = self.queue.len();
        if stragglers > 0 {
            log::warn!(
                "{} items appended after the final drain were not processed; stop capture before requesting shutdown",
                stragglers
            );
        }
        log::info!(
            "consumer terminated: {} processed, {} failed, {} drains",
            self.processed,
            self.failed,
            self.drains
        );
        self.transition(ConsumerState::Terminated);

        ConsumerReport {
            processor: self.processor,
            processed: self.processed,
            failed: self.failed,
            drains: self.drains,
            polls: self.polls,
            stragglers,
        }
    }

    fn idle_wait(&self) {
        match self.wake {
            WakeStrategy::Poll => thread::sleep(self.backoff),
            WakeStrategy::Notify => self.queue.wait_for_work(self.backoff),
        }
    }

    fn drain(&mut self, buffer: ItemBuffer) {
        let mut processed = 0u64;
        let mut failed = 0u64;
        log::debug!("draining {} items", buffer.len());

        for item in buffer {
            match self.processor.process(&item) {
                Ok(()) => processed += 1,
                Err(e) => {
                    log::warn!("skipping item: {}", e);
                    self.delegate.on_processing_error(&item, &e);
                    failed += 1;
                }
            }
        }

        self.queue.record_processed(processed, failed);
        self.processed += processed;
        self.failed += failed;
        self.drains += 1;
    }

    fn transition(&self, state: ConsumerState) {
        if self.state.set(state) {
            log::trace!("consumer → {}", state);
            self.delegate.on_consumer_state_changed(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    use chrono::Utc;
    use parking_lot::Mutex;

    use crate::models::error::ProcessingError;
    use crate::models::item::Item;
    use crate::traits::handoff_delegate::NoopDelegate;

    #[derive(Default)]
    struct Collect {
        seqs: Vec<u64>,
        finished: bool,
    }

    impl ItemProcessor for Collect {
        fn process(&mut self, item: &Item) -> Result<(), ProcessingError> {
            self.seqs.push(item.seq());
            Ok(())
        }

        fn finish(&mut self) {
            self.finished = true;
        }
    }

    struct RejectOdd(Vec<u64>);

    impl ItemProcessor for RejectOdd {
        fn process(&mut self, item: &Item) -> Result<(), ProcessingError> {
            if item.seq() % 2 == 1 {
                return Err(ProcessingError::Rejected {
                    seq: item.seq(),
                    reason: "odd".into(),
                });
            }
            self.0.push(item.seq());
            Ok(())
        }
    }

    #[derive(Default)]
    struct Transitions(Mutex<Vec<ConsumerState>>);

    impl HandoffDelegate for Transitions {
        fn on_consumer_state_changed(&self, state: ConsumerState) {
            self.0.lock().push(state);
        }
    }

    fn item(seq: u64) -> Item {
        Item::new(seq, Utc::now(), 4, vec![0; 4])
    }

    fn config(backoff_ms: u64) -> HandoffConfig {
        HandoffConfig {
            backoff_ms,
            ..Default::default()
        }
    }

    #[test]
    fn drains_everything_queued_before_shutdown() {
        let queue = Arc::new(SharedQueue::unbounded());
        for seq in [10, 11, 12] {
            queue.append(item(seq));
        }
        queue.request_shutdown();

        let consumer = ConsumerLoop::new(
            Arc::clone(&queue),
            Collect::default(),
            &config(10),
            Arc::new(NoopDelegate),
        );
        let report = consumer.run();

        assert_eq!(report.processor.seqs, vec![10, 11, 12]);
        assert!(report.processor.finished);
        assert_eq!(report.processed, 3);
        assert_eq!(report.stragglers, 0);
        assert_eq!(queue.counters().processed, 3);
    }

    #[test]
    fn processing_errors_are_skipped() {
        let queue = Arc::new(SharedQueue::unbounded());
        for seq in 0..6 {
            queue.append(item(seq));
        }
        queue.request_shutdown();

        let report = ConsumerLoop::new(
            Arc::clone(&queue),
            RejectOdd(Vec::new()),
            &config(10),
            Arc::new(NoopDelegate),
        )
        .run();

        assert_eq!(report.processor.0, vec![0, 2, 4]);
        assert_eq!(report.processed, 3);
        assert_eq!(report.failed, 3);
        assert_eq!(queue.counters().failed, 3);
    }

    #[test]
    fn shutdown_with_empty_queue_goes_idle_stopping_terminated() {
        let queue = Arc::new(SharedQueue::unbounded());
        queue.request_shutdown();
        let transitions = Arc::new(Transitions::default());

        let report = ConsumerLoop::new(queue, Collect::default(), &config(10), transitions.clone()).run();

        assert_eq!(report.drains, 0);
        assert_eq!(
            *transitions.0.lock(),
            vec![
                ConsumerState::Idle,
                ConsumerState::Stopping,
                ConsumerState::Terminated
            ]
        );
    }

    #[test]
    fn idle_polls_are_bounded_by_backoff() {
        for wake in [WakeStrategy::Poll, WakeStrategy::Notify] {
            let queue = Arc::new(SharedQueue::unbounded());
            let config = HandoffConfig {
                backoff_ms: 50,
                wake_strategy: wake,
                ..Default::default()
            };
            let consumer = ConsumerLoop::new(
                Arc::clone(&queue),
                Collect::default(),
                &config,
                Arc::new(NoopDelegate),
            );

            let start = Instant::now();
            let handle = thread::spawn(move || consumer.run());
            thread::sleep(Duration::from_millis(300));
            queue.request_shutdown();
            let report = handle.join().unwrap();
            let elapsed_ms = start.elapsed().as_millis() as u64;

            // One poll per interval, plus the first poll and the final one.
            assert!(
                report.polls <= elapsed_ms / 50 + 2,
                "{:?}: {} polls in {}ms",
                wake,
                report.polls,
                elapsed_ms
            );
        }
    }

    #[test]
    fn notify_strategy_wakes_before_backoff_expires() {
        let queue = Arc::new(SharedQueue::unbounded());
        let config = HandoffConfig {
            backoff_ms: 10_000,
            wake_strategy: WakeStrategy::Notify,
            ..Default::default()
        };
        let consumer = ConsumerLoop::new(
            Arc::clone(&queue),
            Collect::default(),
            &config,
            Arc::new(NoopDelegate),
        );

        let start = Instant::now();
        let handle = thread::spawn(move || consumer.run());
        thread::sleep(Duration::from_millis(20));
        queue.append(item(1));
        thread::sleep(Duration::from_millis(20));
        queue.request_shutdown();
        let report = handle.join().unwrap();

        assert!(start.elapsed() < Duration::from_secs(5));
        assert_eq!(report.processor.seqs, vec![1]);
    }

    #[test]
    fn reports_stragglers_appended_after_termination_check() {
        // A producer that outlives shutdown leaves items behind; the final
        // drain cannot see them. Simulate by appending from the processor.
        struct AppendDuringDrain(Arc<SharedQueue>);

        impl ItemProcessor for AppendDuringDrain {
            fn process(&mut self, item: &Item) -> Result<(), ProcessingError> {
                self.0.append(Item::new(item.seq() + 100, Utc::now(), 0, Vec::new()));
                Ok(())
            }
        }

        let queue = Arc::new(SharedQueue::unbounded());
        queue.append(item(0));
        queue.request_shutdown();

        let report = ConsumerLoop::new(
            Arc::clone(&queue),
            AppendDuringDrain(Arc::clone(&queue)),
            &config(10),
            Arc::new(NoopDelegate),
        )
        .run();

        assert_eq!(report.processed, 1);
        assert_eq!(report.stragglers, 1);
    }
}
