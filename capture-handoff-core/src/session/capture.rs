use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::models::config::{HandoffConfig, OpenOptions};
use crate::models::error::HandoffError;
use crate::models::run_summary::RunSummary;
use crate::models::state::{ConsumerState, SessionState};
use crate::models::statistics::{CaptureStatistics, StatisticsSnapshot};
use crate::session::coordinator::ShutdownCoordinator;
use crate::session::producer::ProducerPath;
use crate::session::shared_queue::SharedQueue;
use crate::traits::capture_device::CaptureDevice;
use crate::traits::handoff_delegate::{HandoffDelegate, NoopDelegate};
use crate::traits::item_processor::ItemProcessor;

/// A finished run: the summary plus the processor handed back by the consumer.
#[derive(Debug)]
pub struct Completion<P> {
    pub summary: RunSummary,
    pub processor: P,
}

/// Drives one device through a capture window with the hand-off in between.
///
/// ```text
/// [CaptureDevice] ─callback─▶ ProducerPath ─append─▶ SharedQueue ─swap─▶ ConsumerLoop ─▶ ItemProcessor
/// ```
///
/// Enforces the shutdown order: capture is stopped before the consumer is
/// asked to stop, so the consumer's final drain sees every delivered item.
pub struct CaptureSession<D: CaptureDevice, P: ItemProcessor> {
    device: D,
    config: HandoffConfig,
    open_options: OpenOptions,
    delegate: Arc<dyn HandoffDelegate>,
    state: SessionState,
    coordinator: Option<ShutdownCoordinator<P>>,
    started: Option<(DateTime<Utc>, Instant)>,
}

impl<D: CaptureDevice, P: ItemProcessor> CaptureSession<D, P> {
    pub fn new(device: D, config: HandoffConfig) -> Result<Self, HandoffError> {
        config.validate()?;
        Ok(Self {
            device,
            config,
            open_options: OpenOptions::default(),
            delegate: Arc::new(NoopDelegate),
            state: SessionState::Idle,
            coordinator: None,
            started: None,
        })
    }

    pub fn with_open_options(mut self, options: OpenOptions) -> Self {
        self.open_options = options;
        self
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn HandoffDelegate>) {
        self.delegate = delegate;
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn config(&self) -> &HandoffConfig {
        &self.config
    }

    /// Consumer state while capturing, None otherwise.
    pub fn consumer_state(&self) -> Option<ConsumerState> {
        self.coordinator.as_ref().map(ShutdownCoordinator::consumer_state)
    }

    /// Live snapshot of facility and queue counters while capturing.
    pub fn snapshot(&self) -> Option<StatisticsSnapshot> {
        let coordinator = self.coordinator.as_ref()?;
        let capture = self.device.statistics().ok()?;
        Some(StatisticsSnapshot::new(capture, coordinator.queue().counters()))
    }

    /// Open the device. Transitions: idle → opened.
    pub fn open(&mut self) -> Result<(), HandoffError> {
        if !matches!(self.state, SessionState::Idle) {
            return Err(HandoffError::InvalidState("can only open from idle state".into()));
        }

        let name = self.device.info().name;
        log::info!(
            "opening {} (promiscuous: {}, read timeout: {}ms)",
            name,
            self.open_options.promiscuous,
            self.open_options.read_timeout_ms
        );
        if let Err(e) = self.device.open(&self.open_options) {
            log::error!("failed to open {}: {}", name, e);
            return Err(self.fail(e.into()));
        }

        self.set_state(SessionState::Opened);
        Ok(())
    }

    /// Wire the producer path, spawn the consumer and start capture.
    /// Transitions: opened → capturing.
    pub fn start(&mut self, processor: P) -> Result<(), HandoffError> {
        if !matches!(self.state, SessionState::Opened) {
            return Err(HandoffError::InvalidState("can only start from opened state".into()));
        }

        let queue = Arc::new(SharedQueue::new(&self.config));
        let coordinator = match ShutdownCoordinator::spawn(
            Arc::clone(&queue),
            processor,
            &self.config,
            Arc::clone(&self.delegate),
        ) {
            Ok(c) => c,
            Err(e) => {
                self.close_quietly();
                return Err(self.fail(e));
            }
        };

        let producer = ProducerPath::new(
            queue,
            self.device.statistics_source(),
            self.config.stats_interval(),
            Arc::clone(&self.delegate),
        );
        self.device.on_item_arrival(producer.into_callback());

        if let Err(e) = self.device.start_capture() {
            log::error!("failed to start capture: {}", e);
            // Nothing was delivered; the consumer has nothing to drain.
            coordinator.request_stop();
            if let Err(join_err) = coordinator.await_termination() {
                log::error!("consumer did not terminate cleanly: {}", join_err);
            }
            self.close_quietly();
            return Err(self.fail(e.into()));
        }

        self.coordinator = Some(coordinator);
        self.started = Some((Utc::now(), Instant::now()));
        self.set_state(SessionState::Capturing);
        log::info!("capture started on {}", self.device.info().name);
        Ok(())
    }

    /// Stop capture, drain, close the device and summarize the run.
    /// Transitions: capturing → stopping → completed / failed.
    pub fn stop(&mut self) -> Result<Completion<P>, HandoffError> {
        if !self.state.is_capturing() {
            return Err(HandoffError::InvalidState("can only stop from capturing state".into()));
        }
        let coordinator = self
            .coordinator
            .take()
            .ok_or_else(|| HandoffError::InvalidState("consumer not running".into()))?;

        self.set_state(SessionState::Stopping);

        let queue = Arc::clone(coordinator.queue());

        // Capture must be quiet before the consumer's final poll.
        let stop_result = self.device.stop_capture();
        coordinator.request_stop();
        let report = coordinator.await_termination();

        if let Err(e) = stop_result {
            log::error!("failed to stop capture: {}", e);
            self.close_quietly();
            return Err(self.fail(e.into()));
        }
        let report = match report {
            Ok(r) => r,
            Err(e) => {
                self.close_quietly();
                return Err(self.fail(e));
            }
        };

        let capture = self.device.statistics().unwrap_or_else(|e| {
            log::warn!("final statistics unavailable: {}", e);
            CaptureStatistics::default()
        });
        let final_statistics = StatisticsSnapshot::new(capture, queue.counters());

        if let Err(e) = self.device.close() {
            log::error!("failed to close device: {}", e);
            return Err(self.fail(e.into()));
        }

        let (started_at, started) = self.started.take().unwrap_or_else(|| (Utc::now(), Instant::now()));
        let summary = RunSummary::new(
            &self.device.info().name,
            started_at,
            started.elapsed().as_secs_f64(),
            report.processed,
            report.failed,
            report.stragglers,
            final_statistics,
        );

        self.set_state(SessionState::Completed);
        self.delegate.on_run_finished(&summary);
        log::info!(
            "run {} finished: {} processed, {} failed in {:.2}s",
            summary.id,
            summary.processed,
            summary.failed,
            summary.duration_secs
        );

        Ok(Completion {
            summary,
            processor: report.processor,
        })
    }

    /// Open, start, block in `wait` for the capture window, then stop.
    pub fn run<F: FnOnce(&Self)>(&mut self, processor: P, wait: F) -> Result<Completion<P>, HandoffError> {
        self.open()?;
        self.start(processor)?;
        wait(self);
        self.stop()
    }

    // --- Internal helpers ---

    fn set_state(&mut self, state: SessionState) {
        if state.is_terminal() {
            log::info!("capture session on {} finished: {:?}", self.device.info().name, state);
        }
        self.delegate.on_session_state_changed(&state);
        self.state = state;
    }

    fn fail(&mut self, error: HandoffError) -> HandoffError {
        self.set_state(SessionState::Failed(error.clone()));
        error
    }

    fn close_quietly(&mut self) {
        if let Err(e) = self.device.close() {
            log::warn!("failed to close device after error: {}", e);
        }
    }
}

impl<D: CaptureDevice, P: ItemProcessor> Drop for CaptureSession<D, P> {
    fn drop(&mut self) {
        if self.state.is_capturing() {
            log::warn!("capture session dropped while capturing; stopping");
            if let Err(e) = self.device.stop_capture() {
                log::error!("failed to stop capture: {}", e);
            }
            // Dropping the coordinator requests the stop and joins.
            drop(self.coordinator.take());
            self.close_quietly();
        }
    }
}
