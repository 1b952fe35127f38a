use std::sync::Arc;
use std::thread;

use crate::models::config::HandoffConfig;
use crate::models::error::HandoffError;
use crate::models::state::ConsumerState;
use crate::session::consumer::{ConsumerLoop, ConsumerReport, StateCell};
use crate::session::shared_queue::SharedQueue;
use crate::traits::handoff_delegate::HandoffDelegate;
use crate::traits::item_processor::ItemProcessor;

/// Owns the consumer thread and the stop/join protocol.
///
/// Call `request_stop` only after the capture facility has stopped
/// delivering. Items appended after the consumer's final poll are not
/// drained; they are reported as `stragglers`.
pub struct ShutdownCoordinator<P: ItemProcessor> {
    queue: Arc<SharedQueue>,
    state: StateCell,
    handle: Option<thread::JoinHandle<ConsumerReport<P>>>,
}

impl<P: ItemProcessor> ShutdownCoordinator<P> {
    /// Spawn the consumer loop on a dedicated thread.
    pub fn spawn(
        queue: Arc<SharedQueue>,
        processor: P,
        config: &HandoffConfig,
        delegate: Arc<dyn HandoffDelegate>,
    ) -> Result<Self, HandoffError> {
        config.validate()?;
        let consumer = ConsumerLoop::new(Arc::clone(&queue), processor, config, delegate);
        let state = consumer.state_cell();

        let handle = thread::Builder::new()
            .name("handoff-consumer".into())
            .spawn(move || consumer.run())
            .map_err(|e| HandoffError::Spawn(e.to_string()))?;

        Ok(Self {
            queue,
            state,
            handle: Some(handle),
        })
    }

    /// Set the shutdown flag. Idempotent.
    pub fn request_stop(&self) {
        self.queue.request_shutdown();
    }

    pub fn is_stop_requested(&self) -> bool {
        self.queue.is_shutdown_requested()
    }

    pub fn consumer_state(&self) -> ConsumerState {
        self.state.get()
    }

    pub fn queue(&self) -> &Arc<SharedQueue> {
        &self.queue
    }

    /// Block until the consumer has terminated and return its report.
    ///
    /// Does not request the stop itself.
    pub fn await_termination(mut self) -> Result<ConsumerReport<P>, HandoffError> {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| HandoffError::InvalidState("consumer already joined".into()))?;
        handle.join().map_err(|_| HandoffError::ConsumerPanicked)
    }
}

impl<P: ItemProcessor> Drop for ShutdownCoordinator<P> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.queue.request_shutdown();
            if handle.join().is_err() {
                log::error!("consumer thread panicked during shutdown");
            }
        }
    }
}
