use crate::models::error::ProcessingError;
use crate::models::item::Item;
use crate::models::run_summary::RunSummary;
use crate::models::state::{ConsumerState, SessionState};
use crate::models::statistics::StatisticsSnapshot;

/// Event delegate for hand-off notifications.
///
/// Statistics samples arrive on the delivery thread; consumer events arrive
/// on the consumer thread; session events on the thread driving the session.
/// Implementations must return quickly, especially from `on_statistics`.
pub trait HandoffDelegate: Send + Sync {
    fn on_consumer_state_changed(&self, _state: ConsumerState) {}

    fn on_session_state_changed(&self, _state: &SessionState) {}

    /// Called with each periodic sample taken on the producer path.
    ///
    /// Runs on the delivery thread: must not block on I/O. Hand the snapshot
    /// to another thread if it needs printing or storing.
    fn on_statistics(&self, _snapshot: &StatisticsSnapshot) {}

    /// Called for an item the processor rejected, after it has been logged.
    fn on_processing_error(&self, _item: &Item, _error: &ProcessingError) {}

    /// Called when a session completes.
    fn on_run_finished(&self, _summary: &RunSummary) {}
}

/// Delegate that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDelegate;

impl HandoffDelegate for NoopDelegate {}
