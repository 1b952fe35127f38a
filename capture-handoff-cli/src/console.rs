use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::thread;

use capture_handoff_core::{HandoffDelegate, HandoffError, RunSummary, SessionState, StatisticsSnapshot};

/// Prints periodic statistics and the final summary to stdout.
///
/// Samples arrive on the delivery thread and are handed to a printer thread
/// through a one-slot channel. A sample that finds the slot full is dropped.
pub struct ConsoleDelegate {
    samples: SyncSender<StatisticsSnapshot>,
}

impl ConsoleDelegate {
    /// Start the printer thread. It exits once the delegate is dropped.
    pub fn spawn() -> Result<Self, HandoffError> {
        let (samples, rx) = mpsc::sync_channel(1);
        thread::Builder::new()
            .name("stats-printer".into())
            .spawn(move || print_samples(rx))
            .map_err(|e| HandoffError::Spawn(e.to_string()))?;
        Ok(Self { samples })
    }
}

fn print_samples(rx: Receiver<StatisticsSnapshot>) {
    for snapshot in rx {
        println!(
            "[{}] received {} | dropped {} | queued {} | processed {}",
            snapshot.taken_at.format("%H:%M:%S"),
            snapshot.received(),
            snapshot.dropped(),
            snapshot.queue.queued,
            snapshot.processed()
        );
    }
}

impl HandoffDelegate for ConsoleDelegate {
    fn on_session_state_changed(&self, state: &SessionState) {
        log::debug!("session state: {:?}", state);
    }

    fn on_statistics(&self, snapshot: &StatisticsSnapshot) {
        match self.samples.try_send(snapshot.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => log::trace!("printer busy; sample skipped"),
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    fn on_run_finished(&self, summary: &RunSummary) {
        if !summary.is_fully_drained() {
            println!(
                "warning: {} items were left undrained at shutdown",
                summary.stragglers
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use capture_handoff_core::{CaptureStatistics, QueueCounters};

    fn snapshot(received: u64) -> StatisticsSnapshot {
        StatisticsSnapshot::new(
            CaptureStatistics {
                received,
                ..Default::default()
            },
            QueueCounters::default(),
        )
    }

    #[test]
    fn samples_never_wait_for_the_printer() {
        // Nobody reads the receiver, so every send after the first finds the slot full.
        let (samples, rx) = mpsc::sync_channel(1);
        let delegate = ConsoleDelegate { samples };

        let start = Instant::now();
        for received in 0..100 {
            delegate.on_statistics(&snapshot(received));
        }

        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(rx.try_iter().map(|s| s.capture.received).collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn samples_after_printer_exit_are_ignored() {
        let (samples, rx) = mpsc::sync_channel(1);
        drop(rx);
        let delegate = ConsoleDelegate { samples };

        delegate.on_statistics(&snapshot(1));
    }
}
