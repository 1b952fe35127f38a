//! # capture-handoff-synthetic
//!
//! In-process capture backend for capture-handoff.
//!
//! Provides:
//! - `SyntheticDevice`: a `CaptureDevice` that generates items on its own delivery thread
//! - `SyntheticProvider`: a `DeviceProvider` over a small catalogue of such devices
//!
//! ## Usage
//! ```ignore
//! use capture_handoff_core::{CaptureSession, DeviceProvider, HandoffConfig, LoggingProcessor};
//! use capture_handoff_synthetic::SyntheticProvider;
//!
//! let device = SyntheticProvider::default().device("synth0")?;
//! let mut session = CaptureSession::new(device, HandoffConfig::default())?;
//! let completion = session.run(LoggingProcessor::default(), |_| std::thread::sleep(secs))?;
//! ```

pub mod provider;
pub mod synthetic_device;

pub use provider::SyntheticProvider;
pub use synthetic_device::{SyntheticDevice, TrafficProfile};

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use capture_handoff_core::{
        CaptureDevice, CaptureSession, DeviceProvider, HandoffConfig, HandoffError, Item, ItemProcessor,
        OverflowPolicy, ProcessingError, WakeStrategy,
    };

    use super::*;

    #[derive(Debug, Default)]
    struct Sequence(Vec<u64>);

    impl ItemProcessor for Sequence {
        fn process(&mut self, item: &Item) -> Result<(), ProcessingError> {
            self.0.push(item.seq());
            Ok(())
        }
    }

    fn limited(limit: u64) -> SyntheticDevice {
        SyntheticDevice::new(
            "synth-test",
            TrafficProfile {
                rate_per_sec: 0,
                limit: Some(limit),
                ..Default::default()
            },
        )
    }

    #[test]
    fn thousand_items_arrive_in_order_with_10ms_backoff() {
        for wake in [WakeStrategy::Poll, WakeStrategy::Notify] {
            let config = HandoffConfig {
                backoff_ms: 10,
                wake_strategy: wake,
                ..Default::default()
            };
            let mut session = CaptureSession::new(limited(1000), config).unwrap();

            let completion = session
                .run(Sequence::default(), |s| {
                    assert!(s.device().wait_exhausted(Duration::from_secs(10)));
                })
                .unwrap();

            assert_eq!(completion.processor.0, (0..1000).collect::<Vec<u64>>());
            assert_eq!(completion.summary.final_statistics.received(), 1000);
            assert!(completion.summary.is_fully_drained());
        }
    }

    #[test]
    fn bounded_queue_loses_only_what_the_policy_drops() {
        struct Slow(Vec<u64>);

        impl ItemProcessor for Slow {
            fn process(&mut self, item: &Item) -> Result<(), ProcessingError> {
                std::thread::sleep(Duration::from_micros(200));
                self.0.push(item.seq());
                Ok(())
            }
        }

        let config = HandoffConfig {
            backoff_ms: 5,
            max_buffered_items: Some(16),
            overflow_policy: OverflowPolicy::DropNewest,
            ..Default::default()
        };
        let mut session = CaptureSession::new(limited(2000), config).unwrap();

        let completion = session
            .run(Slow(Vec::new()), |s| {
                s.device().wait_exhausted(Duration::from_secs(10));
            })
            .unwrap();

        let queue = completion.summary.final_statistics.queue;
        assert_eq!(queue.appended + queue.overflow_dropped, 2000);
        assert_eq!(completion.processor.0.len() as u64, queue.appended);
        assert!(completion.processor.0.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn faulty_device_reports_drops_but_keeps_running() {
        let device = SyntheticDevice::new(
            "synth-faulty",
            TrafficProfile {
                rate_per_sec: 0,
                fault_every: Some(10),
                limit: Some(100),
                ..Default::default()
            },
        );
        let mut session = CaptureSession::new(device, HandoffConfig::default()).unwrap();

        let completion = session
            .run(Sequence::default(), |s| {
                s.device().wait_exhausted(Duration::from_secs(10));
            })
            .unwrap();

        assert_eq!(completion.summary.final_statistics.capture.dropped, 10);
        assert_eq!(completion.processor.0.len(), 90);
    }

    #[test]
    fn offline_device_fails_the_run() {
        let device = SyntheticProvider::default().device("offline").unwrap();
        assert!(!device.info().is_up);
        let mut session = CaptureSession::new(device, HandoffConfig::default()).unwrap();

        let err = session.run(Sequence::default(), |_| {}).unwrap_err();

        assert!(matches!(err, HandoffError::Device(_)));
    }
}
