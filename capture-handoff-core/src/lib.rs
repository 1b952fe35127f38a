//! # capture-handoff-core
//!
//! Double-buffered hand-off between a capture facility's per-item callback
//! and a background consumer.
//!
//! The delivery thread appends each item to a live buffer under a short
//! lock; a dedicated consumer thread swaps the whole buffer out and
//! processes it with the lock released. Capture backends implement the
//! `CaptureDevice` trait and plug into the generic `CaptureSession`.
//!
//! ## Architecture
//!
//! ```text
//! capture-handoff-core (this crate)
//! ├── traits/       ← CaptureDevice, DeviceProvider, ItemProcessor, HandoffDelegate
//! ├── models/       ← Item, HandoffConfig, errors, states, statistics, RunSummary
//! ├── processing/   ← ItemBuffer, LoggingProcessor, Aggregator
//! ├── session/      ← SharedQueue, ProducerPath, ConsumerLoop, ShutdownCoordinator, CaptureSession
//! └── storage/      ← run summary JSON sidecar
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::config::{HandoffConfig, OpenOptions, OverflowPolicy, WakeStrategy};
pub use models::device::DeviceInfo;
pub use models::error::{ConfigError, DeliveryError, DeviceError, HandoffError, ProcessingError, StorageError};
pub use models::item::Item;
pub use models::run_summary::RunSummary;
pub use models::state::{ConsumerState, SessionState};
pub use models::statistics::{CaptureStatistics, QueueCounters, StatisticsSnapshot};
pub use processing::aggregator::{Aggregate, Aggregator};
pub use processing::item_buffer::ItemBuffer;
pub use processing::logging_processor::LoggingProcessor;
pub use session::capture::{CaptureSession, Completion};
pub use session::consumer::{ConsumerLoop, ConsumerReport};
pub use session::coordinator::ShutdownCoordinator;
pub use session::producer::ProducerPath;
pub use session::shared_queue::SharedQueue;
pub use traits::capture_device::{CaptureDevice, DeviceProvider, ItemCallback, StatisticsSource};
pub use traits::handoff_delegate::{HandoffDelegate, NoopDelegate};
pub use traits::item_processor::ItemProcessor;
