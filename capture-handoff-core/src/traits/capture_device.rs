use std::sync::Arc;

use crate::models::config::OpenOptions;
use crate::models::device::DeviceInfo;
use crate::models::error::DeviceError;
use crate::models::item::Item;
use crate::models::statistics::CaptureStatistics;

/// Callback invoked once per arriving item on the facility's delivery thread.
///
/// Must return quickly: the facility cannot deliver the next item until it does.
pub type ItemCallback = Arc<dyn Fn(Item) + Send + Sync + 'static>;

/// Read-only access to a device's counters, shareable with the delivery thread.
pub trait StatisticsSource: Send + Sync {
    fn statistics(&self) -> Result<CaptureStatistics, DeviceError>;
}

/// Interface for a capture facility's device handle.
///
/// Call order around a capture window:
/// `open` → `on_item_arrival` → `start_capture` → `stop_capture` → `close`.
pub trait CaptureDevice: Send {
    /// Information about the device backing this handle.
    fn info(&self) -> DeviceInfo;

    /// Open the device. Fails with a `DeviceError` if it is unavailable.
    fn open(&mut self, options: &OpenOptions) -> Result<(), DeviceError>;

    /// Register the per-item callback. Replaces any earlier registration.
    fn on_item_arrival(&mut self, callback: ItemCallback);

    /// Begin delivering items to the registered callback.
    fn start_capture(&mut self) -> Result<(), DeviceError>;

    /// Stop delivery. Once this returns, the callback is not running and
    /// will not be invoked again.
    fn stop_capture(&mut self) -> Result<(), DeviceError>;

    /// Handle for sampling counters from outside the device owner.
    fn statistics_source(&self) -> Arc<dyn StatisticsSource>;

    /// Current facility counters. Callable at any time.
    fn statistics(&self) -> Result<CaptureStatistics, DeviceError> {
        self.statistics_source().statistics()
    }

    /// Release the device.
    fn close(&mut self) -> Result<(), DeviceError>;
}

/// Enumerates devices of a capture facility.
pub trait DeviceProvider {
    type Device: CaptureDevice;

    fn list_devices(&self) -> Result<Vec<DeviceInfo>, DeviceError>;

    /// Handle for the named device. Does not open it.
    fn device(&self, name: &str) -> Result<Self::Device, DeviceError>;
}
