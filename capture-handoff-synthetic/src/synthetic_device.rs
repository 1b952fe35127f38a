//! Synthetic capture device.
//!
//! Generates items on a dedicated delivery thread at a configured rate, the
//! way a live capture handle delivers packets: one callback per item, on a
//! thread the consumer does not control.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use parking_lot::{Condvar, Mutex};

use capture_handoff_core::models::config::OpenOptions;
use capture_handoff_core::models::device::DeviceInfo;
use capture_handoff_core::models::error::{DeliveryError, DeviceError};
use capture_handoff_core::models::item::Item;
use capture_handoff_core::models::statistics::CaptureStatistics;
use capture_handoff_core::traits::capture_device::{CaptureDevice, ItemCallback, StatisticsSource};

/// Traffic shape of a synthetic device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficProfile {
    /// Items per second; 0 delivers as fast as the callback returns.
    pub rate_per_sec: u32,
    /// Items delivered back to back per tick.
    pub burst: u32,
    /// On-wire length range, inclusive.
    pub min_len: u32,
    pub max_len: u32,
    /// Every n-th item fails delivery and is counted as dropped.
    pub fault_every: Option<u64>,
    /// Stop delivering after this many items (delivered or faulted).
    pub limit: Option<u64>,
}

impl Default for TrafficProfile {
    fn default() -> Self {
        Self {
            rate_per_sec: 200,
            burst: 1,
            min_len: 60,
            max_len: 1514,
            fault_every: None,
            limit: None,
        }
    }
}

impl TrafficProfile {
    fn tick(&self) -> Option<Duration> {
        if self.rate_per_sec == 0 {
            return None;
        }
        let burst = f64::from(self.burst.max(1));
        Some(Duration::from_secs_f64(burst / f64::from(self.rate_per_sec)))
    }

    /// Deterministic on-wire length for a sequence number.
    fn wire_len(&self, seq: u64) -> u32 {
        let span = u64::from(self.max_len.saturating_sub(self.min_len)) + 1;
        self.min_len + (seq.wrapping_mul(7919) % span) as u32
    }
}

#[derive(Debug, Default)]
struct Counters {
    received: AtomicU64,
    dropped: AtomicU64,
    delivered: AtomicU64,
    exhausted: Mutex<bool>,
    exhausted_cv: Condvar,
}

impl Counters {
    fn mark_exhausted(&self) {
        *self.exhausted.lock() = true;
        self.exhausted_cv.notify_all();
    }

    fn reset(&self) {
        self.received.store(0, Ordering::Release);
        self.dropped.store(0, Ordering::Release);
        self.delivered.store(0, Ordering::Release);
        *self.exhausted.lock() = false;
    }
}

impl StatisticsSource for Counters {
    fn statistics(&self) -> Result<CaptureStatistics, DeviceError> {
        Ok(CaptureStatistics {
            received: self.received.load(Ordering::Acquire),
            dropped: self.dropped.load(Ordering::Acquire),
            if_dropped: 0,
        })
    }
}

/// A capture device whose traffic is generated in-process.
pub struct SyntheticDevice {
    info: DeviceInfo,
    profile: TrafficProfile,
    available: bool,
    options: Option<OpenOptions>,
    callback: Option<ItemCallback>,
    counters: Arc<Counters>,
    running: Arc<AtomicBool>,
    delivery_handle: Option<thread::JoinHandle<()>>,
}

impl SyntheticDevice {
    pub fn new(name: &str, profile: TrafficProfile) -> Self {
        Self {
            info: DeviceInfo {
                name: name.to_string(),
                description: Some(format!("synthetic traffic ({} items/s)", profile.rate_per_sec)),
                is_up: true,
            },
            profile,
            available: true,
            options: None,
            callback: None,
            counters: Arc::new(Counters::default()),
            running: Arc::new(AtomicBool::new(false)),
            delivery_handle: None,
        }
    }

    /// A device that is listed but refuses to open.
    pub fn unavailable(name: &str) -> Self {
        let mut device = Self::new(name, TrafficProfile::default());
        device.available = false;
        device.info.is_up = false;
        device.info.description = Some("synthetic device (down)".into());
        device
    }

    pub fn profile(&self) -> &TrafficProfile {
        &self.profile
    }

    pub fn is_open(&self) -> bool {
        self.options.is_some()
    }

    /// Items handed to the callback so far.
    pub fn delivered(&self) -> u64 {
        self.counters.delivered.load(Ordering::Acquire)
    }

    /// Block until the profile's item limit has been reached, or `timeout`
    /// expires. Returns whether the limit was reached. Always false without
    /// a limit.
    pub fn wait_exhausted(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut exhausted = self.counters.exhausted.lock();
        while !*exhausted {
            if self
                .counters
                .exhausted_cv
                .wait_until(&mut exhausted, deadline)
                .timed_out()
            {
                break;
            }
        }
        *exhausted
    }
}

impl CaptureDevice for SyntheticDevice {
    fn info(&self) -> DeviceInfo {
        self.info.clone()
    }

    fn open(&mut self, options: &OpenOptions) -> Result<(), DeviceError> {
        if !self.available {
            return Err(DeviceError::Unavailable(self.info.name.clone()));
        }
        if options.snaplen == 0 {
            return Err(DeviceError::OpenFailed("snaplen must be positive".into()));
        }
        log::debug!(
            "{}: opened (snaplen {}, promiscuous {})",
            self.info.name,
            options.snaplen,
            options.promiscuous
        );
        self.options = Some(*options);
        Ok(())
    }

    fn on_item_arrival(&mut self, callback: ItemCallback) {
        self.callback = Some(callback);
    }

    fn start_capture(&mut self) -> Result<(), DeviceError> {
        let options = self.options.ok_or(DeviceError::NotOpen)?;
        if self.running.load(Ordering::SeqCst) {
            return Err(DeviceError::AlreadyCapturing);
        }
        let callback = self.callback.clone().ok_or(DeviceError::NoCallback)?;

        // A thread that stopped itself at the limit is still joinable.
        if let Some(finished) = self.delivery_handle.take() {
            finished
                .join()
                .map_err(|_| DeviceError::StartFailed("previous delivery thread panicked".into()))?;
        }
        self.counters.reset();

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let counters = Arc::clone(&self.counters);
        let profile = self.profile.clone();
        let name = self.info.name.clone();

        let handle = thread::Builder::new()
            .name(format!("{}-delivery", name))
            .spawn(move || {
                let exhausted = delivery_loop(&name, &profile, options.snaplen, &running, &counters, &callback);
                running.store(false, Ordering::SeqCst);
                if exhausted {
                    counters.mark_exhausted();
                }
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                DeviceError::StartFailed(format!("failed to spawn delivery thread: {}", e))
            })?;

        self.delivery_handle = Some(handle);
        Ok(())
    }

    fn stop_capture(&mut self) -> Result<(), DeviceError> {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.delivery_handle.take() {
            handle
                .join()
                .map_err(|_| DeviceError::StopFailed("delivery thread panicked".into()))?;
        }
        Ok(())
    }

    fn statistics_source(&self) -> Arc<dyn StatisticsSource> {
        self.counters.clone()
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        if self.delivery_handle.is_some() {
            self.stop_capture()
                .map_err(|e| DeviceError::CloseFailed(format!("{}: {}", self.info.name, e)))?;
        }
        self.options = None;
        self.callback = None;
        Ok(())
    }
}

impl Drop for SyntheticDevice {
    fn drop(&mut self) {
        if let Err(e) = self.stop_capture() {
            log::error!("{}: {}", self.info.name, e);
        }
    }
}

/// Runs on the delivery thread until stopped or the limit is reached.
/// Returns true when the limit ended delivery.
fn delivery_loop(
    name: &str,
    profile: &TrafficProfile,
    snaplen: u32,
    running: &AtomicBool,
    counters: &Counters,
    callback: &ItemCallback,
) -> bool {
    let tick = profile.tick();
    let burst = u64::from(profile.burst.max(1));
    let mut seq = 0u64;
    let mut next_tick = Instant::now();
    let mut exhausted = false;

    'outer: while running.load(Ordering::SeqCst) {
        for _ in 0..burst {
            if profile.limit.is_some_and(|limit| seq >= limit) {
                exhausted = true;
                break 'outer;
            }
            counters.received.fetch_add(1, Ordering::AcqRel);

            match build_item(profile, seq, snaplen) {
                Ok(item) => {
                    callback(item);
                    counters.delivered.fetch_add(1, Ordering::AcqRel);
                }
                Err(e) => {
                    log::warn!("{}: delivery error on item #{}: {}", name, seq, e);
                    counters.dropped.fetch_add(1, Ordering::AcqRel);
                }
            }
            seq += 1;
        }

        if let Some(tick) = tick {
            next_tick += tick;
            pace_until(next_tick, running);
        }
    }
    log::debug!("{}: delivery stopped after {} items", name, seq);
    exhausted
}

fn build_item(profile: &TrafficProfile, seq: u64, snaplen: u32) -> Result<Item, DeliveryError> {
    if let Some(n) = profile.fault_every.filter(|n| *n > 0) {
        if (seq + 1) % n == 0 {
            return Err(DeliveryError::Truncated(format!("synthetic fault at item #{}", seq)));
        }
    }
    let wire_len = profile.wire_len(seq);
    let captured = wire_len.min(snaplen);
    let payload = (0..captured).map(|i| (seq as u8).wrapping_add(i as u8)).collect();
    Ok(Item::new(seq, Utc::now(), wire_len, payload))
}

// Sleep in short slices so stop_capture is not held up by a long tick.
fn pace_until(deadline: Instant, running: &AtomicBool) {
    const SLICE: Duration = Duration::from_millis(10);
    loop {
        let now = Instant::now();
        if now >= deadline || !running.load(Ordering::SeqCst) {
            return;
        }
        thread::sleep((deadline - now).min(SLICE));
    }
}
