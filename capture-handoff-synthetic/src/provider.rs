use capture_handoff_core::models::device::DeviceInfo;
use capture_handoff_core::models::error::DeviceError;
use capture_handoff_core::traits::capture_device::{CaptureDevice, DeviceProvider};

use crate::synthetic_device::{SyntheticDevice, TrafficProfile};

/// A catalogue of synthetic devices.
///
/// The default catalogue:
/// - `synth0`: steady 200 items/s
/// - `synth-burst`: bursts of 64 items, 5000 items/s on average
/// - `synth-faulty`: steady traffic where every 50th delivery fails
/// - `offline`: listed but down; opening it fails
pub struct SyntheticProvider {
    entries: Vec<(String, Option<TrafficProfile>)>,
}

impl SyntheticProvider {
    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    /// Add (or replace) a device with the given traffic profile.
    pub fn with_device(mut self, name: &str, profile: TrafficProfile) -> Self {
        self.entries.retain(|(n, _)| n != name);
        self.entries.push((name.to_string(), Some(profile)));
        self
    }

    /// Add (or replace) a device that is listed but cannot be opened.
    pub fn with_offline_device(mut self, name: &str) -> Self {
        self.entries.retain(|(n, _)| n != name);
        self.entries.push((name.to_string(), None));
        self
    }

    fn build(name: &str, profile: &Option<TrafficProfile>) -> SyntheticDevice {
        match profile {
            Some(p) => SyntheticDevice::new(name, p.clone()),
            None => SyntheticDevice::unavailable(name),
        }
    }
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self::empty()
            .with_device("synth0", TrafficProfile::default())
            .with_device(
                "synth-burst",
                TrafficProfile {
                    rate_per_sec: 5000,
                    burst: 64,
                    ..Default::default()
                },
            )
            .with_device(
                "synth-faulty",
                TrafficProfile {
                    fault_every: Some(50),
                    ..Default::default()
                },
            )
            .with_offline_device("offline")
    }
}

impl DeviceProvider for SyntheticProvider {
    type Device = SyntheticDevice;

    fn list_devices(&self) -> Result<Vec<DeviceInfo>, DeviceError> {
        Ok(self
            .entries
            .iter()
            .map(|(name, profile)| Self::build(name, profile).info())
            .collect())
    }

    fn device(&self, name: &str) -> Result<SyntheticDevice, DeviceError> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(n, profile)| Self::build(n, profile))
            .ok_or_else(|| DeviceError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capture_handoff_core::models::config::OpenOptions;

    #[test]
    fn default_catalogue_lists_four_devices() {
        let names: Vec<String> = SyntheticProvider::default()
            .list_devices()
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["synth0", "synth-burst", "synth-faulty", "offline"]);
    }

    #[test]
    fn offline_device_is_listed_down_and_fails_to_open() {
        let provider = SyntheticProvider::default();
        let listed = provider.list_devices().unwrap();
        assert!(!listed.iter().find(|d| d.name == "offline").unwrap().is_up);

        let mut device = provider.device("offline").unwrap();
        assert!(device.open(&OpenOptions::default()).is_err());
    }

    #[test]
    fn unknown_device_is_not_found() {
        let err = SyntheticProvider::default().device("eth7").err().unwrap();
        assert_eq!(err, DeviceError::NotFound("eth7".into()));
    }

    #[test]
    fn with_device_replaces_existing_entry() {
        let provider = SyntheticProvider::default().with_device(
            "synth0",
            TrafficProfile {
                rate_per_sec: 1,
                ..Default::default()
            },
        );
        assert_eq!(provider.device("synth0").unwrap().profile().rate_per_sec, 1);
        assert_eq!(provider.list_devices().unwrap().len(), 4);
    }
}
