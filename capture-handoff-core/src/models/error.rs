use thiserror::Error;

/// Failures of the capture facility around a capture window.
///
/// Fatal to the run: surfaced to the caller, never retried internally.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("device not found: {0}")]
    NotFound(String),

    #[error("device not available: {0}")]
    Unavailable(String),

    #[error("device is not open")]
    NotOpen,

    #[error("capture already running")]
    AlreadyCapturing,

    #[error("no item callback registered")]
    NoCallback,

    #[error("open failed: {0}")]
    OpenFailed(String),

    #[error("start failed: {0}")]
    StartFailed(String),

    #[error("stop failed: {0}")]
    StopFailed(String),

    #[error("close failed: {0}")]
    CloseFailed(String),
}

/// An error the capture facility hit while delivering an item.
///
/// Stays inside the facility layer: it is logged and counted as a drop there,
/// and never reaches the queue.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("truncated frame: {0}")]
    Truncated(String),
}

/// Raised by an `ItemProcessor` for a single item. Logged and skipped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProcessingError {
    #[error("malformed item #{seq}: {reason}")]
    Malformed { seq: u64, reason: String },

    #[error("sink rejected item #{seq}: {reason}")]
    Rejected { seq: u64, reason: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to read config {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("failed to parse config {path}: {reason}")]
    Parse { path: String, reason: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("failed to serialize summary: {0}")]
    Serialize(String),

    #[error("failed to write {path}: {reason}")]
    Write { path: String, reason: String },

    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },
}

/// Top-level error of a hand-off run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandoffError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("invalid session state: {0}")]
    InvalidState(String),

    #[error("failed to spawn consumer thread: {0}")]
    Spawn(String),

    #[error("consumer thread panicked")]
    ConsumerPanicked,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_error_converts_into_handoff_error() {
        let err: HandoffError = DeviceError::NotFound("eth9".into()).into();
        assert_eq!(err, HandoffError::Device(DeviceError::NotFound("eth9".into())));
        assert_eq!(err.to_string(), "device not found: eth9");
    }

    #[test]
    fn processing_error_message_names_the_item() {
        let err = ProcessingError::Malformed {
            seq: 42,
            reason: "empty payload".into(),
        };
        assert_eq!(err.to_string(), "malformed item #42: empty payload");
    }
}
