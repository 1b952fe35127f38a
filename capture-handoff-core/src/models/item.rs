use chrono::{DateTime, Utc};

/// One captured unit flowing through the hand-off queue.
///
/// Immutable once built. Ownership moves from the delivery callback into the
/// live buffer, then to the consumer when the buffer is swapped out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    seq: u64,
    timestamp: DateTime<Utc>,
    captured_len: u32,
    original_len: u32,
    payload: Vec<u8>,
}

impl Item {
    /// Build an item whose captured length is the payload length.
    pub fn new(seq: u64, timestamp: DateTime<Utc>, original_len: u32, payload: Vec<u8>) -> Self {
        let captured_len = u32::try_from(payload.len()).unwrap_or(u32::MAX);
        Self {
            seq,
            timestamp,
            captured_len,
            original_len,
            payload,
        }
    }

    /// Build an item with an explicit captured length, as reported by the
    /// facility's capture header. The header may disagree with the payload.
    pub fn with_header(
        seq: u64,
        timestamp: DateTime<Utc>,
        captured_len: u32,
        original_len: u32,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            seq,
            timestamp,
            captured_len,
            original_len,
            payload,
        }
    }

    /// Per-device sequence number assigned at delivery.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Arrival time as stamped by the capture facility.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Number of bytes actually captured.
    pub fn captured_len(&self) -> u32 {
        self.captured_len
    }

    /// Length of the unit on the wire, which may exceed the snap length.
    pub fn original_len(&self) -> u32 {
        self.original_len
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Whether the facility cut the unit short of its original length.
    pub fn is_truncated(&self) -> bool {
        self.captured_len < self.original_len
    }
}
