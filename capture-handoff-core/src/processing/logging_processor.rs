use log::Level;

use crate::models::error::ProcessingError;
use crate::models::item::Item;
use crate::traits::item_processor::ItemProcessor;

/// Emits one log line per item: sequence, arrival time, captured and
/// original length.
///
/// Rejects items whose capture header is inconsistent (captured length
/// larger than the original, or a payload that disagrees with the captured
/// length).
#[derive(Debug, Clone)]
pub struct LoggingProcessor {
    level: Level,
    logged: u64,
}

impl LoggingProcessor {
    pub fn new(level: Level) -> Self {
        Self { level, logged: 0 }
    }

    pub fn logged(&self) -> u64 {
        self.logged
    }

    fn check(item: &Item) -> Result<(), ProcessingError> {
        if item.captured_len() > item.original_len() {
            return Err(ProcessingError::Malformed {
                seq: item.seq(),
                reason: format!(
                    "captured length {} exceeds original length {}",
                    item.captured_len(),
                    item.original_len()
                ),
            });
        }
        if item.payload().len() != item.captured_len() as usize {
            return Err(ProcessingError::Malformed {
                seq: item.seq(),
                reason: format!(
                    "payload holds {} bytes, header says {}",
                    item.payload().len(),
                    item.captured_len()
                ),
            });
        }
        Ok(())
    }
}

impl Default for LoggingProcessor {
    fn default() -> Self {
        Self::new(Level::Info)
    }
}

impl ItemProcessor for LoggingProcessor {
    fn process(&mut self, item: &Item) -> Result<(), ProcessingError> {
        Self::check(item)?;
        log::log!(
            self.level,
            "#{} {} len:{} caplen:{}",
            item.seq(),
            item.timestamp().format("%H:%M:%S%.6f"),
            item.original_len(),
            item.captured_len()
        );
        self.logged += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn consistent_item_is_logged() {
        let mut processor = LoggingProcessor::default();
        let item = Item::new(1, Utc::now(), 1514, vec![0; 128]);

        assert!(processor.process(&item).is_ok());
        assert_eq!(processor.logged(), 1);
    }

    #[test]
    fn oversized_capture_is_malformed() {
        let mut processor = LoggingProcessor::default();
        let item = Item::with_header(2, Utc::now(), 200, 100, vec![0; 200]);

        let err = processor.process(&item).unwrap_err();
        assert!(matches!(err, ProcessingError::Malformed { seq: 2, .. }));
        assert_eq!(processor.logged(), 0);
    }

    #[test]
    fn payload_mismatch_is_malformed() {
        let mut processor = LoggingProcessor::default();
        let item = Item::with_header(3, Utc::now(), 64, 64, vec![0; 10]);

        assert!(processor.process(&item).is_err());
    }
}
