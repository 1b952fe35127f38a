use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::error::ProcessingError;
use crate::models::item::Item;
use crate::traits::item_processor::ItemProcessor;

/// Running totals over every item the consumer has seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Aggregate {
    pub items: u64,
    pub captured_bytes: u64,
    pub original_bytes: u64,
    pub truncated: u64,
    pub min_len: Option<u32>,
    pub max_len: Option<u32>,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
}

impl Aggregate {
    /// Mean original length, or None before the first item.
    pub fn mean_len(&self) -> Option<f64> {
        (self.items > 0).then(|| self.original_bytes as f64 / self.items as f64)
    }
}

/// Processor that only accumulates an `Aggregate`. Never fails.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    aggregate: Aggregate,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn aggregate(&self) -> &Aggregate {
        &self.aggregate
    }

    pub fn into_aggregate(self) -> Aggregate {
        self.aggregate
    }
}

impl ItemProcessor for Aggregator {
    fn process(&mut self, item: &Item) -> Result<(), ProcessingError> {
        let agg = &mut self.aggregate;
        let len = item.original_len();

        agg.items += 1;
        agg.captured_bytes += u64::from(item.captured_len());
        agg.original_bytes += u64::from(len);
        if item.is_truncated() {
            agg.truncated += 1;
        }
        agg.min_len = Some(agg.min_len.map_or(len, |m| m.min(len)));
        agg.max_len = Some(agg.max_len.map_or(len, |m| m.max(len)));
        agg.first_seen.get_or_insert(item.timestamp());
        agg.last_seen = Some(item.timestamp());
        Ok(())
    }

    fn finish(&mut self) {
        log::debug!(
            "aggregate: {} items, {} bytes on the wire",
            self.aggregate.items,
            self.aggregate.original_bytes
        );
    }
}
