use crate::models::error::ProcessingError;
use crate::models::item::Item;

/// Sink for drained items, run on the consumer thread.
///
/// Items arrive in append order. An error affects only the item that raised
/// it: the consumer logs it and moves on to the next one.
pub trait ItemProcessor: Send + 'static {
    fn process(&mut self, item: &Item) -> Result<(), ProcessingError>;

    /// Called once after the final drain, before the consumer terminates.
    fn finish(&mut self) {}
}

// Chain two processors. The second still sees an item the first rejected.
impl<A: ItemProcessor, B: ItemProcessor> ItemProcessor for (A, B) {
    fn process(&mut self, item: &Item) -> Result<(), ProcessingError> {
        let first = self.0.process(item);
        let second = self.1.process(item);
        first.and(second)
    }

    fn finish(&mut self) {
        self.0.finish();
        self.1.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    struct RejectAll;

    impl ItemProcessor for RejectAll {
        fn process(&mut self, item: &Item) -> Result<(), ProcessingError> {
            Err(ProcessingError::Rejected {
                seq: item.seq(),
                reason: "nope".into(),
            })
        }
    }

    #[derive(Default)]
    struct Count {
        seen: usize,
        finished: bool,
    }

    impl ItemProcessor for Count {
        fn process(&mut self, _item: &Item) -> Result<(), ProcessingError> {
            self.seen += 1;
            Ok(())
        }

        fn finish(&mut self) {
            self.finished = true;
        }
    }

    #[test]
    fn pair_reports_first_error_and_runs_both() {
        let mut pair = (RejectAll, Count::default());
        let item = Item::new(7, Utc::now(), 4, vec![0; 4]);

        let result = pair.process(&item);

        assert!(matches!(result, Err(ProcessingError::Rejected { seq: 7, .. })));
        assert_eq!(pair.1.seen, 1);
    }

    #[test]
    fn pair_finishes_both() {
        let mut pair = (Count::default(), Count::default());
        pair.finish();
        assert!(pair.0.finished && pair.1.finished);
    }
}
