pub mod aggregator;
pub mod item_buffer;
pub mod logging_processor;
