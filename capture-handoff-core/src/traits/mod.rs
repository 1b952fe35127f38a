pub mod capture_device;
pub mod handoff_delegate;
pub mod item_processor;
