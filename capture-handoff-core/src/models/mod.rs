pub mod config;
pub mod device;
pub mod error;
pub mod item;
pub mod run_summary;
pub mod state;
pub mod statistics;
