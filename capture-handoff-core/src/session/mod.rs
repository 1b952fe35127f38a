pub mod capture;
pub mod consumer;
pub mod coordinator;
pub mod producer;
pub mod shared_queue;
pub mod stats_sampler;
