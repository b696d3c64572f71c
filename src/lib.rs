// Public API for integration tests and library usage

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod limit;
pub mod llm;
pub mod normalize;
pub mod stats;
pub mod types;
