//! Core engine: best-price aggregation, value detection, price trends,
//! and the fetch → process → report → checkpoint monitoring loop.

pub mod aggregator;
pub mod monitor;
pub mod processor;
pub mod signal;
pub mod trend;
