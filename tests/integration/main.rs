//! Integration tests: the monitoring loop end to end against a
//! deterministic in-memory provider, writing real CSV checkpoints.

mod mock_provider;
mod monitor_flow;
