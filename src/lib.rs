//! oddswatch — bookmaker odds monitor and value-bet scanner
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod provider;
pub mod engine;
pub mod storage;
pub mod report;
