//! Parlay backtester: historical multi-sport parlay strategy simulation.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod data;
pub mod oracle;
pub mod strategy;
pub mod backtest;
pub mod storage;
