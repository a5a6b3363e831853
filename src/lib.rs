//! Library crate for tcp-scan-rs: a bounded-concurrency TCP connect scanner
//! with retry/backoff and passive banner capture.
pub mod aggregator;
pub mod config;
pub mod connector;
pub mod error;
pub mod logging;
pub mod ports;
pub mod progress;
pub mod report;
pub mod retry;
pub mod scanner;
pub mod targets;
pub mod types;
