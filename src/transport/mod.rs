//! Outbound integrations.
//!
//! The only remote peer is the crowd collector, which accepts one
//! `(count, confidence)` pair per report over HTTP.

pub mod collector;

pub use collector::{Collector, HttpCollector, ReportOutcome, SAVE_PATH};
