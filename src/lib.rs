//! Crowd Monitor
//!
//! Samples a video feed, counts the distinct people in each frame with two
//! independent detectors, and periodically reports the count and a confidence
//! score to a remote collector.
//!
//! # Pipeline
//!
//! Frame source -> face/body detectors -> deduplication -> confidence score ->
//! reporting gate -> collector. The preview overlay is a side branch that
//! consumes the same unique regions.
//!
//! # Module Structure
//!
//! - `ingest`: Frame sources (synthetic `stub://`, V4L2 cameras)
//! - `frame`: Captured frames, resize and grayscale conversion
//! - `detect`: Region detector trait and backends (stub, Haar cascade, ONNX)
//! - `dedup`: Greedy face-first overlap deduplication
//! - `observation`: Confidence score and crowd level
//! - `gate`: Interval-based reporting gate
//! - `transport`: HTTP collector client
//! - `overlay`, `display`: Local preview
//! - `pipeline`: The monitor loop
//! - `config`: Layered configuration

pub mod config;
pub mod dedup;
pub mod detect;
pub mod display;
pub mod frame;
pub mod gate;
pub mod ingest;
pub mod observation;
pub mod overlay;
pub mod pipeline;
pub mod transport;

pub use config::{
    CollectorSettings, CrowdConfig, DetectorBackendKind, DetectorSettings, FrameSize,
    SourceSettings,
};
pub use dedup::deduplicate;
pub use detect::{
    build_detector_pair, DetectionBatch, DetectorKind, DetectorPair, Region, RegionDetector,
    StubDetector, UniqueDetectionSet,
};
pub use display::{open_display, DisplayEvent, FrameDisplay, HeadlessDisplay};
pub use frame::Frame;
pub use gate::{ReportingGate, ReportingState};
pub use ingest::{open_source, FrameSource, SourceStats, SyntheticSource};
#[cfg(feature = "ingest-v4l2")]
pub use ingest::V4l2Source;
pub use observation::{confidence_score, CrowdLevel, CrowdObservation};
pub use pipeline::{
    analyze_batches, analyze_frame, CrowdMonitor, FrameAnalysis, MonitorSettings, MonitorSummary,
    StopReason,
};
pub use transport::{Collector, HttpCollector, ReportOutcome};
