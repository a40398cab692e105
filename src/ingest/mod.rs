//! Frame ingestion sources.
//!
//! Sources deliver one RGB `Frame` per call to `next_frame`:
//! - Synthetic frames (`stub://name`), for tests and dry runs
//! - Local V4L2 cameras (feature: ingest-v4l2)
//!
//! `next_frame` returns `Ok(None)` once the source has no more frames and
//! `Err` when the source failed mid-run. Both end the monitor loop.

#[cfg(feature = "ingest-v4l2")]
mod normalize;
pub mod synthetic;
#[cfg(feature = "ingest-v4l2")]
pub mod v4l2;

use anyhow::{Context, Result};

use crate::config::SourceSettings;
use crate::frame::Frame;

pub use synthetic::SyntheticSource;
#[cfg(feature = "ingest-v4l2")]
pub use v4l2::V4l2Source;

/// Capture counters for periodic health logs.
#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub source: String,
}

/// A frame source owned by the monitor loop.
pub trait FrameSource {
    /// Human-readable source identifier (URI or device path).
    fn name(&self) -> &str;

    /// Open the underlying device or stream.
    fn connect(&mut self) -> Result<()>;

    /// Block until the next frame is available.
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// Check if the source is healthy.
    fn is_healthy(&self) -> bool;

    /// Get frame statistics.
    fn stats(&self) -> SourceStats;

    /// Release the device. Called once on shutdown.
    fn release(&mut self) {}
}

/// Create and connect the source named by `settings.uri`.
///
/// Any failure here is a "source unavailable" condition and aborts startup.
pub fn open_source(settings: &SourceSettings) -> Result<Box<dyn FrameSource>> {
    let mut source: Box<dyn FrameSource> = if settings.uri.starts_with("stub://") {
        Box::new(SyntheticSource::new(settings.clone())?)
    } else {
        #[cfg(feature = "ingest-v4l2")]
        {
            Box::new(V4l2Source::new(settings.clone()))
        }
        #[cfg(not(feature = "ingest-v4l2"))]
        {
            anyhow::bail!(
                "camera source '{}' requires the ingest-v4l2 feature",
                settings.uri
            )
        }
    };
    source
        .connect()
        .with_context(|| format!("cannot open frame source {}", settings.uri))?;
    Ok(source)
}
