use anyhow::Result;
use image::GrayImage;

use crate::detect::result::{DetectionBatch, DetectorKind};

/// Region detector backend trait.
///
/// A detector is treated as a pure function from a single-channel image to a
/// batch of candidate regions. The regions must be in the pixel space of the
/// image that was passed in.
///
/// Implementations must not fail on a well-formed image. "Nothing found" is an
/// empty batch, not an error. An `Err` from `detect` is fatal to the monitor.
pub trait RegionDetector: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Silhouette this instance is tuned for.
    fn kind(&self) -> DetectorKind;

    /// Run detection on a grayscale frame.
    fn detect(&mut self, image: &GrayImage) -> Result<DetectionBatch>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
