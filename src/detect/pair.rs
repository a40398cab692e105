use anyhow::{anyhow, Context, Result};
use image::GrayImage;

use super::backend::RegionDetector;
use super::result::{DetectionBatch, DetectorKind};

/// The face detector and the body detector for one monitor.
///
/// `detect` always returns the face batch first. Deduplication depends on
/// that ordering.
pub struct DetectorPair {
    face: Box<dyn RegionDetector>,
    body: Box<dyn RegionDetector>,
}

impl DetectorPair {
    pub fn new(face: Box<dyn RegionDetector>, body: Box<dyn RegionDetector>) -> Result<Self> {
        if face.kind() != DetectorKind::Face {
            return Err(anyhow!(
                "detector '{}' is tuned for {}, expected face",
                face.name(),
                face.kind().as_str()
            ));
        }
        if body.kind() != DetectorKind::Body {
            return Err(anyhow!(
                "detector '{}' is tuned for {}, expected body",
                body.name(),
                body.kind().as_str()
            ));
        }
        Ok(Self { face, body })
    }

    /// Backend names as (face, body).
    pub fn names(&self) -> (&'static str, &'static str) {
        (self.face.name(), self.body.name())
    }

    pub fn warm_up(&mut self) -> Result<()> {
        self.face.warm_up().context("warm up face detector")?;
        self.body.warm_up().context("warm up body detector")?;
        Ok(())
    }

    /// Run both detectors on the same grayscale frame.
    ///
    /// Returns `(face, body)`. Batches are re-tagged with the kind of the
    /// detector that produced them.
    pub fn detect(&mut self, image: &GrayImage) -> Result<(DetectionBatch, DetectionBatch)> {
        let mut face = self
            .face
            .detect(image)
            .with_context(|| format!("face detector '{}' failed", self.face.name()))?;
        face.kind = DetectorKind::Face;
        let mut body = self
            .body
            .detect(image)
            .with_context(|| format!("body detector '{}' failed", self.body.name()))?;
        body.kind = DetectorKind::Body;
        Ok((face, body))
    }
}
