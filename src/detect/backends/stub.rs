use anyhow::Result;
use image::GrayImage;

use crate::detect::backend::RegionDetector;
use crate::detect::result::{DetectionBatch, DetectorKind, Region};

/// Stub backend for tests and synthetic runs.
///
/// Returns the same configured regions for every frame, dropping any region
/// that does not fit inside the image. With no regions configured it always
/// reports "nothing found".
pub struct StubDetector {
    kind: DetectorKind,
    regions: Vec<Region>,
}

impl StubDetector {
    pub fn new(kind: DetectorKind) -> Self {
        Self {
            kind,
            regions: Vec::new(),
        }
    }

    pub fn with_regions(mut self, regions: Vec<Region>) -> Self {
        self.regions = regions;
        self
    }
}

impl RegionDetector for StubDetector {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn kind(&self) -> DetectorKind {
        self.kind
    }

    fn detect(&mut self, image: &GrayImage) -> Result<DetectionBatch> {
        let (width, height) = image.dimensions();
        let regions = self
            .regions
            .iter()
            .filter(|r| r.right() <= width as u64 && r.bottom() <= height as u64)
            .copied()
            .collect();
        Ok(DetectionBatch::new(self.kind, regions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stub_finds_nothing() -> Result<()> {
        let mut backend = StubDetector::new(DetectorKind::Face);
        let batch = backend.detect(&GrayImage::new(64, 48))?;
        assert!(batch.is_empty());
        assert_eq!(batch.kind, DetectorKind::Face);
        Ok(())
    }

    #[test]
    fn stub_drops_regions_outside_the_frame() -> Result<()> {
        let mut backend = StubDetector::new(DetectorKind::Body).with_regions(vec![
            Region::new(0, 0, 10, 10),
            Region::new(60, 40, 10, 10),
        ]);
        let batch = backend.detect(&GrayImage::new(64, 48))?;
        assert_eq!(batch.regions, vec![Region::new(0, 0, 10, 10)]);
        Ok(())
    }
}
