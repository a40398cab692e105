#![cfg(feature = "backend-cascade")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::GrayImage;
use opencv::core::{Mat, Rect, Size, Vector};
use opencv::objdetect::CascadeClassifier;
use opencv::prelude::*;

use crate::detect::backend::RegionDetector;
use crate::detect::result::{DetectionBatch, DetectorKind, Region};

/// Haar cascade backend (OpenCV `detectMultiScale`).
///
/// One instance per silhouette: the frontal-face cascade for `Face`, the
/// full-body cascade for `Body`.
pub struct CascadeDetector {
    kind: DetectorKind,
    classifier: CascadeClassifier,
    scale_factor: f64,
    min_neighbors: i32,
}

impl CascadeDetector {
    /// Load a cascade XML file.
    pub fn new<P: AsRef<Path>>(kind: DetectorKind, cascade_path: P) -> Result<Self> {
        let cascade_path = cascade_path.as_ref();
        if !cascade_path.is_file() {
            return Err(anyhow!(
                "{} cascade not found at {}",
                kind.as_str(),
                cascade_path.display()
            ));
        }
        let path = cascade_path
            .to_str()
            .ok_or_else(|| anyhow!("cascade path {} is not UTF-8", cascade_path.display()))?;
        let classifier = CascadeClassifier::new(path)
            .with_context(|| format!("failed to load cascade from {}", cascade_path.display()))?;
        if classifier.empty().context("query cascade state")? {
            return Err(anyhow!("cascade {} is empty", cascade_path.display()));
        }

        Ok(Self {
            kind,
            classifier,
            scale_factor: 1.3,
            min_neighbors: 5,
        })
    }

    /// Override the multi-scale scan parameters.
    pub fn with_params(mut self, scale_factor: f64, min_neighbors: i32) -> Self {
        self.scale_factor = scale_factor;
        self.min_neighbors = min_neighbors;
        self
    }
}

impl RegionDetector for CascadeDetector {
    fn name(&self) -> &'static str {
        "cascade"
    }

    fn kind(&self) -> DetectorKind {
        self.kind
    }

    fn detect(&mut self, image: &GrayImage) -> Result<DetectionBatch> {
        let (width, height) = image.dimensions();
        let rows = i32::try_from(height).context("frame height exceeds i32")?;
        let cols = i32::try_from(width).context("frame width exceeds i32")?;
        let mat: Mat = Mat::new_rows_cols_with_data(rows, cols, image.as_raw().as_slice())
            .context("wrap grayscale frame")?
            .try_clone()
            .context("copy grayscale frame")?;

        let mut rects = Vector::<Rect>::new();
        self.classifier
            .detect_multi_scale(
                &mat,
                &mut rects,
                self.scale_factor,
                self.min_neighbors,
                0,
                Size::default(),
                Size::default(),
            )
            .context("cascade detectMultiScale")?;

        let regions = rects
            .iter()
            .filter_map(|rect| clamp_to_frame(rect, width, height))
            .collect();
        Ok(DetectionBatch::new(self.kind, regions))
    }
}

/// Clip a detector rectangle to the frame; `None` when nothing is left.
fn clamp_to_frame(rect: Rect, width: u32, height: u32) -> Option<Region> {
    let x1 = i64::from(rect.x).clamp(0, i64::from(width));
    let y1 = i64::from(rect.y).clamp(0, i64::from(height));
    let x2 = (i64::from(rect.x) + i64::from(rect.width)).clamp(0, i64::from(width));
    let y2 = (i64::from(rect.y) + i64::from(rect.height)).clamp(0, i64::from(height));
    if x2 <= x1 || y2 <= y1 {
        return None;
    }
    Some(Region::new(
        x1 as u32,
        y1 as u32,
        (x2 - x1) as u32,
        (y2 - y1) as u32,
    ))
}
