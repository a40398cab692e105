#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::GrayImage;
use tract_onnx::prelude::*;

use crate::detect::backend::RegionDetector;
use crate::detect::result::{DetectionBatch, DetectorKind, Region};

/// Values per detection row: x1, y1, x2, y2, score, class.
const ROW_LEN: usize = 6;

/// Class id of "person" in the detector's label map.
const PERSON_CLASS: u32 = 0;

/// Tract-based backend for ONNX detectors.
///
/// Expects a model with a `[1, 3, H, W]` f32 input and an end-to-end
/// `[1, N, 6]` output of `(x1, y1, x2, y2, score, class)` rows in input pixel
/// coordinates. The grayscale frame is replicated across the three channels.
pub struct TractDetector {
    kind: DetectorKind,
    model: SimplePlan<TypedFact, Box<dyn TypedOp>>,
    width: u32,
    height: u32,
    score_threshold: f32,
}

impl TractDetector {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(
        kind: DetectorKind,
        model_path: P,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, height as usize, width as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            kind,
            model,
            width,
            height,
            score_threshold: 0.5,
        })
    }

    /// Override the default score threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.score_threshold = threshold;
        self
    }

    fn build_input(&self, image: &GrayImage) -> Result<Tensor> {
        let (width, height) = image.dimensions();
        if width != self.width || height != self.height {
            return Err(anyhow!(
                "frame size {}x{} does not match model input {}x{}",
                width,
                height,
                self.width,
                self.height
            ));
        }

        let input = tract_ndarray::Array4::from_shape_fn(
            (1, 3, height as usize, width as usize),
            |(_, _channel, y, x)| image.get_pixel(x as u32, y as u32)[0] as f32 / 255.0,
        );

        Ok(input.into_tensor())
    }

    fn extract_regions(&self, outputs: TVec<TValue>) -> Result<Vec<Region>> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let shape = output.shape();
        if shape.len() != 3 || shape[2] < ROW_LEN {
            return Err(anyhow!(
                "unexpected detector output shape {:?}; expected [1, N, {}]",
                shape,
                ROW_LEN
            ));
        }
        let row_len = shape[2];
        let values = output
            .as_slice::<f32>()
            .context("model output tensor was not f32")?;

        let max_x = self.width as f32;
        let max_y = self.height as f32;
        let regions = values
            .chunks_exact(row_len)
            .filter(|row| row[4] >= self.score_threshold && row[5].round() as u32 == PERSON_CLASS)
            .filter_map(|row| {
                let x1 = row[0].clamp(0.0, max_x);
                let y1 = row[1].clamp(0.0, max_y);
                let x2 = row[2].clamp(0.0, max_x);
                let y2 = row[3].clamp(0.0, max_y);
                let width = (x2 - x1).round();
                let height = (y2 - y1).round();
                if width < 1.0 || height < 1.0 {
                    return None;
                }
                Some(Region::new(
                    x1.round() as u32,
                    y1.round() as u32,
                    width as u32,
                    height as u32,
                ))
            })
            .collect();
        Ok(regions)
    }
}

impl RegionDetector for TractDetector {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn kind(&self) -> DetectorKind {
        self.kind
    }

    fn detect(&mut self, image: &GrayImage) -> Result<DetectionBatch> {
        let input = self.build_input(image)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        let regions = self.extract_regions(outputs)?;
        Ok(DetectionBatch::new(self.kind, regions))
    }
}
