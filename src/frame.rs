//! Captured frames.
//!
//! A `Frame` owns one RGB image for exactly one pipeline run. Frames are never
//! written anywhere; they are dropped once detection and overlay are done.

use anyhow::{anyhow, Result};
use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};

/// One captured RGB frame.
pub struct Frame {
    image: RgbImage,
    /// 1-based capture counter assigned by the source.
    pub sequence: u64,
}

impl Frame {
    pub fn new(image: RgbImage, sequence: u64) -> Self {
        Self { image, sequence }
    }

    /// Wrap packed RGB24 bytes.
    pub fn from_rgb(pixels: Vec<u8>, width: u32, height: u32, sequence: u64) -> Result<Self> {
        let len = pixels.len();
        let image = RgbImage::from_raw(width, height, pixels).ok_or_else(|| {
            anyhow!(
                "RGB frame length mismatch: {}x{} needs {} bytes, got {}",
                width,
                height,
                width as usize * height as usize * 3,
                len
            )
        })?;
        Ok(Self::new(image, sequence))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    /// Resize to the detection size. No-op when already at that size.
    pub fn resized(self, width: u32, height: u32) -> Self {
        if self.image.dimensions() == (width, height) {
            return self;
        }
        Self {
            image: imageops::resize(&self.image, width, height, FilterType::Triangle),
            ..self
        }
    }

    /// Single-channel copy for the detectors.
    pub fn grayscale(&self) -> GrayImage {
        imageops::grayscale(&self.image)
    }
}
