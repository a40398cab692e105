//! Synthetic frame source.
//!
//! `stub://name` produces an endless stream of generated RGB frames;
//! `stub://name?frames=N` ends the stream after N frames. Frames are paced to
//! the configured target fps (0 disables pacing).

use anyhow::{anyhow, Context, Result};
use std::time::{Duration, Instant};

use url::Url;

use super::{FrameSource, SourceStats};
use crate::config::SourceSettings;
use crate::frame::Frame;

pub struct SyntheticSource {
    settings: SourceSettings,
    frame_limit: Option<u64>,
    frame_count: u64,
    /// Simulated "scene" state, shifted every 50 frames.
    scene_state: u8,
    last_frame_at: Option<Instant>,
    connected: bool,
}

impl SyntheticSource {
    pub fn new(settings: SourceSettings) -> Result<Self> {
        let url = Url::parse(&settings.uri)
            .with_context(|| format!("parse synthetic source uri {}", settings.uri))?;
        if url.scheme() != "stub" {
            return Err(anyhow!(
                "synthetic source expects a stub:// uri, got {}",
                settings.uri
            ));
        }
        if settings.width == 0 || settings.height == 0 {
            return Err(anyhow!("synthetic source dimensions must be non-zero"));
        }

        let mut frame_limit = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "frames" => {
                    frame_limit = Some(value.parse::<u64>().map_err(|_| {
                        anyhow!("stub frames must be an integer, got '{}'", value)
                    })?);
                }
                other => return Err(anyhow!("unknown stub source option '{}'", other)),
            }
        }

        Ok(Self {
            settings,
            frame_limit,
            frame_count: 0,
            scene_state: 0,
            last_frame_at: None,
            connected: false,
        })
    }

    fn pace(&self) {
        if self.settings.target_fps == 0 {
            return;
        }
        let Some(last) = self.last_frame_at else {
            return;
        };
        let interval = Duration::from_millis((1000 / self.settings.target_fps).max(1) as u64);
        let elapsed = last.elapsed();
        if elapsed < interval {
            std::thread::sleep(interval - elapsed);
        }
    }

    fn generate_synthetic_pixels(&mut self) -> Vec<u8> {
        let pixel_count = self.settings.width as usize * self.settings.height as usize * 3;

        if self.frame_count % 50 == 0 {
            self.scene_state = self.scene_state.wrapping_add(1);
        }

        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + self.frame_count + self.scene_state as u64) % 256) as u8;
        }
        pixels
    }
}

impl FrameSource for SyntheticSource {
    fn name(&self) -> &str {
        &self.settings.uri
    }

    fn connect(&mut self) -> Result<()> {
        self.connected = true;
        log::info!("SyntheticSource: connected to {}", self.settings.uri);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if !self.connected {
            return Err(anyhow!("synthetic source not connected; call connect() first"));
        }
        if self
            .frame_limit
            .is_some_and(|limit| self.frame_count >= limit)
        {
            return Ok(None);
        }

        self.pace();
        self.frame_count += 1;
        self.last_frame_at = Some(Instant::now());

        let pixels = self.generate_synthetic_pixels();
        let frame = Frame::from_rgb(
            pixels,
            self.settings.width,
            self.settings.height,
            self.frame_count,
        )?;
        Ok(Some(frame))
    }

    fn is_healthy(&self) -> bool {
        self.connected
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            source: self.settings.uri.clone(),
        }
    }

    fn release(&mut self) {
        self.connected = false;
        log::info!("SyntheticSource: released {}", self.settings.uri);
    }
}
