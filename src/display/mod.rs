//! Local preview window.
//!
//! The monitor hands every annotated frame to a [`FrameDisplay`]. Headless
//! runs use [`HeadlessDisplay`], which drops frames and never asks to exit.
//! The OpenCV window lives behind the `display-highgui` feature.

#[cfg(feature = "display-highgui")]
mod highgui;

use anyhow::Result;
use image::RgbImage;

#[cfg(feature = "display-highgui")]
pub use highgui::HighguiDisplay;

/// What the operator asked for while the frame was on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayEvent {
    Continue,
    ExitRequested,
}

pub trait FrameDisplay {
    /// Present one annotated frame with its info line and poll for input.
    fn show(&mut self, image: &RgbImage, info: &str) -> Result<DisplayEvent>;

    /// Tear down any windows. Called once on shutdown.
    fn close(&mut self) {}
}

/// Display used when no window is wanted.
#[derive(Debug, Default)]
pub struct HeadlessDisplay {
    frames_seen: u64,
}

impl HeadlessDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }
}

impl FrameDisplay for HeadlessDisplay {
    fn show(&mut self, _image: &RgbImage, info: &str) -> Result<DisplayEvent> {
        self.frames_seen += 1;
        log::debug!("headless frame {}: {}", self.frames_seen, info);
        Ok(DisplayEvent::Continue)
    }
}

/// Pick the display for this run.
pub fn open_display(headless: bool) -> Result<Box<dyn FrameDisplay>> {
    if headless {
        return Ok(Box::new(HeadlessDisplay::new()));
    }
    #[cfg(feature = "display-highgui")]
    {
        Ok(Box::new(HighguiDisplay::open(highgui::WINDOW_TITLE)?))
    }
    #[cfg(not(feature = "display-highgui"))]
    {
        anyhow::bail!("a preview window requires the display-highgui feature; run with --headless")
    }
}
