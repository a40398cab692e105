use anyhow::{anyhow, Context, Result};
use image::RgbImage;
use opencv::core::{Mat, Point, Scalar, Vec3b};
use opencv::prelude::*;
use opencv::{highgui, imgproc};

use super::{DisplayEvent, FrameDisplay};

pub(crate) const WINDOW_TITLE: &str = "Crowd Detection";

const EXIT_KEY: i32 = b'q' as i32;

/// OpenCV highgui preview window.
pub struct HighguiDisplay {
    window: String,
    open: bool,
}

impl HighguiDisplay {
    pub fn open(window: &str) -> Result<Self> {
        highgui::named_window(window, highgui::WINDOW_AUTOSIZE)
            .with_context(|| format!("open preview window '{}'", window))?;
        Ok(Self {
            window: window.to_string(),
            open: true,
        })
    }
}

impl FrameDisplay for HighguiDisplay {
    fn show(&mut self, image: &RgbImage, info: &str) -> Result<DisplayEvent> {
        if !self.open {
            return Err(anyhow!("preview window '{}' is closed", self.window));
        }
        let mut mat = to_bgr_mat(image)?;
        imgproc::put_text(
            &mut mat,
            info,
            Point::new(10, 30),
            imgproc::FONT_HERSHEY_SIMPLEX,
            1.0,
            Scalar::new(0.0, 255.0, 0.0, 0.0),
            2,
            imgproc::LINE_8,
            false,
        )
        .context("draw info text")?;
        highgui::imshow(&self.window, &mat).context("show preview frame")?;

        let key = highgui::wait_key(1).context("poll preview keyboard")?;
        if key >= 0 && key & 0xFF == EXIT_KEY {
            return Ok(DisplayEvent::ExitRequested);
        }
        Ok(DisplayEvent::Continue)
    }

    fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        if let Err(err) = highgui::destroy_all_windows() {
            log::warn!("failed to close preview window: {}", err);
        }
    }
}

fn to_bgr_mat(image: &RgbImage) -> Result<Mat> {
    let rows = i32::try_from(image.height()).context("frame height exceeds i32")?;
    let cols = i32::try_from(image.width()).context("frame width exceeds i32")?;
    let pixels: Vec<Vec3b> = image
        .pixels()
        .map(|p| Vec3b::from_array([p[2], p[1], p[0]]))
        .collect();
    let mat = Mat::new_rows_cols_with_data(rows, cols, &pixels)
        .context("wrap frame for preview")?
        .try_clone()
        .context("copy frame for preview")?;
    Ok(mat)
}
