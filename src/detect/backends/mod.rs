#[cfg(feature = "backend-cascade")]
pub mod cascade;
pub mod stub;
#[cfg(feature = "backend-tract")]
pub mod tract;

use anyhow::Result;

#[cfg(feature = "backend-cascade")]
pub use cascade::CascadeDetector;
pub use stub::StubDetector;
#[cfg(feature = "backend-tract")]
pub use tract::TractDetector;

use crate::config::{DetectorBackendKind, DetectorSettings, FrameSize};
use crate::detect::pair::DetectorPair;
use crate::detect::result::DetectorKind;

/// Build the face and body detectors selected by configuration.
///
/// `frame_size` is the size of the frames the detectors will see after the
/// monitor resizes them.
#[cfg_attr(not(feature = "backend-tract"), allow(unused_variables))]
pub fn build_detector_pair(
    settings: &DetectorSettings,
    frame_size: FrameSize,
) -> Result<DetectorPair> {
    match settings.backend {
        DetectorBackendKind::Stub => DetectorPair::new(
            Box::new(StubDetector::new(DetectorKind::Face)),
            Box::new(StubDetector::new(DetectorKind::Body)),
        ),
        DetectorBackendKind::Cascade => {
            #[cfg(feature = "backend-cascade")]
            {
                let face = CascadeDetector::new(DetectorKind::Face, &settings.face_cascade)?
                    .with_params(settings.scale_factor, settings.min_neighbors);
                let body = CascadeDetector::new(DetectorKind::Body, &settings.body_cascade)?
                    .with_params(settings.scale_factor, settings.min_neighbors);
                DetectorPair::new(Box::new(face), Box::new(body))
            }
            #[cfg(not(feature = "backend-cascade"))]
            {
                anyhow::bail!("cascade detectors require the backend-cascade feature")
            }
        }
        DetectorBackendKind::Tract => {
            #[cfg(feature = "backend-tract")]
            {
                let face_model = settings
                    .face_model
                    .as_ref()
                    .ok_or_else(|| anyhow::anyhow!("tract backend requires a face model path"))?;
                let body_model = settings
                    .body_model
                    .as_ref()
                    .ok_or_else(|| anyhow::anyhow!("tract backend requires a body model path"))?;
                let face = TractDetector::new(
                    DetectorKind::Face,
                    face_model,
                    frame_size.width,
                    frame_size.height,
                )?
                .with_threshold(settings.score_threshold);
                let body = TractDetector::new(
                    DetectorKind::Body,
                    body_model,
                    frame_size.width,
                    frame_size.height,
                )?
                .with_threshold(settings.score_threshold);
                DetectorPair::new(Box::new(face), Box::new(body))
            }
            #[cfg(not(feature = "backend-tract"))]
            {
                anyhow::bail!("tract detectors require the backend-tract feature")
            }
        }
    }
}
