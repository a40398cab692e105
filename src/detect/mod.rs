//! Region detection.
//!
//! Two detector instances run on every frame: one tuned for faces
//! (head/shoulders) and one for full bodies. Each backend is a pure
//! `GrayImage -> DetectionBatch` function behind [`RegionDetector`].

mod backend;
mod backends;
mod pair;
mod result;

pub use backend::RegionDetector;
#[cfg(feature = "backend-cascade")]
pub use backends::CascadeDetector;
#[cfg(feature = "backend-tract")]
pub use backends::TractDetector;
pub use backends::{build_detector_pair, StubDetector};
pub use pair::DetectorPair;
pub use result::{DetectionBatch, DetectorKind, Region, UniqueDetectionSet};
