//! Face/body deduplication.
//!
//! A single person frequently triggers both detectors. The merge is greedy and
//! order-sensitive: face regions are considered before body regions, and each
//! candidate is compared only against regions that were already accepted. Any
//! positive-area intersection marks the candidate as a duplicate, so the first
//! region of an overlapping cluster always survives.
//!
//! There is no IoU or minimum-area threshold. Reported counts depend on this
//! exact behavior and it must not be tuned here.

use crate::detect::{DetectionBatch, Region, UniqueDetectionSet};

/// Merge the face and body batches into unique person regions.
pub fn deduplicate(face: &DetectionBatch, body: &DetectionBatch) -> UniqueDetectionSet {
    let candidates = face.regions.iter().chain(body.regions.iter());
    let mut accepted: Vec<Region> = Vec::with_capacity(face.len() + body.len());

    for candidate in candidates {
        let duplicate = accepted.iter().any(|kept| candidate.overlaps(kept));
        if !duplicate {
            accepted.push(*candidate);
        }
    }

    UniqueDetectionSet::from_accepted(accepted)
}
