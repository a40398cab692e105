//! Per-frame crowd observation and confidence scoring.

use std::time::SystemTime;

use crate::detect::UniqueDetectionSet;

/// Upper bound of the confidence score.
pub const MAX_CONFIDENCE: f64 = 100.0;

/// Confidence added per unique person.
pub const CONFIDENCE_PER_PERSON: f64 = 10.0;

/// Confidence for a unique count: `min(100, count * 10)`.
///
/// A placeholder heuristic kept for collector compatibility, not a calibrated
/// probability.
pub fn confidence_score(count: usize) -> f64 {
    (count as f64 * CONFIDENCE_PER_PERSON).min(MAX_CONFIDENCE)
}

/// Coarse crowd level, using the collector's own thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CrowdLevel {
    Low,
    Medium,
    High,
    Peak,
}

impl CrowdLevel {
    pub fn from_count(count: usize) -> Self {
        match count {
            0..=2 => CrowdLevel::Low,
            3..=5 => CrowdLevel::Medium,
            6..=10 => CrowdLevel::High,
            _ => CrowdLevel::Peak,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CrowdLevel::Low => "LOW",
            CrowdLevel::Medium => "MEDIUM",
            CrowdLevel::High => "HIGH",
            CrowdLevel::Peak => "PEAK",
        }
    }
}

/// Snapshot of one frame's result.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CrowdObservation {
    pub count: usize,
    /// In `[0, 100]`.
    pub confidence: f64,
    pub timestamp: SystemTime,
}

impl CrowdObservation {
    pub fn new(count: usize, timestamp: SystemTime) -> Self {
        Self {
            count,
            confidence: confidence_score(count),
            timestamp,
        }
    }

    pub fn from_unique(unique: &UniqueDetectionSet, timestamp: SystemTime) -> Self {
        Self::new(unique.count(), timestamp)
    }

    pub fn level(&self) -> CrowdLevel {
        CrowdLevel::from_count(self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    #[test]
    fn score_reference_points() {
        assert_eq!(confidence_score(0), 0.0);
        assert_eq!(confidence_score(3), 30.0);
        assert_eq!(confidence_score(10), 100.0);
        assert_eq!(confidence_score(15), 100.0);
    }

    #[test]
    fn score_is_monotonic_and_bounded() {
        let mut previous = confidence_score(0);
        for count in 1..200 {
            let score = confidence_score(count);
            assert!(score >= previous);
            assert!((0.0..=MAX_CONFIDENCE).contains(&score));
            previous = score;
        }
    }

    #[test]
    fn crowd_level_thresholds() {
        assert_eq!(CrowdLevel::from_count(0), CrowdLevel::Low);
        assert_eq!(CrowdLevel::from_count(2), CrowdLevel::Low);
        assert_eq!(CrowdLevel::from_count(3), CrowdLevel::Medium);
        assert_eq!(CrowdLevel::from_count(5), CrowdLevel::Medium);
        assert_eq!(CrowdLevel::from_count(10), CrowdLevel::High);
        assert_eq!(CrowdLevel::from_count(11), CrowdLevel::Peak);
    }

    #[test]
    fn observation_derives_confidence() {
        let obs = CrowdObservation::new(4, UNIX_EPOCH);
        assert_eq!(obs.confidence, 40.0);
        assert_eq!(obs.level().as_str(), "MEDIUM");
    }
}
