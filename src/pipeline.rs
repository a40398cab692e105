//! The monitor loop.
//!
//! One thread, strict sequence per frame: read, resize, detect, deduplicate,
//! score, draw, report if the gate is due, then check for an exit request.
//! Only the frame read and the collector call block.
//!
//! The loop ends on a stop request (Ctrl-C flag or the display's exit key),
//! on end of stream, or on the first error. The source is released and the
//! display closed on every one of those paths.

use anyhow::{Context, Result};
use image::GrayImage;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use crate::config::FrameSize;
use crate::dedup::deduplicate;
use crate::detect::{DetectionBatch, DetectorPair, UniqueDetectionSet};
use crate::display::{DisplayEvent, FrameDisplay};
use crate::gate::{ReportingGate, ReportingState};
use crate::ingest::FrameSource;
use crate::observation::CrowdObservation;
use crate::overlay::{draw_regions, info_text};
use crate::transport::Collector;

const DEFAULT_HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// Everything computed from one frame.
#[derive(Clone, Debug)]
pub struct FrameAnalysis {
    pub face: DetectionBatch,
    pub body: DetectionBatch,
    pub unique: UniqueDetectionSet,
    pub observation: CrowdObservation,
}

/// Deduplicate two batches and score the result.
pub fn analyze_batches(
    face: DetectionBatch,
    body: DetectionBatch,
    timestamp: SystemTime,
) -> FrameAnalysis {
    let unique = deduplicate(&face, &body);
    let observation = CrowdObservation::from_unique(&unique, timestamp);
    FrameAnalysis {
        face,
        body,
        unique,
        observation,
    }
}

/// Run both detectors on a grayscale frame, then deduplicate and score.
pub fn analyze_frame(
    detectors: &mut DetectorPair,
    image: &GrayImage,
    timestamp: SystemTime,
) -> Result<FrameAnalysis> {
    let (face, body) = detectors.detect(image)?;
    Ok(analyze_batches(face, body, timestamp))
}

/// Why the loop stopped without an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// Ctrl-C or the display's exit key.
    UserRequested,
    /// The source has no more frames.
    EndOfStream,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::UserRequested => "user requested",
            StopReason::EndOfStream => "end of stream",
        }
    }
}

/// Totals for one completed run.
#[derive(Clone, Debug)]
pub struct MonitorSummary {
    pub frames_processed: u64,
    pub reports_attempted: u64,
    pub reports_delivered: u64,
    pub stop_reason: StopReason,
    pub last_observation: Option<CrowdObservation>,
    /// Gate state at shutdown.
    pub reporting_state: ReportingState,
}

#[derive(Clone, Copy, Debug)]
pub struct MonitorSettings {
    /// Every frame is resized to this before detection.
    pub frame_size: FrameSize,
    pub health_log_interval: Duration,
}

impl MonitorSettings {
    pub fn new(frame_size: FrameSize) -> Self {
        Self {
            frame_size,
            health_log_interval: DEFAULT_HEALTH_LOG_INTERVAL,
        }
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self::new(FrameSize::default())
    }
}

struct RunTally {
    frames_processed: u64,
    reports_attempted: u64,
    reports_delivered: u64,
    last_observation: Option<CrowdObservation>,
    state: ReportingState,
}

/// Single-threaded crowd monitor.
pub struct CrowdMonitor<C> {
    detectors: DetectorPair,
    gate: ReportingGate<C>,
    display: Box<dyn FrameDisplay>,
    settings: MonitorSettings,
    stop: Arc<AtomicBool>,
}

impl<C: Collector> CrowdMonitor<C> {
    pub fn new(
        detectors: DetectorPair,
        collector: C,
        display: Box<dyn FrameDisplay>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            detectors,
            gate: ReportingGate::new(collector),
            display,
            settings,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag checked before every frame; set it to stop the loop.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn collector(&self) -> &C {
        self.gate.collector()
    }

    /// Run until stopped, end of stream, or a fatal error.
    ///
    /// `source` must already be connected. It is released before this
    /// returns, on success and on error.
    pub fn run(
        &mut self,
        source: &mut dyn FrameSource,
        initial: ReportingState,
    ) -> Result<MonitorSummary> {
        let (face, body) = self.detectors.names();
        log::info!(
            "monitor running: source={} detectors={}/{} resize={}x{} interval={}s",
            source.name(),
            face,
            body,
            self.settings.frame_size.width,
            self.settings.frame_size.height,
            initial.send_interval().as_secs_f64()
        );

        let mut tally = RunTally {
            frames_processed: 0,
            reports_attempted: 0,
            reports_delivered: 0,
            last_observation: None,
            state: initial,
        };
        let result = self.run_loop(source, &mut tally);

        source.release();
        self.display.close();

        let stop_reason = result?;
        log::info!(
            "monitor stopped ({}): frames={} reports={} delivered={}",
            stop_reason.as_str(),
            tally.frames_processed,
            tally.reports_attempted,
            tally.reports_delivered
        );
        Ok(MonitorSummary {
            frames_processed: tally.frames_processed,
            reports_attempted: tally.reports_attempted,
            reports_delivered: tally.reports_delivered,
            stop_reason,
            last_observation: tally.last_observation,
            reporting_state: tally.state,
        })
    }

    fn run_loop(
        &mut self,
        source: &mut dyn FrameSource,
        tally: &mut RunTally,
    ) -> Result<StopReason> {
        let mut last_health_log = Instant::now();

        loop {
            if self.stop.load(Ordering::SeqCst) {
                return Ok(StopReason::UserRequested);
            }

            let Some(frame) = source
                .next_frame()
                .with_context(|| format!("frame read failed on {}", source.name()))?
            else {
                return Ok(StopReason::EndOfStream);
            };
            let sequence = frame.sequence;
            let frame = frame.resized(
                self.settings.frame_size.width,
                self.settings.frame_size.height,
            );
            let gray = frame.grayscale();
            let analysis = analyze_frame(&mut self.detectors, &gray, SystemTime::now())?;
            tally.frames_processed += 1;
            log::debug!(
                "frame {}: face={} body={} unique={} confidence={:.1}",
                sequence,
                analysis.face.len(),
                analysis.body.len(),
                analysis.unique.count(),
                analysis.observation.confidence
            );

            let mut image = frame.into_image();
            draw_regions(&mut image, analysis.unique.regions());
            let event = self
                .display
                .show(&image, &info_text(&analysis.observation))
                .context("display frame")?;

            let (next_state, outcome) =
                self.gate.tick(tally.state, Instant::now(), &analysis.observation);
            tally.state = next_state;
            tally.last_observation = Some(analysis.observation);
            if let Some(outcome) = outcome {
                tally.reports_attempted += 1;
                if outcome.is_delivered() {
                    tally.reports_delivered += 1;
                }
                log::debug!(
                    "report {} ({} people, level {})",
                    outcome,
                    analysis.observation.count,
                    analysis.observation.level().as_str()
                );
            }

            if event == DisplayEvent::ExitRequested {
                log::info!("exit key pressed");
                return Ok(StopReason::UserRequested);
            }

            if last_health_log.elapsed() >= self.settings.health_log_interval {
                let stats = source.stats();
                log::info!(
                    "source health={} frames={} source={}",
                    source.is_healthy(),
                    stats.frames_captured,
                    stats.source
                );
                last_health_log = Instant::now();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{DetectorKind, Region};

    fn batch(kind: DetectorKind, regions: &[(u32, u32, u32, u32)]) -> DetectionBatch {
        DetectionBatch::new(kind, regions.iter().copied().map(Region::from).collect())
    }

    #[test]
    fn overlapping_face_and_body_count_once() {
        let analysis = analyze_batches(
            batch(DetectorKind::Face, &[(10, 10, 20, 20)]),
            batch(DetectorKind::Body, &[(15, 15, 20, 20)]),
            SystemTime::UNIX_EPOCH,
        );
        assert_eq!(analysis.unique.regions(), &[Region::new(10, 10, 20, 20)]);
        assert_eq!(analysis.observation.count, 1);
        assert_eq!(analysis.observation.confidence, 10.0);
    }

    #[test]
    fn empty_batches_score_zero() {
        let analysis = analyze_batches(
            DetectionBatch::empty(DetectorKind::Face),
            DetectionBatch::empty(DetectorKind::Body),
            SystemTime::UNIX_EPOCH,
        );
        assert!(analysis.unique.is_empty());
        assert_eq!(analysis.observation.count, 0);
        assert_eq!(analysis.observation.confidence, 0.0);
    }

    #[test]
    fn stop_reason_labels() {
        assert_eq!(StopReason::UserRequested.as_str(), "user requested");
        assert_eq!(StopReason::EndOfStream.as_str(), "end of stream");
    }
}
