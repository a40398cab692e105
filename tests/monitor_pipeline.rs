//! End-to-end monitor runs over synthetic frames.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use image::RgbImage;

use crowd_monitor::config::{FrameSize, SourceSettings};
use crowd_monitor::detect::{DetectorKind, DetectorPair, Region, StubDetector};
use crowd_monitor::display::{DisplayEvent, FrameDisplay, HeadlessDisplay};
use crowd_monitor::frame::Frame;
use crowd_monitor::gate::ReportingState;
use crowd_monitor::ingest::{FrameSource, SourceStats, SyntheticSource};
use crowd_monitor::pipeline::{CrowdMonitor, MonitorSettings, StopReason};
use crowd_monitor::transport::{Collector, ReportOutcome};

const INTERVAL: Duration = Duration::from_secs(10);

#[derive(Default)]
struct RecordingCollector {
    sent: RefCell<Vec<(usize, f64)>>,
}

impl Collector for RecordingCollector {
    fn send(&self, count: usize, confidence: f64) -> ReportOutcome {
        self.sent.borrow_mut().push((count, confidence));
        ReportOutcome::Delivered
    }
}

struct UnreachableCollector;

impl Collector for UnreachableCollector {
    fn send(&self, _count: usize, _confidence: f64) -> ReportOutcome {
        ReportOutcome::Unreachable {
            cause: "connection refused".to_string(),
        }
    }
}

fn settings() -> MonitorSettings {
    MonitorSettings::new(FrameSize {
        width: 64,
        height: 48,
    })
}

fn synthetic(uri: &str) -> Result<SyntheticSource> {
    let mut source = SyntheticSource::new(SourceSettings {
        uri: uri.to_string(),
        target_fps: 0,
        width: 64,
        height: 48,
    })?;
    source.connect()?;
    Ok(source)
}

fn detectors(face: &[(u32, u32, u32, u32)], body: &[(u32, u32, u32, u32)]) -> Result<DetectorPair> {
    let regions = |r: &[(u32, u32, u32, u32)]| -> Vec<Region> {
        r.iter().copied().map(Region::from).collect()
    };
    DetectorPair::new(
        Box::new(StubDetector::new(DetectorKind::Face).with_regions(regions(face))),
        Box::new(StubDetector::new(DetectorKind::Body).with_regions(regions(body))),
    )
}

/// Gate state whose interval has already elapsed.
fn overdue_state() -> Result<ReportingState> {
    let past = Instant::now()
        .checked_sub(Duration::from_secs(20))
        .ok_or_else(|| anyhow!("monotonic clock too young for test"))?;
    ReportingState::new(past, INTERVAL)
}

#[test]
fn overlapping_person_is_reported_once() -> Result<()> {
    let mut source = synthetic("stub://lobby?frames=3")?;
    let mut monitor = CrowdMonitor::new(
        detectors(&[(10, 10, 20, 20)], &[(15, 15, 20, 20)])?,
        RecordingCollector::default(),
        Box::new(HeadlessDisplay::new()),
        settings(),
    );

    let summary = monitor.run(&mut source, overdue_state()?)?;

    assert_eq!(summary.stop_reason, StopReason::EndOfStream);
    assert_eq!(summary.frames_processed, 3);
    assert_eq!(summary.reports_attempted, 1);
    assert_eq!(summary.reports_delivered, 1);
    let last = summary.last_observation.expect("observation");
    assert_eq!(last.count, 1);
    assert_eq!(last.confidence, 10.0);
    assert_eq!(*monitor.collector().sent.borrow(), vec![(1, 10.0)]);
    assert!(!source.is_healthy(), "source released on shutdown");
    Ok(())
}

#[test]
fn empty_frames_still_report_zero() -> Result<()> {
    let mut source = synthetic("stub://lobby?frames=1")?;
    let mut monitor = CrowdMonitor::new(
        detectors(&[], &[])?,
        RecordingCollector::default(),
        Box::new(HeadlessDisplay::new()),
        settings(),
    );

    let summary = monitor.run(&mut source, overdue_state()?)?;
    assert_eq!(summary.reports_attempted, 1);
    assert_eq!(*monitor.collector().sent.borrow(), vec![(0, 0.0)]);
    Ok(())
}

#[test]
fn nothing_is_reported_before_the_interval() -> Result<()> {
    let mut source = synthetic("stub://lobby?frames=5")?;
    let mut monitor = CrowdMonitor::new(
        detectors(&[(1, 1, 5, 5)], &[])?,
        RecordingCollector::default(),
        Box::new(HeadlessDisplay::new()),
        settings(),
    );

    let start = ReportingState::new(Instant::now(), INTERVAL)?;
    let summary = monitor.run(&mut source, start)?;
    assert_eq!(summary.frames_processed, 5);
    assert_eq!(summary.reports_attempted, 0);
    assert_eq!(summary.reporting_state, start);
    assert!(monitor.collector().sent.borrow().is_empty());
    Ok(())
}

#[test]
fn failed_reports_do_not_stop_the_loop() -> Result<()> {
    let mut source = synthetic("stub://lobby?frames=4")?;
    let mut monitor = CrowdMonitor::new(
        detectors(&[(1, 1, 5, 5)], &[(30, 20, 10, 10)])?,
        UnreachableCollector,
        Box::new(HeadlessDisplay::new()),
        settings(),
    );

    let summary = monitor.run(&mut source, overdue_state()?)?;
    assert_eq!(summary.stop_reason, StopReason::EndOfStream);
    assert_eq!(summary.frames_processed, 4);
    assert_eq!(summary.reports_attempted, 1);
    assert_eq!(summary.reports_delivered, 0);
    assert_eq!(summary.last_observation.map(|o| o.count), Some(2));
    Ok(())
}

#[test]
fn stop_flag_ends_the_run() -> Result<()> {
    let mut source = synthetic("stub://lobby")?;
    let mut monitor = CrowdMonitor::new(
        detectors(&[], &[])?,
        RecordingCollector::default(),
        Box::new(HeadlessDisplay::new()),
        settings(),
    );
    monitor.stop_handle().store(true, Ordering::SeqCst);

    let summary = monitor.run(&mut source, overdue_state()?)?;
    assert_eq!(summary.stop_reason, StopReason::UserRequested);
    assert_eq!(summary.frames_processed, 0);
    assert!(!source.is_healthy());
    Ok(())
}

struct ExitAfterFirstFrame {
    closed: Rc<Cell<bool>>,
    infos: Rc<RefCell<Vec<String>>>,
}

impl FrameDisplay for ExitAfterFirstFrame {
    fn show(&mut self, image: &RgbImage, info: &str) -> Result<DisplayEvent> {
        assert_eq!(image.dimensions(), (64, 48));
        self.infos.borrow_mut().push(info.to_string());
        Ok(DisplayEvent::ExitRequested)
    }

    fn close(&mut self) {
        self.closed.set(true);
    }
}

#[test]
fn exit_key_stops_after_the_gate_runs() -> Result<()> {
    let closed = Rc::new(Cell::new(false));
    let infos = Rc::new(RefCell::new(Vec::new()));
    let mut source = synthetic("stub://lobby")?;
    let mut monitor = CrowdMonitor::new(
        detectors(&[(2, 2, 10, 10), (30, 2, 10, 10), (50, 30, 10, 10)], &[])?,
        RecordingCollector::default(),
        Box::new(ExitAfterFirstFrame {
            closed: Rc::clone(&closed),
            infos: Rc::clone(&infos),
        }),
        settings(),
    );

    let summary = monitor.run(&mut source, overdue_state()?)?;
    assert_eq!(summary.stop_reason, StopReason::UserRequested);
    assert_eq!(summary.frames_processed, 1);
    assert_eq!(*monitor.collector().sent.borrow(), vec![(3, 30.0)]);
    assert_eq!(*infos.borrow(), vec!["People: 3 | Confidence: 30.0%".to_string()]);
    assert!(closed.get(), "display closed on shutdown");
    Ok(())
}

/// Delivers `good_frames` frames, then fails.
struct FlakySource {
    good_frames: u64,
    delivered: u64,
    released: Rc<Cell<bool>>,
}

impl FrameSource for FlakySource {
    fn name(&self) -> &str {
        "flaky"
    }

    fn connect(&mut self) -> Result<()> {
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.delivered >= self.good_frames {
            return Err(anyhow!("device unplugged"));
        }
        self.delivered += 1;
        Ok(Some(Frame::new(RgbImage::new(128, 96), self.delivered)))
    }

    fn is_healthy(&self) -> bool {
        !self.released.get()
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.delivered,
            source: "flaky".to_string(),
        }
    }

    fn release(&mut self) {
        self.released.set(true);
    }
}

#[test]
fn frame_read_failure_releases_and_propagates() -> Result<()> {
    let released = Rc::new(Cell::new(false));
    let mut source = FlakySource {
        good_frames: 2,
        delivered: 0,
        released: Rc::clone(&released),
    };
    let mut monitor = CrowdMonitor::new(
        detectors(&[], &[])?,
        RecordingCollector::default(),
        Box::new(HeadlessDisplay::new()),
        settings(),
    );

    let err = monitor
        .run(&mut source, overdue_state()?)
        .err()
        .expect("read failure must be fatal");
    assert!(format!("{:#}", err).contains("device unplugged"));
    assert!(released.get());
    // Frames before the failure were still processed and reported.
    assert_eq!(*monitor.collector().sent.borrow(), vec![(0, 0.0)]);
    Ok(())
}
