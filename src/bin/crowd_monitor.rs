//! crowd_monitor - camera people counter
//!
//! This daemon:
//! 1. Loads layered configuration (file, environment, flags)
//! 2. Opens the frame source and the face/body detectors
//! 3. Counts unique people per frame
//! 4. Reports the latest count to the collector every send interval
//! 5. Stops on Ctrl-C, the preview exit key, or end of stream

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use crowd_monitor::{
    build_detector_pair, open_display, open_source, CrowdConfig, CrowdMonitor,
    DetectorBackendKind, HttpCollector, MonitorSettings, ReportingState,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON or TOML config file.
    #[arg(long, env = "CROWD_CONFIG")]
    config: Option<PathBuf>,
    /// Collector base URL, e.g. http://localhost:8080.
    #[arg(long)]
    backend_url: Option<String>,
    /// Seconds between reports.
    #[arg(long)]
    send_interval: Option<u64>,
    /// Frame source: stub://name[?frames=N] or a V4L2 device path.
    #[arg(long)]
    source: Option<String>,
    /// Detector backend: stub, cascade or tract.
    #[arg(long)]
    detector_backend: Option<DetectorBackendKind>,
    /// Run without a preview window.
    #[arg(long, conflicts_with = "window")]
    headless: bool,
    /// Show the preview window (requires display-highgui).
    #[arg(long)]
    window: bool,
}

impl Args {
    fn apply(&self, cfg: &mut CrowdConfig) {
        if let Some(url) = &self.backend_url {
            cfg.collector.backend_url = url.clone();
        }
        if let Some(seconds) = self.send_interval {
            cfg.collector.send_interval = Duration::from_secs(seconds);
        }
        if let Some(uri) = &self.source {
            cfg.source.uri = uri.clone();
        }
        if let Some(backend) = self.detector_backend {
            cfg.detectors.backend = backend;
        }
        if self.headless {
            cfg.headless = true;
        }
        if self.window {
            cfg.headless = false;
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = CrowdConfig::load_from(args.config.as_deref())?;
    args.apply(&mut cfg);
    cfg.validate()?;

    let mut detectors = build_detector_pair(&cfg.detectors, cfg.frame_size)?;
    detectors.warm_up()?;
    let collector = HttpCollector::new(&cfg.collector.backend_url, cfg.collector.request_timeout)?;
    log::info!("reporting to {}", collector.endpoint());
    let display = open_display(cfg.headless)?;

    let mut monitor = CrowdMonitor::new(
        detectors,
        collector,
        display,
        MonitorSettings::new(cfg.frame_size),
    );
    let stop = monitor.stop_handle();
    ctrlc::set_handler(move || {
        stop.store(true, Ordering::SeqCst);
    })
    .expect("error setting Ctrl-C handler");

    let mut source = open_source(&cfg.source)?;
    let state = ReportingState::new(Instant::now(), cfg.collector.send_interval)?;
    let summary = monitor.run(source.as_mut(), state)?;

    log::info!(
        "crowd_monitor stopped ({}): {} frames, {} reports, {} delivered",
        summary.stop_reason.as_str(),
        summary.frames_processed,
        summary.reports_attempted,
        summary.reports_delivered
    );
    if let Some(last) = summary.last_observation {
        log::info!(
            "last observation: {} people, confidence {:.1}, level {}",
            last.count,
            last.confidence,
            last.level().as_str()
        );
    }
    Ok(())
}
