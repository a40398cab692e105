use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";
const DEFAULT_SEND_INTERVAL_SECS: u64 = 10;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;
const DEFAULT_SOURCE_URI: &str = "stub://camera";
const DEFAULT_SOURCE_FPS: u32 = 10;
const DEFAULT_FRAME_WIDTH: u32 = 640;
const DEFAULT_FRAME_HEIGHT: u32 = 480;
const DEFAULT_FACE_CASCADE: &str = "haarcascade_frontalface_default.xml";
const DEFAULT_BODY_CASCADE: &str = "haarcascade_fullbody.xml";
const DEFAULT_SCALE_FACTOR: f64 = 1.3;
const DEFAULT_MIN_NEIGHBORS: i32 = 5;
const DEFAULT_SCORE_THRESHOLD: f32 = 0.5;

#[derive(Debug, Deserialize, Default)]
struct CrowdConfigFile {
    collector: Option<CollectorConfigFile>,
    source: Option<SourceConfigFile>,
    frame: Option<FrameConfigFile>,
    detectors: Option<DetectorConfigFile>,
    display: Option<DisplayConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct CollectorConfigFile {
    backend_url: Option<String>,
    send_interval_secs: Option<u64>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    uri: Option<String>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct FrameConfigFile {
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    backend: Option<String>,
    face_cascade: Option<PathBuf>,
    body_cascade: Option<PathBuf>,
    scale_factor: Option<f64>,
    min_neighbors: Option<i32>,
    face_model: Option<PathBuf>,
    body_model: Option<PathBuf>,
    score_threshold: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct DisplayConfigFile {
    headless: Option<bool>,
}

/// Process-wide settings, fixed at startup.
#[derive(Debug, Clone)]
pub struct CrowdConfig {
    pub collector: CollectorSettings,
    pub source: SourceSettings,
    /// Every frame is resized to this before detection.
    pub frame_size: FrameSize,
    pub detectors: DetectorSettings,
    pub headless: bool,
}

#[derive(Debug, Clone)]
pub struct CollectorSettings {
    pub backend_url: String,
    pub send_interval: Duration,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SourceSettings {
    /// `stub://name[?frames=N]` for synthetic frames, otherwise a device path.
    pub uri: String,
    pub target_fps: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl Default for FrameSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_FRAME_WIDTH,
            height: DEFAULT_FRAME_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorBackendKind {
    Stub,
    Cascade,
    Tract,
}

impl FromStr for DetectorBackendKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "stub" => Ok(Self::Stub),
            "cascade" => Ok(Self::Cascade),
            "tract" => Ok(Self::Tract),
            other => Err(anyhow!(
                "unknown detector backend '{}'; expected stub, cascade or tract",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DetectorSettings {
    pub backend: DetectorBackendKind,
    pub face_cascade: PathBuf,
    pub body_cascade: PathBuf,
    pub scale_factor: f64,
    pub min_neighbors: i32,
    pub face_model: Option<PathBuf>,
    pub body_model: Option<PathBuf>,
    pub score_threshold: f32,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            backend: DetectorBackendKind::Stub,
            face_cascade: PathBuf::from(DEFAULT_FACE_CASCADE),
            body_cascade: PathBuf::from(DEFAULT_BODY_CASCADE),
            scale_factor: DEFAULT_SCALE_FACTOR,
            min_neighbors: DEFAULT_MIN_NEIGHBORS,
            face_model: None,
            body_model: None,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
        }
    }
}

impl Default for CrowdConfig {
    fn default() -> Self {
        Self {
            collector: CollectorSettings {
                backend_url: DEFAULT_BACKEND_URL.to_string(),
                send_interval: Duration::from_secs(DEFAULT_SEND_INTERVAL_SECS),
                request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            },
            source: SourceSettings {
                uri: DEFAULT_SOURCE_URI.to_string(),
                target_fps: DEFAULT_SOURCE_FPS,
                width: DEFAULT_FRAME_WIDTH,
                height: DEFAULT_FRAME_HEIGHT,
            },
            frame_size: FrameSize::default(),
            detectors: DetectorSettings::default(),
            headless: true,
        }
    }
}

impl CrowdConfig {
    /// Load from the file named by `CROWD_CONFIG` (if any), then apply
    /// environment overrides and validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("CROWD_CONFIG").ok().map(PathBuf::from);
        Self::load_from(config_path.as_deref())
    }

    /// Load from an explicit config file path (if any), then apply
    /// environment overrides and validate.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => Some(read_config_file(path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: CrowdConfigFile) -> Result<Self> {
        let defaults = Self::default();

        let collector_file = file.collector.unwrap_or_default();
        let collector = CollectorSettings {
            backend_url: collector_file
                .backend_url
                .unwrap_or(defaults.collector.backend_url),
            send_interval: collector_file
                .send_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.collector.send_interval),
            request_timeout: collector_file
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.collector.request_timeout),
        };

        let source_file = file.source.unwrap_or_default();
        let source = SourceSettings {
            uri: source_file.uri.unwrap_or(defaults.source.uri),
            target_fps: source_file.target_fps.unwrap_or(defaults.source.target_fps),
            width: source_file.width.unwrap_or(defaults.source.width),
            height: source_file.height.unwrap_or(defaults.source.height),
        };

        let frame_file = file.frame.unwrap_or_default();
        let frame_size = FrameSize {
            width: frame_file.width.unwrap_or(defaults.frame_size.width),
            height: frame_file.height.unwrap_or(defaults.frame_size.height),
        };

        let detector_file = file.detectors.unwrap_or_default();
        let detector_defaults = defaults.detectors;
        let detectors = DetectorSettings {
            backend: match detector_file.backend {
                Some(name) => name.parse()?,
                None => detector_defaults.backend,
            },
            face_cascade: detector_file
                .face_cascade
                .unwrap_or(detector_defaults.face_cascade),
            body_cascade: detector_file
                .body_cascade
                .unwrap_or(detector_defaults.body_cascade),
            scale_factor: detector_file
                .scale_factor
                .unwrap_or(detector_defaults.scale_factor),
            min_neighbors: detector_file
                .min_neighbors
                .unwrap_or(detector_defaults.min_neighbors),
            face_model: detector_file.face_model,
            body_model: detector_file.body_model,
            score_threshold: detector_file
                .score_threshold
                .unwrap_or(detector_defaults.score_threshold),
        };

        let headless = file
            .display
            .and_then(|display| display.headless)
            .unwrap_or(defaults.headless);

        Ok(Self {
            collector,
            source,
            frame_size,
            detectors,
            headless,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("CROWD_BACKEND_URL") {
            if !url.trim().is_empty() {
                self.collector.backend_url = url.trim().to_string();
            }
        }
        if let Ok(interval) = std::env::var("CROWD_SEND_INTERVAL_SECS") {
            let seconds: u64 = interval.trim().parse().map_err(|_| {
                anyhow!("CROWD_SEND_INTERVAL_SECS must be an integer number of seconds")
            })?;
            self.collector.send_interval = Duration::from_secs(seconds);
        }
        if let Ok(uri) = std::env::var("CROWD_SOURCE") {
            if !uri.trim().is_empty() {
                self.source.uri = uri.trim().to_string();
            }
        }
        if let Ok(width) = std::env::var("CROWD_FRAME_WIDTH") {
            self.frame_size.width = width
                .trim()
                .parse()
                .map_err(|_| anyhow!("CROWD_FRAME_WIDTH must be an integer"))?;
        }
        if let Ok(height) = std::env::var("CROWD_FRAME_HEIGHT") {
            self.frame_size.height = height
                .trim()
                .parse()
                .map_err(|_| anyhow!("CROWD_FRAME_HEIGHT must be an integer"))?;
        }
        if let Ok(backend) = std::env::var("CROWD_DETECTOR_BACKEND") {
            if !backend.trim().is_empty() {
                self.detectors.backend = backend.parse()?;
            }
        }
        Ok(())
    }

    /// Check invariants. Call again after applying command-line overrides.
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.collector.backend_url).map_err(|e| {
            anyhow!(
                "invalid backend url '{}': {}",
                self.collector.backend_url,
                e
            )
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow!(
                "backend url must use http or https, got '{}'",
                url.scheme()
            ));
        }
        if self.collector.send_interval.is_zero() {
            return Err(anyhow!("send interval must be greater than zero"));
        }
        if self.collector.request_timeout.is_zero() {
            return Err(anyhow!("request timeout must be greater than zero"));
        }
        if self.frame_size.width == 0 || self.frame_size.height == 0 {
            return Err(anyhow!("frame resize target must be non-zero"));
        }
        if self.source.uri.trim().is_empty() {
            return Err(anyhow!("frame source must not be empty"));
        }
        if self.detectors.scale_factor <= 1.0 {
            return Err(anyhow!("detector scale factor must be greater than 1.0"));
        }
        if self.detectors.min_neighbors < 0 {
            return Err(anyhow!("detector min_neighbors must not be negative"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<CrowdConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}
