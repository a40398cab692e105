//! Crowd collector client.
//!
//! Reports go out as
//! `POST {backend}/api/crowd-detection/save?crowdCount={int}&confidence={float}`
//! with an empty body. HTTP 200 is the only success status. The client never
//! retries; the reporting gate decides when the next attempt happens.

use anyhow::{anyhow, Context, Result};
use std::fmt;
use std::time::Duration;

use url::Url;

/// Ingestion path on the collector.
pub const SAVE_PATH: &str = "/api/crowd-detection/save";

/// Result of one report attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReportOutcome {
    /// Collector answered 200.
    Delivered,
    /// Collector answered with any other status.
    Rejected { status: u16 },
    /// Connection failed or timed out.
    Unreachable { cause: String },
}

impl ReportOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, ReportOutcome::Delivered)
    }
}

impl fmt::Display for ReportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportOutcome::Delivered => write!(f, "delivered"),
            ReportOutcome::Rejected { status } => write!(f, "rejected (HTTP {})", status),
            ReportOutcome::Unreachable { cause } => write!(f, "unreachable ({})", cause),
        }
    }
}

/// Anything that can accept a crowd report.
///
/// `send` must return within a bounded time and must not retry.
pub trait Collector {
    fn send(&self, count: usize, confidence: f64) -> ReportOutcome;
}

/// Blocking HTTP collector client with a fixed request timeout.
pub struct HttpCollector {
    agent: ureq::Agent,
    endpoint: Url,
    timeout: Duration,
}

impl HttpCollector {
    pub fn new(backend_url: &str, timeout: Duration) -> Result<Self> {
        if timeout.is_zero() {
            return Err(anyhow!("collector timeout must be greater than zero"));
        }
        let endpoint = save_endpoint(backend_url)?;
        // A 3xx must surface as Rejected, not be followed as a GET.
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .redirects(0)
            .build();
        Ok(Self {
            agent,
            endpoint,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Collector for HttpCollector {
    fn send(&self, count: usize, confidence: f64) -> ReportOutcome {
        let outcome = match self
            .agent
            .post(self.endpoint.as_str())
            .query("crowdCount", &count.to_string())
            .query("confidence", &format_confidence(confidence))
            .call()
        {
            Ok(response) if response.status() == 200 => ReportOutcome::Delivered,
            Ok(response) => ReportOutcome::Rejected {
                status: response.status(),
            },
            Err(ureq::Error::Status(status, _)) => ReportOutcome::Rejected { status },
            Err(ureq::Error::Transport(transport)) => ReportOutcome::Unreachable {
                cause: transport.to_string(),
            },
        };

        match &outcome {
            ReportOutcome::Delivered => log::info!(
                "report sent: {} people detected (confidence: {:.2}%)",
                count,
                confidence
            ),
            ReportOutcome::Rejected { status } => {
                log::warn!("collector rejected report: HTTP {}", status)
            }
            ReportOutcome::Unreachable { cause } => {
                log::warn!("collector unreachable: {}", cause)
            }
        }
        outcome
    }
}

/// Build the save endpoint from a backend base URL.
pub fn save_endpoint(backend_url: &str) -> Result<Url> {
    let base = backend_url.trim().trim_end_matches('/');
    let endpoint = Url::parse(&format!("{}{}", base, SAVE_PATH))
        .with_context(|| format!("invalid backend url '{}'", backend_url))?;
    if !matches!(endpoint.scheme(), "http" | "https") {
        return Err(anyhow!(
            "backend url must use http or https, got '{}'",
            endpoint.scheme()
        ));
    }
    Ok(endpoint)
}

/// Confidence as sent on the wire, e.g. `30.0`.
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.1}", confidence)
}
