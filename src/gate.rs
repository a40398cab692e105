//! Interval-based reporting gate.
//!
//! The gate is Idle until `now - last_sent_at >= send_interval`. It then hands
//! the current observation to the collector and moves `last_sent_at` to `now`
//! whatever the outcome was, so a failed send waits for the next interval like
//! any other. Observations between reports are dropped; a report carries only
//! the observation that was current when the gate fired.
//!
//! [`ReportingState`] is a plain value owned by the caller and threaded
//! through every loop iteration.

use anyhow::{anyhow, Result};
use std::time::{Duration, Instant};

use crate::observation::CrowdObservation;
use crate::transport::{Collector, ReportOutcome};

/// When the last report attempt happened and how often to report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReportingState {
    last_sent_at: Instant,
    send_interval: Duration,
}

impl ReportingState {
    /// `last_sent_at` is normally the monitor start time.
    pub fn new(last_sent_at: Instant, send_interval: Duration) -> Result<Self> {
        if send_interval.is_zero() {
            return Err(anyhow!("send interval must be greater than zero"));
        }
        Ok(Self {
            last_sent_at,
            send_interval,
        })
    }

    pub fn last_sent_at(&self) -> Instant {
        self.last_sent_at
    }

    pub fn send_interval(&self) -> Duration {
        self.send_interval
    }

    /// True once a full interval has elapsed since the last attempt.
    pub fn is_due(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_sent_at) >= self.send_interval
    }

    /// Time left until the gate fires, zero when already due.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.send_interval
            .saturating_sub(now.saturating_duration_since(self.last_sent_at))
    }

    fn attempted_at(self, now: Instant) -> Self {
        Self {
            last_sent_at: now,
            ..self
        }
    }
}

/// Decides when the current observation goes to the collector.
pub struct ReportingGate<C> {
    collector: C,
}

impl<C: Collector> ReportingGate<C> {
    pub fn new(collector: C) -> Self {
        Self { collector }
    }

    pub fn collector(&self) -> &C {
        &self.collector
    }

    /// Evaluate the gate at `now`.
    ///
    /// Returns the next state and, when the gate fired, the outcome of the
    /// single report attempt.
    pub fn tick(
        &self,
        state: ReportingState,
        now: Instant,
        observation: &CrowdObservation,
    ) -> (ReportingState, Option<ReportOutcome>) {
        if !state.is_due(now) {
            return (state, None);
        }

        log::debug!(
            "reporting gate fired: count={} confidence={:.1} level={}",
            observation.count,
            observation.confidence,
            observation.level().as_str()
        );
        let outcome = self.collector.send(observation.count, observation.confidence);
        (state.attempted_at(now), Some(outcome))
    }
}
