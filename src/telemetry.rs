// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus counters for a run.
//!
//! Each run owns its own registry, so concurrent tests never share counters.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::path::Path;
use std::time::Duration;

/// Attempt outcome label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptKind {
    Success,
    Failure,
    Fault,
}

impl AttemptKind {
    fn label(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Fault => "fault",
        }
    }
}

/// Counters updated while a run executes.
pub struct RunTelemetry {
    registry: Registry,
    attempts: IntCounterVec,
    batches: IntCounter,
    batch_duration: Histogram,
}

impl RunTelemetry {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let attempts = IntCounterVec::new(
            Opts::new("mailbox_sim_attempts_total", "Creation attempts by outcome"),
            &["outcome"],
        )?;
        let batches = IntCounter::new("mailbox_sim_batches_total", "Batches completed")?;
        let batch_duration = Histogram::with_opts(
            HistogramOpts::new(
                "mailbox_sim_batch_duration_seconds",
                "Wall time spent inside each batch",
            )
            .buckets(vec![60.0, 300.0, 900.0, 1800.0, 3600.0, 7200.0, 14400.0]),
        )?;

        registry.register(Box::new(attempts.clone()))?;
        registry.register(Box::new(batches.clone()))?;
        registry.register(Box::new(batch_duration.clone()))?;

        Ok(Self {
            registry,
            attempts,
            batches,
            batch_duration,
        })
    }

    pub fn record_attempt(&self, kind: AttemptKind) {
        self.attempts.with_label_values(&[kind.label()]).inc();
    }

    pub fn record_batch(&self, elapsed: Duration) {
        self.batches.inc();
        self.batch_duration.observe(elapsed.as_secs_f64());
    }

    /// Attempts recorded so far with the given outcome.
    pub fn attempts(&self, kind: AttemptKind) -> u64 {
        self.attempts.with_label_values(&[kind.label()]).get()
    }

    pub fn batches(&self) -> u64 {
        self.batches.get()
    }

    /// Render the registry in Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    /// Write the text exposition to `path`.
    pub fn write_to(&self, path: &Path) -> crate::error::Result<()> {
        std::fs::write(path, self.encode()?)?;
        Ok(())
    }
}
