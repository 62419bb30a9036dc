// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Distributed batch scheduling.
//!
//! A run of `target_count` attempts over `duration_hours` is cut into
//! `num_batches` batches of `batch_size`:
//!
//! ```text
//! batch_size  = max(1, target_count / (duration_hours * 2))
//! num_batches = target_count / batch_size
//! ```
//!
//! Both divisions truncate, so when `batch_size > 1` does not divide
//! `target_count` the run attempts fewer identities than requested
//! (11 over 1 hour runs 2 batches of 5). Each batch gets an equal slot of
//! the total duration; after every batch except the last the scheduler
//! sleeps out whatever is left of the slot. An overrun is not compensated.
//!
//! Everything runs on one task, one attempt at a time.

use crate::attempt::{AttemptBackend, SimulatedBackend};
use crate::batch::{Batch, BatchRunner};
use crate::config::Config;
use crate::identity::{Identity, IdentityGenerator};
use crate::limiter::{sleep_unless_cancelled, RateLimiter};
use crate::telemetry::RunTelemetry;
use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Errors that stop a run before it starts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("target count must be at least 1")]
    ZeroTarget,

    #[error("duration must be at least 1 hour")]
    ZeroDuration,
}

/// How a run is divided into batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlan {
    pub batch_size: usize,
    pub num_batches: usize,
    /// Wall-clock share of the run given to each batch.
    pub slot: Duration,
}

impl BatchPlan {
    pub fn new(target_count: u32, duration_hours: u32) -> Result<Self, SchedulerError> {
        if target_count == 0 {
            return Err(SchedulerError::ZeroTarget);
        }
        if duration_hours == 0 {
            return Err(SchedulerError::ZeroDuration);
        }

        let target = target_count as u64;
        let batch_size = (target / (duration_hours as u64 * 2)).max(1);
        let num_batches = target / batch_size;
        let slot = Duration::from_secs_f64(duration_hours as f64 * 3600.0 / num_batches as f64);

        Ok(Self {
            batch_size: batch_size as usize,
            num_batches: num_batches as usize,
            slot,
        })
    }

    /// Attempts the plan will make if nothing cancels it.
    pub fn total_attempts(&self) -> usize {
        self.batch_size * self.num_batches
    }

    /// How many of `target_count` the plan never attempts.
    pub fn shortfall(&self, target_count: u32) -> usize {
        (target_count as usize).saturating_sub(self.total_attempts())
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub domain: String,
    pub target_count: u32,
    pub duration_hours: u32,
    pub plan: BatchPlan,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Elapsed run time as measured by the runtime clock.
    pub elapsed: Duration,
    pub batches: Vec<Batch>,
    pub emails_created: usize,
    /// The run stopped early on the shutdown signal.
    pub cancelled: bool,
}

impl RunResult {
    pub fn batches_completed(&self) -> usize {
        self.batches.len()
    }

    /// Attempts made across all batches.
    pub fn attempted(&self) -> usize {
        self.batches.iter().map(Batch::len).sum()
    }

    /// Every generated identity in generation order.
    pub fn identities(&self) -> Vec<&Identity> {
        self.batches.iter().flat_map(Batch::identities).collect()
    }
}

/// Drives a run: batches, pacing and bookkeeping.
pub struct Scheduler<B, R> {
    generator: IdentityGenerator,
    limiter: RateLimiter,
    backend: B,
    rng: R,
    telemetry: RunTelemetry,
    shutdown: Option<watch::Receiver<bool>>,
}

impl Scheduler<SimulatedBackend<ChaCha8Rng>, ChaCha8Rng> {
    /// Build a fully simulated scheduler from configuration.
    ///
    /// With `config.seed` set, identities and outcomes are reproducible.
    pub fn from_config(config: &Config) -> crate::error::Result<Self> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let backend = SimulatedBackend::new(
            &config.simulation,
            ChaCha8Rng::seed_from_u64(rng.gen()),
        );
        let generator = match &config.domain {
            Some(domain) => IdentityGenerator::new(domain.clone()),
            None => IdentityGenerator::with_random_domain(&mut rng),
        };

        Self::new(
            generator,
            RateLimiter::from_config(&config.rate_limit),
            backend,
            rng,
        )
    }
}

impl<B, R> Scheduler<B, R>
where
    B: AttemptBackend,
    R: Rng,
{
    pub fn new(
        generator: IdentityGenerator,
        limiter: RateLimiter,
        backend: B,
        rng: R,
    ) -> crate::error::Result<Self> {
        Ok(Self {
            generator,
            limiter,
            backend,
            rng,
            telemetry: RunTelemetry::new()?,
            shutdown: None,
        })
    }

    /// Stop between attempts once `shutdown` reads `true`.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn domain(&self) -> &str {
        self.generator.domain()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn telemetry(&self) -> &RunTelemetry {
        &self.telemetry
    }

    /// Run `target_count` attempts spread across `duration_hours`.
    pub async fn execute(
        &mut self,
        target_count: u32,
        duration_hours: u32,
    ) -> Result<RunResult, SchedulerError> {
        let plan = BatchPlan::new(target_count, duration_hours)?;
        info!(
            target_count,
            duration_hours,
            batch_size = plan.batch_size,
            num_batches = plan.num_batches,
            "Starting distributed email creation"
        );
        let shortfall = plan.shortfall(target_count);
        if shortfall > 0 {
            warn!(
                shortfall,
                planned = plan.total_attempts(),
                target_count,
                "Batch size does not divide target; run will under-produce"
            );
        }

        let start_time = Utc::now();
        let started = Instant::now();
        let mut batches = Vec::with_capacity(plan.num_batches);
        let mut emails_created = 0;
        let mut cancelled = false;

        for index in 0..plan.num_batches {
            if self.is_cancelled() {
                cancelled = true;
                break;
            }

            let batch_number = index + 1;
            let batch_started = Instant::now();
            info!(batch_number, num_batches = plan.num_batches, "Starting batch");

            let batch = BatchRunner {
                generator: &self.generator,
                backend: &mut self.backend,
                limiter: &self.limiter,
                rng: &mut self.rng,
                telemetry: &self.telemetry,
                shutdown: self.shutdown.as_mut(),
            }
            .run_batch(batch_number, plan.batch_size)
            .await;

            let in_batch = batch_started.elapsed();
            self.telemetry.record_batch(in_batch);
            emails_created += batch.successful_creations;
            info!(
                batch_number,
                created = batch.successful_creations,
                "Completed batch"
            );
            batches.push(batch);

            if self.is_cancelled() {
                cancelled = true;
                break;
            }

            if batch_number < plan.num_batches {
                match plan.slot.checked_sub(in_batch) {
                    Some(wait) if !wait.is_zero() => {
                        debug!(?wait, "Waiting for next batch slot");
                        if !sleep_unless_cancelled(wait, self.shutdown.as_mut()).await {
                            cancelled = true;
                            break;
                        }
                    }
                    Some(_) => {}
                    None => {
                        warn!(
                            batch_number,
                            overrun = ?(in_batch - plan.slot),
                            "Batch overran its slot"
                        );
                    }
                }
            }
        }

        let elapsed = started.elapsed();
        let result = RunResult {
            domain: self.generator.domain().to_string(),
            target_count,
            duration_hours,
            plan,
            start_time,
            end_time: Utc::now(),
            elapsed,
            batches,
            emails_created,
            cancelled,
        };

        info!(
            emails_created,
            attempted = result.attempted(),
            elapsed_secs = elapsed.as_secs_f64(),
            cancelled,
            "Distributed email creation completed"
        );
        Ok(result)
    }

    fn is_cancelled(&self) -> bool {
        self.shutdown
            .as_ref()
            .map(|rx| *rx.borrow())
            .unwrap_or(false)
    }
}
