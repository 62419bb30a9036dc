// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Batch execution.
//!
//! A batch generates one identity per slot, attempts it, records the
//! outcome and then pauses for the rate limit. A failed attempt never stops
//! the batch; only the shutdown signal can cut it short.

use crate::attempt::{AttemptBackend, AttemptOutcome};
use crate::identity::{Identity, IdentityGenerator};
use crate::limiter::RateLimiter;
use crate::telemetry::{AttemptKind, RunTelemetry};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Status of one attempt as it appears in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptStatus {
    Success {
        /// How long the simulated mailbox stays usable, in seconds.
        duration: u64,
    },
    Failure {
        error: String,
    },
}

/// One recorded attempt. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptResult {
    pub email: Identity,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub status: AttemptStatus,
}

impl AttemptResult {
    pub fn is_success(&self) -> bool {
        matches!(self.status, AttemptStatus::Success { .. })
    }
}

/// A finished batch.
#[derive(Debug, Clone, Serialize)]
pub struct Batch {
    pub batch_number: usize,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub successful_creations: usize,
    pub failed_creations: usize,
    pub attempts: Vec<AttemptResult>,
}

impl Batch {
    /// Seal a batch, deriving its success/failure counts.
    pub fn finalize(
        batch_number: usize,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        attempts: Vec<AttemptResult>,
    ) -> Self {
        let successful_creations = attempts.iter().filter(|a| a.is_success()).count();
        Self {
            batch_number,
            start_time,
            end_time,
            successful_creations,
            failed_creations: attempts.len() - successful_creations,
            attempts,
        }
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    pub fn identities(&self) -> impl Iterator<Item = &Identity> {
        self.attempts.iter().map(|a| &a.email)
    }
}

/// Runs batches of attempts against a backend.
pub struct BatchRunner<'a, B, R> {
    pub generator: &'a IdentityGenerator,
    pub backend: &'a mut B,
    pub limiter: &'a RateLimiter,
    pub rng: &'a mut R,
    pub telemetry: &'a RunTelemetry,
    pub shutdown: Option<&'a mut watch::Receiver<bool>>,
}

impl<B, R> BatchRunner<'_, B, R>
where
    B: AttemptBackend,
    R: Rng,
{
    /// Run `batch_size` attempts and seal them into batch `batch_number`.
    pub async fn run_batch(&mut self, batch_number: usize, batch_size: usize) -> Batch {
        let start_time = Utc::now();
        let mut attempts = Vec::with_capacity(batch_size);

        for i in 0..batch_size {
            if self.cancelled() {
                warn!(batch_number, completed = i, batch_size, "Batch cancelled");
                break;
            }

            let identity = self.generator.generate_one(&mut *self.rng);
            let result = self.attempt_one(identity, i + 1, batch_size).await;
            attempts.push(result);

            if !self.limiter.pause(self.shutdown.as_deref_mut()).await {
                warn!(batch_number, completed = i + 1, batch_size, "Batch cancelled");
                break;
            }
        }

        let batch = Batch::finalize(batch_number, start_time, Utc::now(), attempts);
        info!(
            batch_number,
            successful = batch.successful_creations,
            failed = batch.failed_creations,
            "Temporary email creation completed"
        );
        batch
    }

    async fn attempt_one(&mut self, email: Identity, n: usize, of: usize) -> AttemptResult {
        let status = match self.backend.attempt(&email).await {
            Ok(AttemptOutcome::Created { valid_for }) => {
                info!(n, of, email = %email, "Created temporary email");
                self.telemetry.record_attempt(AttemptKind::Success);
                AttemptStatus::Success {
                    duration: valid_for.as_secs(),
                }
            }
            Ok(AttemptOutcome::Rejected { reason }) => {
                warn!(n, of, email = %email, %reason, "Failed to create temporary email");
                self.telemetry.record_attempt(AttemptKind::Failure);
                AttemptStatus::Failure { error: reason }
            }
            Err(fault) => {
                error!(n, email = %email, error = %fault, "Error creating temporary email");
                self.telemetry.record_attempt(AttemptKind::Fault);
                AttemptStatus::Failure {
                    error: fault.to_string(),
                }
            }
        };

        AttemptResult {
            email,
            timestamp: Utc::now(),
            status,
        }
    }

    fn cancelled(&self) -> bool {
        self.shutdown
            .as_ref()
            .map(|rx| *rx.borrow())
            .unwrap_or(false)
    }
}
