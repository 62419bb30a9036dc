// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Creation attempts.
//!
//! `AttemptBackend` is the single point where a mailbox is "created". The
//! shipped `SimulatedBackend` never touches the network: it waits a random
//! response time and then draws success or failure.

use crate::config::SimulationConfig;
use crate::identity::Identity;
use rand::Rng;
use std::future::Future;
use std::ops::RangeInclusive;
use std::time::Duration;
use thiserror::Error;

/// Unexpected fault while attempting a creation.
///
/// Faults are converted into failure records by the batch runner and
/// never leave the batch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AttemptError {
    #[error("Backend fault: {0}")]
    Backend(String),

    #[error("Attempt timed out after {0:?}")]
    Timeout(Duration),
}

/// Outcome of one attempt that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The mailbox exists and stays usable for `valid_for`.
    Created { valid_for: Duration },
    /// The service declined, with a reason.
    Rejected { reason: String },
}

impl AttemptOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Created { .. })
    }
}

/// Something that can attempt to create a mailbox for an identity.
pub trait AttemptBackend {
    /// Attempt creation once. No retries.
    fn attempt(
        &mut self,
        identity: &Identity,
    ) -> impl Future<Output = Result<AttemptOutcome, AttemptError>> + Send;
}

/// Random stand-in for a mailbox service.
#[derive(Debug)]
pub struct SimulatedBackend<R> {
    rng: R,
    success_probability: f64,
    validity_secs: RangeInclusive<u64>,
    latency: RangeInclusive<Duration>,
    failure_reason: String,
}

impl<R: Rng + Send> SimulatedBackend<R> {
    /// Create a simulated backend drawing from `rng`.
    pub fn new(config: &SimulationConfig, rng: R) -> Self {
        Self {
            rng,
            success_probability: config.success_probability.clamp(0.0, 1.0),
            validity_secs: config.validity_range(),
            latency: config.latency_range(),
            failure_reason: config.failure_reason.clone(),
        }
    }

    fn draw_latency(&mut self) -> Duration {
        let (low, high) = (*self.latency.start(), *self.latency.end());
        if low >= high {
            low
        } else {
            self.rng.gen_range(low..=high)
        }
    }

    fn draw_outcome(&mut self) -> AttemptOutcome {
        if self.rng.gen_bool(self.success_probability) {
            let (low, high) = (*self.validity_secs.start(), *self.validity_secs.end());
            let secs = if low >= high {
                low
            } else {
                self.rng.gen_range(low..=high)
            };
            AttemptOutcome::Created {
                valid_for: Duration::from_secs(secs),
            }
        } else {
            AttemptOutcome::Rejected {
                reason: self.failure_reason.clone(),
            }
        }
    }
}

impl<R: Rng + Send> AttemptBackend for SimulatedBackend<R> {
    async fn attempt(&mut self, _identity: &Identity) -> Result<AttemptOutcome, AttemptError> {
        let latency = self.draw_latency();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        Ok(self.draw_outcome())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn identity() -> Identity {
        Identity::new("demo_4242", "testmail.net")
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_rate_near_probability() {
        let mut backend =
            SimulatedBackend::new(&SimulationConfig::instant(), ChaCha8Rng::seed_from_u64(2024));
        let identity = identity();

        let mut created = 0;
        for _ in 0..1000 {
            if backend.attempt(&identity).await.unwrap().is_success() {
                created += 1;
            }
        }
        assert!((750..=850).contains(&created), "created {created} of 1000");
    }

    #[tokio::test(start_paused = true)]
    async fn test_outcome_details() {
        let mut backend =
            SimulatedBackend::new(&SimulationConfig::instant(), ChaCha8Rng::seed_from_u64(5));
        let identity = identity();

        for _ in 0..200 {
            match backend.attempt(&identity).await.unwrap() {
                AttemptOutcome::Created { valid_for } => {
                    assert!(valid_for >= Duration::from_secs(3600));
                    assert!(valid_for <= Duration::from_secs(7200));
                }
                AttemptOutcome::Rejected { reason } => {
                    assert_eq!(reason, "Service unavailable");
                }
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_latency_within_range() {
        let mut backend =
            SimulatedBackend::new(&SimulationConfig::default(), ChaCha8Rng::seed_from_u64(11));
        let identity = identity();

        for _ in 0..20 {
            let start = tokio::time::Instant::now();
            backend.attempt(&identity).await.unwrap();
            let elapsed = start.elapsed();
            assert!(elapsed >= Duration::from_secs(1), "{elapsed:?}");
            assert!(elapsed <= Duration::from_secs(3), "{elapsed:?}");
        }
    }

    #[tokio::test]
    async fn test_certain_outcomes() {
        let always = SimulationConfig {
            success_probability: 1.0,
            ..SimulationConfig::instant()
        };
        let mut backend = SimulatedBackend::new(&always, ChaCha8Rng::seed_from_u64(0));
        assert!(backend.attempt(&identity()).await.unwrap().is_success());

        let never = SimulationConfig {
            success_probability: 0.0,
            ..SimulationConfig::instant()
        };
        let mut backend = SimulatedBackend::new(&never, ChaCha8Rng::seed_from_u64(0));
        assert!(!backend.attempt(&identity()).await.unwrap().is_success());
    }
}
