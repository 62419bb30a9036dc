// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Backends with scripted behaviour.

use mailbox_sim::{AttemptBackend, AttemptError, AttemptOutcome, Identity};
use std::time::Duration;

/// What a scripted backend does on a given call.
#[derive(Debug, Clone)]
pub enum Step {
    Create,
    Reject,
    Fault(&'static str),
}

/// Replays `steps` in a cycle, taking `latency` per call.
#[derive(Debug)]
pub struct ScriptedBackend {
    steps: Vec<Step>,
    latency: Duration,
    pub seen: Vec<Identity>,
}

impl ScriptedBackend {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            latency: Duration::ZERO,
            seen: Vec::new(),
        }
    }

    /// Always succeeds instantly.
    pub fn always_create() -> Self {
        Self::new(vec![Step::Create])
    }

    /// Always rejects instantly.
    pub fn always_reject() -> Self {
        Self::new(vec![Step::Reject])
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

impl AttemptBackend for ScriptedBackend {
    async fn attempt(&mut self, identity: &Identity) -> Result<AttemptOutcome, AttemptError> {
        let step = self.steps[self.seen.len() % self.steps.len()].clone();
        self.seen.push(identity.clone());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match step {
            Step::Create => Ok(AttemptOutcome::Created {
                valid_for: Duration::from_secs(5400),
            }),
            Step::Reject => Ok(AttemptOutcome::Rejected {
                reason: "Service unavailable".to_string(),
            }),
            Step::Fault(message) => Err(AttemptError::Backend(message.to_string())),
        }
    }
}
