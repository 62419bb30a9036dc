// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Mailbox Simulator
//!
//! Generates synthetic mailbox identities and pushes them through a paced,
//! time-distributed batch of simulated creation attempts, then folds the
//! outcomes into run metrics and a JSON report.
//!
//! - Identities from four username shapes on one domain
//! - Fixed pause of `3600 / max_per_hour` seconds after every attempt
//! - Batches spread evenly across the requested duration
//! - Swappable `AttemptBackend`; the shipped one is purely random
//! - Seedable randomness for reproducible runs
//!
//! No network traffic is ever generated.

pub mod attempt;
pub mod batch;
pub mod config;
pub mod error;
pub mod identity;
pub mod limiter;
pub mod metrics;
pub mod report;
pub mod scheduler;
pub mod telemetry;

pub use attempt::{AttemptBackend, AttemptError, AttemptOutcome, SimulatedBackend};
pub use batch::{AttemptResult, AttemptStatus, Batch, BatchRunner};
pub use config::Config;
pub use error::{Error, Result};
pub use identity::{Identity, IdentityGenerator};
pub use limiter::RateLimiter;
pub use metrics::RunMetrics;
pub use report::Report;
pub use scheduler::{BatchPlan, RunResult, Scheduler};
pub use telemetry::RunTelemetry;
