// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error types for the mailbox simulator.

use thiserror::Error;

pub use crate::attempt::AttemptError;
pub use crate::config::ConfigError;
pub use crate::report::ReportError;
pub use crate::scheduler::SchedulerError;

/// Top-level error for a simulation run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] prometheus::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
