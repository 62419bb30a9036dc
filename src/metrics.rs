// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Run-level performance metrics.

use crate::scheduler::RunResult;
use serde::Serialize;
use std::time::Duration;

/// Aggregate figures derived once from a finished run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunMetrics {
    pub emails_created: usize,
    /// Percentage of the requested target that was created, in [0, 100].
    pub success_rate: f64,
    /// Seconds of run time per created mailbox; 0 when none were created.
    pub average_creation_time: f64,
    pub total_duration_seconds: f64,
    /// 0 when no time elapsed.
    pub emails_per_hour: f64,
}

impl RunMetrics {
    pub fn aggregate(result: &RunResult) -> Self {
        Self::from_counts(result.emails_created, result.target_count, result.elapsed)
    }

    /// Compute metrics from raw counts.
    pub fn from_counts(emails_created: usize, target_count: u32, elapsed: Duration) -> Self {
        let total = elapsed.as_secs_f64();
        let created = emails_created as f64;

        let success_rate = if target_count == 0 {
            0.0
        } else {
            (created / target_count as f64 * 100.0).clamp(0.0, 100.0)
        };
        let average_creation_time = if emails_created == 0 {
            0.0
        } else {
            total / created
        };
        let emails_per_hour = if total > 0.0 {
            created / total * 3600.0
        } else {
            0.0
        };

        Self {
            emails_created,
            success_rate,
            average_creation_time,
            total_duration_seconds: total,
            emails_per_hour,
        }
    }
}
