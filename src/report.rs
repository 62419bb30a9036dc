// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Run report assembly and persistence.
//!
//! The report is a single pretty-printed JSON document named after the
//! run start time: `email_generation_test_report_YYYYMMDD_HHMMSS.json`.

use crate::batch::Batch;
use crate::identity::Identity;
use crate::metrics::RunMetrics;
use crate::scheduler::RunResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Version of the report layout. Bump on any field change.
pub const SCHEMA_VERSION: u32 = 1;

/// Report persistence errors.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Snapshot of a finished run.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub schema_version: u32,
    pub test_date: String,
    pub test_duration: String,
    pub domain: &'a str,
    pub target_email_count: u32,
    pub generated_email_count: usize,
    pub successfully_created: usize,
    pub success_rate: String,
    pub performance_metrics: RunMetrics,
    pub generated_emails: Vec<&'a Identity>,
    pub detailed_results: DetailedResults<'a>,
}

/// Per-batch section of the report.
#[derive(Debug, Serialize)]
pub struct DetailedResults<'a> {
    pub batches_completed: usize,
    pub emails_created: usize,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub cancelled: bool,
    pub batch_details: &'a [Batch],
}

impl<'a> Report<'a> {
    pub fn build(result: &'a RunResult, metrics: RunMetrics) -> Self {
        let generated_emails = result.identities();
        Self {
            schema_version: SCHEMA_VERSION,
            test_date: result.start_time.format("%Y-%m-%d").to_string(),
            test_duration: format!("{:.2} hours", result.elapsed.as_secs_f64() / 3600.0),
            domain: &result.domain,
            target_email_count: result.target_count,
            generated_email_count: generated_emails.len(),
            successfully_created: result.emails_created,
            success_rate: format!("{:.2}%", metrics.success_rate),
            performance_metrics: metrics,
            generated_emails,
            detailed_results: DetailedResults {
                batches_completed: result.batches_completed(),
                emails_created: result.emails_created,
                start_time: result.start_time,
                end_time: result.end_time,
                cancelled: result.cancelled,
                batch_details: &result.batches,
            },
        }
    }

    /// File name derived from the run start time.
    pub fn file_name(start_time: DateTime<Utc>) -> String {
        format!(
            "email_generation_test_report_{}.json",
            start_time.format("%Y%m%d_%H%M%S")
        )
    }

    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report into `dir`, returning the file path.
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf, ReportError> {
        let path = dir.join(Self::file_name(self.detailed_results.start_time));
        let file = File::create(&path).map_err(|source| ReportError::Io {
            path: path.clone(),
            source,
        })?;
        self.write_json(BufWriter::new(file), &path)?;

        info!(path = %path.display(), "Test report saved");
        Ok(path)
    }

    /// Write failures are reported against `path`, not as serialization errors.
    fn write_json(&self, mut writer: impl Write, path: &Path) -> Result<(), ReportError> {
        let io_err = |source: std::io::Error| ReportError::Io {
            path: path.to_path_buf(),
            source,
        };
        serde_json::to_writer_pretty(&mut writer, self).map_err(|e| {
            if e.is_io() {
                io_err(e.into())
            } else {
                ReportError::Serialize(e)
            }
        })?;
        writer.flush().map_err(io_err)
    }
}
