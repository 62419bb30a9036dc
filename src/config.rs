// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the mailbox simulator.
//!
//! Every field has a serde default so a partial JSON file is enough to
//! override a single setting.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Configuration for a simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Mailbox domain (default: synthesized from a fixed word/TLD list)
    #[serde(default)]
    pub domain: Option<String>,

    /// Number of identities the run aims to create (default: 100)
    #[serde(default = "default_target_count")]
    pub target_count: u32,

    /// Wall-clock span the batches are spread across (default: 2)
    #[serde(default = "default_duration_hours")]
    pub duration_hours: u32,

    /// Random seed; a fixed seed makes a run reproducible
    #[serde(default)]
    pub seed: Option<u64>,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Simulated backend configuration
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Report persistence configuration
    #[serde(default)]
    pub report: ReportConfig,

    /// Log output configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Static pacing between attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum attempts per hour (default: 50)
    #[serde(default = "default_max_per_hour")]
    pub max_per_hour: u32,
}

/// Parameters of the simulated mailbox service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Probability that an attempt succeeds (default: 0.8)
    #[serde(default = "default_success_probability")]
    pub success_probability: f64,

    /// Shortest simulated mailbox validity in seconds (default: 3600)
    #[serde(default = "default_validity_secs_min")]
    pub validity_secs_min: u64,

    /// Longest simulated mailbox validity in seconds (default: 7200)
    #[serde(default = "default_validity_secs_max")]
    pub validity_secs_max: u64,

    /// Shortest simulated service response time in milliseconds (default: 1000)
    #[serde(default = "default_latency_ms_min")]
    pub latency_ms_min: u64,

    /// Longest simulated service response time in milliseconds (default: 3000)
    #[serde(default = "default_latency_ms_max")]
    pub latency_ms_max: u64,

    /// Reason recorded for a simulated failure
    #[serde(default = "default_failure_reason")]
    pub failure_reason: String,
}

/// Report persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Write the JSON report at run end (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Directory the report file is written into (default: ".")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

/// Log output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log file appended to alongside stdout
    #[serde(default = "default_log_file")]
    pub file: PathBuf,

    /// Emit JSON lines on stdout instead of plain text
    #[serde(default)]
    pub json: bool,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Write Prometheus text exposition at run end (default: false)
    #[serde(default)]
    pub enabled: bool,

    /// Metrics output file (default: mailbox_sim_metrics.prom)
    #[serde(default = "default_metrics_path")]
    pub path: PathBuf,
}

/// Values given on the command line or through the environment.
///
/// Each set field replaces whatever the defaults or the config file said.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub target_count: Option<u32>,
    pub duration_hours: Option<u32>,
    pub max_per_hour: Option<u32>,
    pub domain: Option<String>,
    pub seed: Option<u64>,
    pub output_dir: Option<PathBuf>,
    pub no_report: bool,
    pub log_file: Option<PathBuf>,
    pub log_json: bool,
    /// Setting a metrics file also enables metrics output.
    pub metrics_file: Option<PathBuf>,
    pub no_latency: bool,
}

// Default value functions
fn default_target_count() -> u32 {
    100
}

fn default_duration_hours() -> u32 {
    2
}

fn default_max_per_hour() -> u32 {
    50
}

fn default_success_probability() -> f64 {
    0.8
}

fn default_validity_secs_min() -> u64 {
    3600
}

fn default_validity_secs_max() -> u64 {
    7200
}

fn default_latency_ms_min() -> u64 {
    1000
}

fn default_latency_ms_max() -> u64 {
    3000
}

fn default_failure_reason() -> String {
    "Service unavailable".to_string()
}

fn default_true() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_log_file() -> PathBuf {
    PathBuf::from("email_generation_test.log")
}

fn default_metrics_path() -> PathBuf {
    PathBuf::from("mailbox_sim_metrics.prom")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            domain: None,
            target_count: default_target_count(),
            duration_hours: default_duration_hours(),
            seed: None,
            rate_limit: RateLimitConfig::default(),
            simulation: SimulationConfig::default(),
            report: ReportConfig::default(),
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_per_hour: default_max_per_hour(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            success_probability: default_success_probability(),
            validity_secs_min: default_validity_secs_min(),
            validity_secs_max: default_validity_secs_max(),
            latency_ms_min: default_latency_ms_min(),
            latency_ms_max: default_latency_ms_max(),
            failure_reason: default_failure_reason(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            output_dir: default_output_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            json: false,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_metrics_path(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file. Missing fields take defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults, then the optional JSON file at `path`, then `overrides`.
    /// The merged result is validated.
    pub fn load(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(target_count) = overrides.target_count {
            self.target_count = target_count;
        }
        if let Some(duration_hours) = overrides.duration_hours {
            self.duration_hours = duration_hours;
        }
        if let Some(max_per_hour) = overrides.max_per_hour {
            self.rate_limit.max_per_hour = max_per_hour;
        }
        if let Some(domain) = &overrides.domain {
            self.domain = Some(domain.clone());
        }
        if let Some(seed) = overrides.seed {
            self.seed = Some(seed);
        }
        if let Some(output_dir) = &overrides.output_dir {
            self.report.output_dir = output_dir.clone();
        }
        if overrides.no_report {
            self.report.enabled = false;
        }
        if let Some(log_file) = &overrides.log_file {
            self.logging.file = log_file.clone();
        }
        if overrides.log_json {
            self.logging.json = true;
        }
        if let Some(metrics_file) = &overrides.metrics_file {
            self.metrics.enabled = true;
            self.metrics.path = metrics_file.clone();
        }
        if overrides.no_latency {
            let instant = SimulationConfig::instant();
            self.simulation.latency_ms_min = instant.latency_ms_min;
            self.simulation.latency_ms_max = instant.latency_ms_max;
        }
    }

    /// Reject values the scheduler cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_count == 0 {
            return Err(invalid("target_count", "must be at least 1"));
        }
        if self.duration_hours == 0 {
            return Err(invalid("duration_hours", "must be at least 1"));
        }
        if self.rate_limit.max_per_hour == 0 {
            return Err(invalid("rate_limit.max_per_hour", "must be at least 1"));
        }
        if let Some(domain) = &self.domain {
            if domain.trim().is_empty() {
                return Err(invalid("domain", "must not be empty"));
            }
            if domain.contains('@') {
                return Err(invalid("domain", "must not contain '@'"));
            }
        }
        self.simulation.validate()
    }
}

impl SimulationConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.success_probability) {
            return Err(invalid(
                "simulation.success_probability",
                format!("{} is outside [0, 1]", self.success_probability),
            ));
        }
        if self.validity_secs_min > self.validity_secs_max {
            return Err(invalid(
                "simulation.validity_secs_min",
                "exceeds validity_secs_max",
            ));
        }
        if self.latency_ms_min > self.latency_ms_max {
            return Err(invalid("simulation.latency_ms_min", "exceeds latency_ms_max"));
        }
        Ok(())
    }

    /// Range the simulated validity window is drawn from.
    pub fn validity_range(&self) -> RangeInclusive<u64> {
        self.validity_secs_min..=self.validity_secs_max
    }

    /// Range the simulated response time is drawn from.
    pub fn latency_range(&self) -> RangeInclusive<Duration> {
        Duration::from_millis(self.latency_ms_min)..=Duration::from_millis(self.latency_ms_max)
    }

    /// A simulation with no response delay, for tests and dry runs.
    pub fn instant() -> Self {
        Self {
            latency_ms_min: 0,
            latency_ms_max: 0,
            ..Default::default()
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.target_count, 100);
        assert_eq!(config.duration_hours, 2);
        assert_eq!(config.rate_limit.max_per_hour, 50);
        assert_eq!(config.simulation.success_probability, 0.8);
        assert_eq!(config.simulation.failure_reason, "Service unavailable");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"target_count": 7, "rate_limit": {}}"#).unwrap();
        assert_eq!(config.target_count, 7);
        assert_eq!(config.duration_hours, 2);
        assert_eq!(config.rate_limit.max_per_hour, 50);
        assert!(config.report.enabled);
    }

    #[test]
    fn test_rejects_zero_rate() {
        let mut config = Config::default();
        config.rate_limit.max_per_hour = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "rate_limit.max_per_hour", .. })
        ));
    }

    #[test]
    fn test_rejects_zero_duration_and_target() {
        let config = Config {
            duration_hours: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            target_count: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_probability_and_domain() {
        let mut config = Config::default();
        config.simulation.success_probability = 1.5;
        assert!(config.validate().is_err());

        let config = Config {
            domain: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_ranges() {
        let mut config = Config::default();
        config.simulation.validity_secs_min = 9000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_overrides_only_its_fields() {
        let file = config_file(
            r#"{"domain": "safetest.net", "rate_limit": {"max_per_hour": 120}}"#,
        );
        let config = Config::from_file(file.path()).unwrap();

        assert_eq!(config.domain.as_deref(), Some("safetest.net"));
        assert_eq!(config.rate_limit.max_per_hour, 120);
        assert_eq!(config.target_count, 100);
        assert_eq!(config.duration_hours, 2);
        assert_eq!(config.simulation.success_probability, 0.8);
        assert_eq!(config.logging.file, PathBuf::from("email_generation_test.log"));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");

        match Config::from_file(&path) {
            Err(ConfigError::Read { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected read error, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let file = config_file(r#"{"target_count": "many""#);
        assert!(matches!(
            Config::from_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_overrides_beat_file_beat_defaults() {
        let file = config_file(r#"{"target_count": 40, "duration_hours": 4, "seed": 5}"#);
        let overrides = ConfigOverrides {
            target_count: Some(12),
            domain: Some("checkmail.org".to_string()),
            metrics_file: Some(PathBuf::from("run.prom")),
            no_report: true,
            no_latency: true,
            ..Default::default()
        };
        let config = Config::load(Some(file.path()), &overrides).unwrap();

        // Override wins over the file.
        assert_eq!(config.target_count, 12);
        assert_eq!(config.domain.as_deref(), Some("checkmail.org"));
        // File wins over defaults.
        assert_eq!(config.duration_hours, 4);
        assert_eq!(config.seed, Some(5));
        // Defaults fill the rest.
        assert_eq!(config.rate_limit.max_per_hour, 50);

        assert!(!config.report.enabled);
        assert!(config.metrics.enabled);
        assert_eq!(config.metrics.path, PathBuf::from("run.prom"));
        assert_eq!(config.simulation.latency_ms_max, 0);
        assert_eq!(config.simulation.validity_secs_max, 7200);
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = Config::load(None, &ConfigOverrides::default()).unwrap();
        assert_eq!(config.target_count, 100);
        assert!(config.report.enabled);
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn test_load_validates_merged_config() {
        let file = config_file(r#"{"target_count": 10}"#);
        let overrides = ConfigOverrides {
            max_per_hour: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            Config::load(Some(file.path()), &overrides),
            Err(ConfigError::Invalid { field: "rate_limit.max_per_hour", .. })
        ));
    }

    #[test]
    fn test_logging_overrides_apply_without_a_valid_file() {
        // A run whose config fails to load still logs to the requested sink.
        let mut config = Config::default();
        config.apply_overrides(&ConfigOverrides {
            log_file: Some(PathBuf::from("custom.log")),
            log_json: true,
            ..Default::default()
        });
        assert_eq!(config.logging.file, PathBuf::from("custom.log"));
        assert!(config.logging.json);
    }
}
