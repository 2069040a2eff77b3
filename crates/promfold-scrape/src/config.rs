//! Collector configuration file.
//!
//! ```toml
//! [[targets]]
//! module = "tekton"
//! metricset = "taskruns"
//! hosts = ["tekton-pipelines-controller:9090"]
//! period = "10s"
//! timeout = "5s"
//! # mapping = "taskruns.toml"   # replaces the built-in mapping
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PERIOD: Duration = Duration::from_secs(10);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectorConfig {
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    pub module: String,
    pub metricset: String,
    pub hosts: Vec<String>,
    pub period: Option<String>,
    pub timeout: Option<String>,
    pub mapping: Option<PathBuf>,
}

impl TargetConfig {
    pub fn period(&self) -> anyhow::Result<Duration> {
        duration_or(self.period.as_deref(), DEFAULT_PERIOD)
    }

    pub fn timeout(&self) -> anyhow::Result<Duration> {
        duration_or(self.timeout.as_deref(), DEFAULT_TIMEOUT)
    }
}

impl CollectorConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;
        // Mapping paths are relative to the config file.
        if let Some(dir) = path.parent() {
            for target in &mut config.targets {
                if let Some(mapping) = &target.mapping {
                    if mapping.is_relative() {
                        target.mapping = Some(dir.join(mapping));
                    }
                }
            }
        }
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: CollectorConfig = toml::from_str(content)?;
        Ok(config)
    }
}

fn duration_or(value: Option<&str>, default: Duration) -> anyhow::Result<Duration> {
    match value {
        None => Ok(default),
        Some(s) => parse_interval(s),
    }
}

/// Parse a period or timeout; it must be a valid duration above zero.
pub fn parse_interval(s: &str) -> anyhow::Result<Duration> {
    let Some(duration) = parse_duration(s) else {
        anyhow::bail!("invalid duration {s:?}");
    };
    if duration.is_zero() {
        anyhow::bail!("duration {s:?} must be positive");
    }
    Ok(duration)
}

/// Parse a duration string like "5s", "500ms", "1m". A bare number is
/// seconds. Out-of-range values yield `None`.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    let (digits, unit_ms): (&str, u64) = if let Some(n) = s.strip_suffix("ms") {
        (n, 1)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1_000)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60_000)
    } else {
        (s, 1_000)
    };
    let count = digits.parse::<u64>().ok()?;
    count.checked_mul(unit_ms).map(Duration::from_millis)
}
