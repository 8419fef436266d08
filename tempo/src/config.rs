//! Tempo configuration

use crate::metrics::FairnessPolicy;
use crate::report::OutputFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tempo_core::SchedConfig;
use tracing::info;

/// Tempo configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TempoConfig {
    /// Scheduler tuning
    #[serde(default)]
    pub scheduler: SchedConfig,

    /// Report settings
    #[serde(default)]
    pub report: ReportConfig,
}

/// Report configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// How the fairness index measures elapsed time
    #[serde(default)]
    pub fairness: FairnessPolicy,

    /// Decimal places for averages
    #[serde(default = "default_precision")]
    pub precision: usize,

    /// Print the execution timeline
    #[serde(default)]
    pub timeline: bool,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            fairness: FairnessPolicy::default(),
            precision: default_precision(),
            timeline: false,
            format: OutputFormat::default(),
        }
    }
}

fn default_precision() -> usize {
    2
}

/// Parse and validate configuration text
pub fn parse_config(contents: &str) -> Result<TempoConfig> {
    let config: TempoConfig = serde_yaml::from_str(contents)?;
    config.scheduler.validate()?;
    Ok(config)
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<TempoConfig> {
    if path.exists() {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = parse_config(&contents)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    } else {
        info!("No configuration file found, using defaults");
        Ok(TempoConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config = parse_config("scheduler:\n  rr_quantum: 4\n").unwrap();
        assert_eq!(config.scheduler.rr_quantum, 4);
        assert_eq!(config.scheduler.target_latency, 20);
        assert_eq!(config.scheduler.min_granularity, 3);
        assert_eq!(config.report.precision, 2);
        assert_eq!(config.report.fairness, FairnessPolicy::ExcludeResponse);
    }

    #[test]
    fn test_report_section() {
        let yaml = "report:\n  fairness: turnaround\n  timeline: true\n  format: json\n";
        let config = parse_config(yaml).unwrap();
        assert_eq!(config.report.fairness, FairnessPolicy::Turnaround);
        assert!(config.report.timeline);
        assert_eq!(config.report.format, OutputFormat::Json);
    }

    #[test]
    fn test_invalid_scheduler_rejected() {
        assert!(parse_config("scheduler:\n  min_granularity: 0\n").is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config.scheduler, SchedConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tempo.yaml");
        std::fs::write(&path, "scheduler:\n  target_latency: 48\n  io_bonus_factor: 0.5\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.scheduler.target_latency, 48);
        assert_eq!(config.scheduler.io_bonus_factor, 0.5);
    }
}
