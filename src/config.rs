//! Report configuration, read from a JSON file and overridden by CLI flags.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::export::ExportTarget;
use crate::report::SummaryBounds;
use crate::stats::DEFAULT_PERIOD_LABEL;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Pixel size of rendered chart images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartSettings {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub company_name: String,
    /// Word used in the narrative ("This <period>, ...")
    pub period_label: String,
    pub export_targets: BTreeSet<ExportTarget>,
    pub output_dir: PathBuf,
    pub summary: SummaryBounds,
    /// Program and arguments of an external summarizer; empty means passthrough
    pub summarizer_command: Vec<String>,
    /// Extra columns aggregated with zero-fill when absent
    pub optional_columns: Vec<String>,
    /// Decimal places kept in the spreadsheet export
    pub decimals: usize,
    pub chart: ChartSettings,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            company_name: "DemoCo".to_string(),
            period_label: DEFAULT_PERIOD_LABEL.to_string(),
            export_targets: ExportTarget::all(),
            output_dir: PathBuf::from("."),
            summary: SummaryBounds::default(),
            summarizer_command: Vec::new(),
            optional_columns: Vec::new(),
            decimals: 2,
            chart: ChartSettings::default(),
        }
    }
}

impl ReportConfig {
    /// Read and validate a JSON config. Missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ReportConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.company_name.trim().is_empty() {
            return Err(ConfigError::Invalid("company_name must not be empty".into()));
        }
        if self.period_label.trim().is_empty() {
            return Err(ConfigError::Invalid("period_label must not be empty".into()));
        }
        if self.summary.min_length > self.summary.max_length {
            return Err(ConfigError::Invalid(format!(
                "summary.min_length ({}) exceeds summary.max_length ({})",
                self.summary.min_length, self.summary.max_length
            )));
        }
        if self.chart.width == 0 || self.chart.height == 0 {
            return Err(ConfigError::Invalid("chart width and height must be positive".into()));
        }
        if self.decimals > 10 {
            return Err(ConfigError::Invalid(format!(
                "decimals must be at most 10, got {}",
                self.decimals
            )));
        }
        Ok(())
    }
}
