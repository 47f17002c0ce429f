//! Configuration management for hashgrade
//!
//! Handles loading and validation of `hashgrade.toml`. Every section is
//! optional; missing fields fall back to the grading defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::evaluation::EvaluationConfig;

/// Default config file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "hashgrade.toml";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,

    /// Evaluation parameters
    #[serde(default)]
    pub evaluation: EvaluationConfig,

    /// Dataset discovery
    #[serde(default)]
    pub datasets: DatasetsConfig,

    /// Hash capability location
    #[serde(default)]
    pub capability: CapabilityConfig,

    /// Score reporting
    #[serde(default)]
    pub report: ReportConfig,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => f.write_str("pretty"),
            Self::Json => f.write_str("json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!("unknown log format: {s}. Expected pretty or json")),
        }
    }
}

/// General configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,

    /// Optional log file
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            log_file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Dataset discovery configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetsConfig {
    /// Glob pattern; every matching file is one dataset
    #[serde(default = "default_dataset_pattern")]
    pub pattern: String,

    /// Hash lines without their trailing newline
    #[serde(default)]
    pub strip_line_endings: bool,
}

impl Default for DatasetsConfig {
    fn default() -> Self {
        Self {
            pattern: default_dataset_pattern(),
            strip_line_endings: false,
        }
    }
}

fn default_dataset_pattern() -> String {
    "data/*".to_string()
}

/// Hash capability configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityConfig {
    /// Path to the compiled shared object
    #[serde(default)]
    pub library: Option<PathBuf>,

    /// Exported function name
    #[serde(default = "default_symbol")]
    pub symbol: String,
}

impl Default for CapabilityConfig {
    fn default() -> Self {
        Self {
            library: None,
            symbol: default_symbol(),
        }
    }
}

fn default_symbol() -> String {
    "hash".to_string()
}

/// Reporting configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Where to write the autograder results.json, if anywhere
    #[serde(default)]
    pub results_path: Option<PathBuf>,

    /// Name of the graded test
    #[serde(default = "default_test_name")]
    pub test_name: String,

    /// Leaderboard column name
    #[serde(default = "default_leaderboard_name")]
    pub leaderboard_name: String,

    /// Fixed maximum score; defaults to per_dataset_max times the datasets scored
    #[serde(default)]
    pub max_score: Option<f64>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            results_path: None,
            test_name: default_test_name(),
            leaderboard_name: default_leaderboard_name(),
            max_score: None,
        }
    }
}

fn default_test_name() -> String {
    "Evaluate hash function".to_string()
}

fn default_leaderboard_name() -> String {
    "points".to_string()
}

impl Config {
    /// Load `hashgrade.toml` from the working directory, or defaults if absent
    pub fn load() -> Result<Self> {
        let path = Path::new(DEFAULT_CONFIG_FILE);
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let display = path.display().to_string();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(display).into());
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFailed(display, e.to_string()))?;
        let config = Self::from_toml(&text)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeFailed(e.to_string()).into())
    }

    /// Check cross-field constraints serde cannot express
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| -> Result<()> { Err(ConfigError::ValidationError(msg).into()) };

        if self.evaluation.upper_bound == 0 {
            return invalid("evaluation.upper_bound must be at least 1".to_string());
        }
        let per_dataset_max = self.evaluation.per_dataset_max;
        if !per_dataset_max.is_finite() || per_dataset_max < 0.0 {
            return invalid(format!(
                "evaluation.per_dataset_max must be a non-negative number, got {per_dataset_max}"
            ));
        }
        if let Some(max_score) = self.report.max_score {
            if !max_score.is_finite() || max_score < 0.0 {
                return invalid(format!(
                    "report.max_score must be a non-negative number, got {max_score}"
                ));
            }
        }
        if self.datasets.pattern.trim().is_empty() {
            return invalid("datasets.pattern must not be empty".to_string());
        }
        if self.capability.symbol.trim().is_empty() {
            return invalid("capability.symbol must not be empty".to_string());
        }
        if self.general.log_level.parse::<crate::logging::LogLevel>().is_err() {
            return invalid(format!(
                "general.log_level is not a log level: {}",
                self.general.log_level
            ));
        }
        Ok(())
    }
}
