//! Structured logging for grading runs
//!
//! Logs always go to stderr: stdout belongs to the console report, and an
//! autograder captures the two streams separately. ANSI colors are only used
//! when stderr is a terminal so captured logs stay plain text.
//!
//! # Formats
//!
//! - `pretty`: one human-readable line per event, for local runs
//! - `json`: one JSON object per event with the enclosing span flattened in,
//!   for autograder log collection
//!
//! An optional log file receives the same events (never colored).
//!
//! # Span and field conventions
//!
//! Every event about one dataset is emitted inside [`dataset_span`], which
//! carries:
//! - `dataset`: dataset name (the file path for glob sources)
//! - `lines`: number of input lines
//!
//! Events inside the span add their own outcome fields:
//! - `dataset scored`: `chi_squared`, `p_value`, `partial_score`
//! - `skipping empty dataset` (warn)
//! - `hash function is not idempotent` (error)
//!
//! The run ends with `evaluation complete` carrying `score`,
//! `leaderboard_value`, `datasets`, `skipped`.
//!
//! Dataset lines and hash values are never logged; submissions may be
//! graded on private data.

pub use crate::config::LogFormat;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::Level;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

static LOGGING_INSTALLED: OnceLock<()> = OnceLock::new();

/// Logging configuration, usually derived from `[general]` in `hashgrade.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Level filter; `RUST_LOG` takes precedence when set
    pub level: String,

    pub format: LogFormat,

    /// Append events to this file as well as stderr
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

impl From<&crate::config::GeneralConfig> for LogConfig {
    fn from(general: &crate::config::GeneralConfig) -> Self {
        Self {
            level: general.log_level.clone(),
            format: general.log_format,
            file: general.log_file.clone(),
        }
    }
}

/// Failure to install the global subscriber
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("logging is already installed for this process")]
    AlreadyInitialized,

    #[error("invalid log level: {0}")]
    InvalidLevel(String),

    #[error("cannot open log file: {0}")]
    FileCreate(#[from] io::Error),

    #[error("cannot install subscriber: {0}")]
    SetSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    File::options().create(true).append(true).open(path)
}

/// Install the global subscriber for this process.
///
/// Only the first call succeeds; later calls return
/// [`LogError::AlreadyInitialized`]. The level is validated before anything
/// is installed.
pub fn init_logging(config: &LogConfig) -> Result<(), LogError> {
    if LOGGING_INSTALLED.get().is_some() {
        return Err(LogError::AlreadyInitialized);
    }
    config
        .level
        .parse::<LogLevel>()
        .map_err(|_| LogError::InvalidLevel(config.level.clone()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let file = config.file.as_deref().map(open_log_file).transpose()?;
    let ansi = io::stderr().is_terminal();

    match config.format {
        LogFormat::Pretty => {
            let stderr_layer = fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .with_ansi(ansi);
            let file_layer = file.map(|f| fmt::layer().with_writer(f).with_ansi(false));
            tracing::subscriber::set_global_default(
                tracing_subscriber::registry()
                    .with(filter)
                    .with(stderr_layer)
                    .with(file_layer),
            )?;
        }
        LogFormat::Json => {
            let stderr_layer = fmt::layer()
                .json()
                .with_writer(io::stderr)
                .with_current_span(true)
                .with_span_list(false)
                .flatten_event(true);
            let file_layer = file.map(|f| {
                fmt::layer()
                    .json()
                    .with_writer(f)
                    .with_current_span(true)
                    .with_span_list(false)
                    .flatten_event(true)
            });
            tracing::subscriber::set_global_default(
                tracing_subscriber::registry()
                    .with(filter)
                    .with(stderr_layer)
                    .with(file_layer),
            )?;
        }
    }

    let _ = LOGGING_INSTALLED.set(());
    tracing::debug!(
        level = %config.level,
        format = %config.format,
        file = ?config.file,
        "logging installed"
    );
    Ok(())
}

pub fn is_logging_initialized() -> bool {
    LOGGING_INSTALLED.get().is_some()
}

/// Span enclosing every event about one dataset.
pub fn dataset_span(name: &str, lines: usize) -> tracing::Span {
    tracing::info_span!("dataset", dataset = %name, lines)
}

/// Level names accepted in `general.log_level` and `--log-level`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(format!(
                "unknown log level: {s}. Expected one of: trace, debug, info, warn, error"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::ReferenceHash;
    use crate::dataset::Dataset;
    use crate::evaluation::{EvaluationConfig, Evaluator};
    use std::sync::{Arc, Mutex};

    /// In-memory writer shared with a scoped subscriber.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn capture_json<F: FnOnce()>(f: F) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_writer(move || writer.clone())
            .with_current_span(true)
            .with_max_level(Level::DEBUG)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        captured.text()
    }

    #[test]
    fn log_level_parses_case_insensitively() {
        assert_eq!("INFO".parse::<LogLevel>(), Ok(LogLevel::Info));
        assert_eq!("warning".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn log_level_converts_to_tracing_level() {
        assert_eq!(Level::from(LogLevel::Debug), Level::DEBUG);
        assert_eq!(Level::from(LogLevel::Error), Level::ERROR);
    }

    #[test]
    fn log_config_follows_general_section() {
        let general = crate::config::GeneralConfig {
            log_level: "debug".to_string(),
            log_format: LogFormat::Json,
            log_file: Some(PathBuf::from("/tmp/hashgrade.log")),
        };
        let config = LogConfig::from(&general);
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.file, general.log_file);
    }

    #[test]
    fn invalid_level_is_rejected_before_install() {
        let config = LogConfig {
            level: "chatty".to_string(),
            ..LogConfig::default()
        };
        // Rejected whether or not another test already installed a subscriber.
        assert!(matches!(
            init_logging(&config),
            Err(LogError::InvalidLevel(_) | LogError::AlreadyInitialized)
        ));
    }

    #[test]
    fn dataset_span_carries_name_and_size() {
        let text = capture_json(|| {
            let span = dataset_span("data/words", 3);
            let _guard = span.enter();
            tracing::info!(p_value = 0.5, "dataset scored");
        });
        assert!(text.contains("\"dataset\":\"data/words\""), "{text}");
        assert!(text.contains("\"lines\":3"), "{text}");
    }

    #[test]
    fn evaluation_events_follow_conventions_without_leaking_lines() {
        let lines: Vec<String> = (0..50).map(|i| format!("secret-{i}\n")).collect();
        let datasets = vec![
            Dataset::new("data/private", lines),
            Dataset::new("data/empty", Vec::new()),
        ];
        let evaluator = Evaluator::new(EvaluationConfig {
            seed: Some(3),
            ..EvaluationConfig::default()
        });

        let text = capture_json(|| {
            evaluator.run(&ReferenceHash::SipHash, &datasets).unwrap();
        });

        assert!(text.contains("dataset scored"), "{text}");
        assert!(text.contains("partial_score"), "{text}");
        assert!(text.contains("skipping empty dataset"), "{text}");
        assert!(text.contains("evaluation complete"), "{text}");
        assert!(!text.contains("secret-"), "dataset contents leaked: {text}");
    }
}
