//! Error types for hashgrade-core

use std::fmt::Write;
use thiserror::Error;

/// Remediation command for resolving an error
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RemediationCommand {
    /// Short label describing the command purpose
    pub label: String,
    /// Command to run
    pub command: String,
}

/// Actionable remediation guidance for an error
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Remediation {
    /// One-line summary of how to fix the issue
    pub summary: String,
    /// Suggested commands to resolve or diagnose the issue
    pub commands: Vec<RemediationCommand>,
    /// Additional alternative guidance
    pub alternatives: Vec<String>,
}

impl Remediation {
    /// Create a new remediation with a summary
    #[must_use]
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            commands: Vec::new(),
            alternatives: Vec::new(),
        }
    }

    /// Add a suggested command
    #[must_use]
    pub fn command(mut self, label: impl Into<String>, command: impl Into<String>) -> Self {
        self.commands.push(RemediationCommand {
            label: label.into(),
            command: command.into(),
        });
        self
    }

    /// Add an alternative suggestion
    #[must_use]
    pub fn alternative(mut self, alternative: impl Into<String>) -> Self {
        self.alternatives.push(alternative.into());
        self
    }

    /// Render remediation text for human-readable output
    #[must_use]
    pub fn render_plain(&self) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "To fix:");
        let _ = writeln!(output, "  {}", self.summary);

        if !self.commands.is_empty() {
            let _ = writeln!(output, "  Commands:");
            for cmd in &self.commands {
                let _ = writeln!(output, "    - {}: {}", cmd.label, cmd.command);
            }
        }

        if !self.alternatives.is_empty() {
            let _ = writeln!(output, "  Alternatives:");
            for alt in &self.alternatives {
                let _ = writeln!(output, "    - {alt}");
            }
        }

        output
    }
}

/// Result type alias using the library's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for hashgrade-core
#[derive(Error, Debug)]
pub enum Error {
    /// The external hash capability failed
    #[error("Hash capability error: {0}")]
    Capability(#[from] CapabilityError),

    /// The evaluation itself failed (non-determinism, degenerate input)
    #[error("Evaluation failed: {0}")]
    Evaluation(#[from] EvaluationError),

    /// Dataset discovery or reading failed
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Score reporting errors
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True when the run failed because the hash function is not deterministic.
    ///
    /// This is a graded outcome (the submission fails), as opposed to a fatal
    /// error that prevented grading altogether.
    #[must_use]
    pub fn is_hard_failure(&self) -> bool {
        matches!(
            self,
            Self::Evaluation(EvaluationError::NonDeterministic { .. })
        )
    }

    /// Return remediation guidance when available.
    #[must_use]
    pub fn remediation(&self) -> Option<Remediation> {
        match self {
            Self::Capability(err) => Some(err.remediation()),
            Self::Evaluation(err) => Some(err.remediation()),
            Self::Dataset(err) => Some(err.remediation()),
            Self::Config(err) => Some(err.remediation()),
            Self::Report(err) => Some(err.remediation()),
            Self::Io(_) => Some(
                Remediation::new("Check filesystem permissions and paths, then retry.")
                    .command("Show config", "hashgrade config")
                    .alternative("Verify the data directory exists and is readable."),
            ),
            Self::Json(_) => Some(
                Remediation::new("Failed to encode results as JSON.")
                    .command("Plain output", "hashgrade run --format plain")
                    .alternative("Check for non-finite scores in the evaluation output."),
            ),
        }
    }
}

/// Errors raised by the external hash capability
#[derive(Error, Debug)]
pub enum CapabilityError {
    /// The artifact providing the hash function could not be loaded
    #[error("Failed to load hash library {path}: {reason}")]
    LoadFailed { path: String, reason: String },

    /// The artifact does not export the expected symbol
    #[error("Symbol `{symbol}` not found in {path}")]
    SymbolNotFound { path: String, symbol: String },

    /// An input cannot be handed to the capability as-is
    #[error("Input cannot be passed to the hash function: {0}")]
    InvalidInput(String),

    /// The capability signalled an error instead of returning a value
    #[error("Hash function failed: {0}")]
    Invocation(String),
}

impl CapabilityError {
    #[must_use]
    pub fn remediation(&self) -> Remediation {
        match self {
            Self::LoadFailed { path, .. } => Remediation::new(format!(
                "Could not load {path}. Rebuild the shared object and check the path."
            ))
            .command("Check file", format!("ls -l \"{path}\""))
            .command("Inspect", format!("file \"{path}\""))
            .alternative("Pass --library with the path to the compiled hash.so."),
            Self::SymbolNotFound { path, symbol } => Remediation::new(format!(
                "Export `{symbol}` with C linkage from {path}."
            ))
            .command("List symbols", format!("nm -D \"{path}\" | grep {symbol}"))
            .alternative("Declare the function `extern \"C\"` to avoid C++ name mangling.")
            .alternative("Pass --symbol if the function has a different name."),
            Self::InvalidInput(_) => {
                Remediation::new("Remove NUL bytes from the dataset; C strings cannot carry them.")
                    .command("Find NUL bytes", "grep -Pl '\\x00' data/*")
            }
            Self::Invocation(_) => {
                Remediation::new("The hash function reported an error. Fix the implementation.")
                    .command("Baseline run", "hashgrade run --reference siphash")
                    .alternative("Compare against a reference hash to rule out harness issues.")
            }
        }
    }
}

/// Errors raised by the evaluation engine
#[derive(Error, Debug)]
pub enum EvaluationError {
    /// The same input hashed to different values across two passes
    #[error("The hash function must be idempotent (mismatch in dataset {dataset})")]
    NonDeterministic { dataset: String },

    /// An empty dataset reached the distribution scorer
    #[error("Dataset {dataset} is empty; a uniformity test needs at least one sample")]
    EmptyDataset { dataset: String },

    /// The capability returned a value above the configured upper bound
    #[error("Hash value {value} exceeds the maximum hash value {upper_bound}")]
    HashOutOfRange { value: u64, upper_bound: u64 },
}

impl EvaluationError {
    #[must_use]
    pub fn remediation(&self) -> Remediation {
        match self {
            Self::NonDeterministic { dataset } => Remediation::new(format!(
                "Hashing the same line twice gave different results (dataset {dataset})."
            ))
            .command("Reproduce", "hashgrade run --seed 1")
            .alternative("Remove global or static state from the hash function.")
            .alternative("Do not read uninitialized memory past the terminating NUL."),
            Self::EmptyDataset { dataset } => {
                Remediation::new(format!("Add lines to {dataset} or remove the file."))
                    .command("Count lines", format!("wc -l \"{dataset}\""))
            }
            Self::HashOutOfRange { upper_bound, .. } => Remediation::new(format!(
                "Return values in [0, {upper_bound}] or raise evaluation.upper_bound."
            ))
            .command("Show config", "hashgrade config"),
        }
    }
}

/// Dataset discovery and reading errors
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Invalid dataset pattern {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Failed to read dataset {path}: {reason}")]
    ReadFailed { path: String, reason: String },
}

impl DatasetError {
    #[must_use]
    pub fn remediation(&self) -> Remediation {
        match self {
            Self::InvalidPattern { .. } => {
                Remediation::new("Fix the glob pattern used to locate datasets.")
                    .command("Example", "hashgrade run --data 'data/*.txt'")
            }
            Self::ReadFailed { path, .. } => {
                Remediation::new(format!("Make {path} a readable UTF-8 text file."))
                    .command("Check encoding", format!("file \"{path}\""))
                    .alternative("Convert the file with iconv -t UTF-8.")
            }
        }
    }
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read config file {0}: {1}")]
    ReadFailed(String, String),

    #[error("Failed to parse config: {0}")]
    ParseFailed(String),

    #[error("Failed to serialize config: {0}")]
    SerializeFailed(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl ConfigError {
    #[must_use]
    pub fn remediation(&self) -> Remediation {
        match self {
            Self::FileNotFound(path) => Remediation::new(format!(
                "Config file not found: {path}. Verify the path and retry."
            ))
            .command("Check path", format!("ls -l \"{path}\""))
            .alternative("Pass --config with the correct path."),
            Self::ReadFailed(path, _) => Remediation::new(format!(
                "Failed to read config file: {path}. Check permissions."
            ))
            .command("Check permissions", format!("ls -l \"{path}\""))
            .alternative("Ensure the file is readable by the current user."),
            Self::ParseFailed(_) => Remediation::new("Config parse failed. Fix the syntax and retry.")
                .command("Show defaults", "hashgrade config")
                .alternative("Validate the TOML syntax."),
            Self::SerializeFailed(_) => {
                Remediation::new("Failed to serialize configuration. Check config values.")
                    .command("Show defaults", "hashgrade config")
            }
            Self::ValidationError(_) => {
                Remediation::new("Config validation failed. Fix the invalid fields and retry.")
                    .command("Show defaults", "hashgrade config")
                    .alternative("Review validation errors and adjust hashgrade.toml.")
            }
        }
    }
}

/// Score reporting errors
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write results to {path}: {reason}")]
    WriteFailed { path: String, reason: String },
}

impl ReportError {
    #[must_use]
    pub fn remediation(&self) -> Remediation {
        match self {
            Self::WriteFailed { path, .. } => {
                Remediation::new(format!("Make sure {path} is writable."))
                    .command("Check directory", format!("ls -ld \"$(dirname \"{path}\")\""))
                    .alternative("Pass --results with a writable location.")
            }
        }
    }
}

/// Format an error with remediation guidance for display.
#[must_use]
pub fn format_error_with_remediation(error: &Error) -> String {
    let mut output = format!("Error: {error}");
    if let Some(remediation) = error.remediation() {
        output.push('\n');
        output.push('\n');
        output.push_str(&remediation.render_plain());
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remediation_available_for_error_variants() {
        let json_err = serde_json::from_str::<serde_json::Value>("").unwrap_err();
        let errors = vec![
            Error::Capability(CapabilityError::LoadFailed {
                path: "hash.so".to_string(),
                reason: "no such file".to_string(),
            }),
            Error::Capability(CapabilityError::SymbolNotFound {
                path: "hash.so".to_string(),
                symbol: "hash".to_string(),
            }),
            Error::Capability(CapabilityError::InvalidInput("nul".to_string())),
            Error::Capability(CapabilityError::Invocation("boom".to_string())),
            Error::Evaluation(EvaluationError::NonDeterministic {
                dataset: "words.txt".to_string(),
            }),
            Error::Evaluation(EvaluationError::EmptyDataset {
                dataset: "empty.txt".to_string(),
            }),
            Error::Evaluation(EvaluationError::HashOutOfRange {
                value: 70_000,
                upper_bound: 65_535,
            }),
            Error::Dataset(DatasetError::InvalidPattern {
                pattern: "[".to_string(),
                reason: "unclosed".to_string(),
            }),
            Error::Dataset(DatasetError::ReadFailed {
                path: "data/a".to_string(),
                reason: "invalid utf-8".to_string(),
            }),
            Error::Config(ConfigError::FileNotFound("hashgrade.toml".to_string())),
            Error::Config(ConfigError::ReadFailed(
                "hashgrade.toml".to_string(),
                "io".to_string(),
            )),
            Error::Config(ConfigError::ParseFailed("parse".to_string())),
            Error::Config(ConfigError::SerializeFailed("serialize".to_string())),
            Error::Config(ConfigError::ValidationError("invalid".to_string())),
            Error::Report(ReportError::WriteFailed {
                path: "results.json".to_string(),
                reason: "denied".to_string(),
            }),
            Error::Io(std::io::Error::other("io")),
            Error::Json(json_err),
        ];

        for error in errors {
            let remediation = error.remediation().expect("missing remediation");
            assert!(
                !remediation.summary.is_empty(),
                "remediation summary empty for {error:?}"
            );
            assert!(
                !remediation.commands.is_empty(),
                "remediation commands empty for {error:?}"
            );
        }
    }

    #[test]
    fn only_non_determinism_is_a_hard_failure() {
        let hard = Error::from(EvaluationError::NonDeterministic {
            dataset: "a".to_string(),
        });
        assert!(hard.is_hard_failure());

        let fatal = Error::from(CapabilityError::Invocation("x".to_string()));
        assert!(!fatal.is_hard_failure());

        let degenerate = Error::from(EvaluationError::EmptyDataset {
            dataset: "a".to_string(),
        });
        assert!(!degenerate.is_hard_failure());
    }

    #[test]
    fn non_determinism_message_names_idempotence() {
        let err = Error::from(EvaluationError::NonDeterministic {
            dataset: "data/words".to_string(),
        });
        let text = err.to_string();
        assert!(text.contains("idempotent"), "{text}");
        assert!(text.contains("data/words"), "{text}");
    }

    #[test]
    fn render_plain_includes_commands_and_alternatives() {
        let r = Remediation::new("Fix it")
            .command("Diagnose", "hashgrade config")
            .alternative("Try something else");
        let output = r.render_plain();
        assert!(output.contains("To fix:"));
        assert!(output.contains("Commands:"));
        assert!(output.contains("Diagnose: hashgrade config"));
        assert!(output.contains("Alternatives:"));
        assert!(output.contains("Try something else"));
    }

    #[test]
    fn format_error_appends_remediation() {
        let err = Error::Config(ConfigError::FileNotFound("missing.toml".to_string()));
        let text = format_error_with_remediation(&err);
        assert!(text.starts_with("Error: Config error: Config file not found: missing.toml"));
        assert!(text.contains("To fix:"));
    }
}
