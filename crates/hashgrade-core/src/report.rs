//! Hand-off of the final grade.
//!
//! A run reports exactly once: either the [`EvaluationResult`] or the error
//! that ended it. [`GradescopeReporter`] writes an autograder
//! `results.json`; [`ConsoleReporter`] prints a summary for humans or
//! scripts.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, ReportError, Result};
use crate::evaluation::EvaluationResult;

/// Receives the outcome of an evaluation run.
pub trait ScoreReporter {
    fn report_success(&mut self, result: &EvaluationResult) -> Result<()>;
    fn report_failure(&mut self, error: &Error) -> Result<()>;
}

/// One row of the autograder leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub value: u64,
}

/// A single graded test in `results.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradedTest {
    pub name: String,
    pub score: f64,
    pub max_score: f64,
    pub status: String,
    pub output: String,
}

/// Top-level autograder `results.json` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradescopeResults {
    pub score: f64,
    pub output: String,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub tests: Vec<GradedTest>,
}

/// Writes `results.json` for the autograder.
#[derive(Debug, Clone)]
pub struct GradescopeReporter {
    path: PathBuf,
    test_name: String,
    leaderboard_name: String,
    max_score: Option<f64>,
}

impl GradescopeReporter {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            test_name: "Evaluate hash function".to_string(),
            leaderboard_name: "points".to_string(),
            max_score: None,
        }
    }

    #[must_use]
    pub fn test_name(mut self, name: impl Into<String>) -> Self {
        self.test_name = name.into();
        self
    }

    #[must_use]
    pub fn leaderboard_name(mut self, name: impl Into<String>) -> Self {
        self.leaderboard_name = name.into();
        self
    }

    /// Fixed maximum score; defaults to the result's natural bound.
    #[must_use]
    pub fn max_score(mut self, max_score: Option<f64>) -> Self {
        self.max_score = max_score;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Document for a successful run.
    #[must_use]
    pub fn success_document(&self, result: &EvaluationResult) -> GradescopeResults {
        let output = summarize(result);
        GradescopeResults {
            score: result.score,
            output: output.clone(),
            leaderboard: vec![LeaderboardEntry {
                name: self.leaderboard_name.clone(),
                value: result.leaderboard_value,
            }],
            tests: vec![GradedTest {
                name: self.test_name.clone(),
                score: result.score,
                max_score: self.max_score.unwrap_or(result.max_score),
                status: "passed".to_string(),
                output,
            }],
        }
    }

    /// Document for a failed run: zero score, explicit failure message.
    #[must_use]
    pub fn failure_document(&self, error: &Error) -> GradescopeResults {
        let output = error.to_string();
        GradescopeResults {
            score: 0.0,
            output: output.clone(),
            leaderboard: vec![LeaderboardEntry {
                name: self.leaderboard_name.clone(),
                value: 0,
            }],
            tests: vec![GradedTest {
                name: self.test_name.clone(),
                score: 0.0,
                max_score: self.max_score.unwrap_or(0.0),
                status: "failed".to_string(),
                output,
            }],
        }
    }

    fn write(&self, document: &GradescopeResults) -> Result<()> {
        let write_failed = |reason: String| ReportError::WriteFailed {
            path: self.path.display().to_string(),
            reason,
        };
        let json = serde_json::to_string_pretty(document)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| write_failed(e.to_string()))?;
            }
        }
        std::fs::write(&self.path, json).map_err(|e| write_failed(e.to_string()))?;
        tracing::info!(path = %self.path.display(), score = document.score, "wrote results");
        Ok(())
    }
}

impl ScoreReporter for GradescopeReporter {
    fn report_success(&mut self, result: &EvaluationResult) -> Result<()> {
        let document = self.success_document(result);
        self.write(&document)
    }

    fn report_failure(&mut self, error: &Error) -> Result<()> {
        let document = self.failure_document(error);
        self.write(&document)
    }
}

/// Console output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Plain,
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => f.write_str("plain"),
            Self::Json => f.write_str("json"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain" | "text" => Ok(Self::Plain),
            "json" => Ok(Self::Json),
            _ => Err(format!("unknown output format: {s}. Expected plain or json")),
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum ConsolePayload<'a> {
    Scored {
        #[serde(flatten)]
        result: &'a EvaluationResult,
    },
    Failed {
        error: String,
        hard_failure: bool,
    },
}

/// Prints the outcome to a writer (stdout in the CLI).
#[derive(Debug)]
pub struct ConsoleReporter<W> {
    writer: W,
    format: OutputFormat,
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self { writer, format }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ScoreReporter for ConsoleReporter<W> {
    fn report_success(&mut self, result: &EvaluationResult) -> Result<()> {
        match self.format {
            OutputFormat::Plain => {
                write!(self.writer, "{}", summarize(result))?;
            }
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.writer, &ConsolePayload::Scored { result })?;
                writeln!(self.writer)?;
            }
        }
        Ok(())
    }

    fn report_failure(&mut self, error: &Error) -> Result<()> {
        match self.format {
            OutputFormat::Plain => {
                writeln!(self.writer, "FAILED: {error}")?;
            }
            OutputFormat::Json => {
                let payload = ConsolePayload::Failed {
                    error: error.to_string(),
                    hard_failure: error.is_hard_failure(),
                };
                serde_json::to_writer(&mut self.writer, &payload)?;
                writeln!(self.writer)?;
            }
        }
        Ok(())
    }
}

/// Human-readable per-dataset breakdown.
#[must_use]
pub fn summarize(result: &EvaluationResult) -> String {
    use std::fmt::Write as _;

    let mut out = String::new();
    for d in &result.datasets {
        let _ = writeln!(
            out,
            "{}: {} lines, chi2={:.2} (df={}), p={:.4} -> {:.2}",
            d.name, d.lines, d.chi_squared, d.degrees_of_freedom, d.p_value, d.partial_score
        );
    }
    for name in &result.skipped {
        let _ = writeln!(out, "{name}: skipped (empty)");
    }
    let _ = writeln!(out, "score: {:.2} / {:.2}", result.score, result.max_score);
    let _ = writeln!(out, "leaderboard: {}", result.leaderboard_value);
    out
}
