//! Datasets of input lines and where they come from.
//!
//! A dataset is the list of lines of one text file. `\n`, `\r\n` and a lone
//! `\r` all end a line, and each is normalized to `\n`: lines keep that
//! terminator by default (a final line without one is kept as-is). Set
//! `strip_line_endings` to hash the bare text instead.

use std::path::{Path, PathBuf};

use crate::error::{DatasetError, Result};

/// An immutable, named sequence of input lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    name: String,
    lines: Vec<String>,
}

impl Dataset {
    #[must_use]
    pub fn new(name: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            name: name.into(),
            lines,
        }
    }

    /// Split `text` into lines the way the file reader does.
    #[must_use]
    pub fn from_text(name: impl Into<String>, text: &str, strip_line_endings: bool) -> Self {
        let mut lines = Vec::new();
        let mut rest = text;
        while let Some(end) = rest.find(['\n', '\r']) {
            let body = &rest[..end];
            lines.push(if strip_line_endings {
                body.to_string()
            } else {
                format!("{body}\n")
            });
            let terminator = if rest[end..].starts_with("\r\n") { 2 } else { 1 };
            rest = &rest[end + terminator..];
        }
        if !rest.is_empty() {
            lines.push(rest.to_string());
        }
        Self::new(name, lines)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Supplies the datasets for one evaluation run.
pub trait DatasetSource {
    fn load(&self) -> Result<Vec<Dataset>>;
}

/// Every regular file matching a glob pattern is one dataset.
#[derive(Debug, Clone)]
pub struct GlobSource {
    pattern: String,
    strip_line_endings: bool,
}

impl GlobSource {
    #[must_use]
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            strip_line_endings: false,
        }
    }

    #[must_use]
    pub fn strip_line_endings(mut self, strip: bool) -> Self {
        self.strip_line_endings = strip;
        self
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    fn read(&self, path: &Path) -> Result<Dataset> {
        let text = std::fs::read_to_string(path).map_err(|e| DatasetError::ReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Dataset::from_text(
            path.display().to_string(),
            &text,
            self.strip_line_endings,
        ))
    }
}

impl DatasetSource for GlobSource {
    fn load(&self) -> Result<Vec<Dataset>> {
        let entries = glob::glob(&self.pattern).map_err(|e| DatasetError::InvalidPattern {
            pattern: self.pattern.clone(),
            reason: e.msg.to_string(),
        })?;

        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| DatasetError::ReadFailed {
                path: e.path().display().to_string(),
                reason: e.error().to_string(),
            })?;
            if path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        tracing::debug!(pattern = %self.pattern, files = paths.len(), "discovered datasets");
        paths.iter().map(|p| self.read(p)).collect()
    }
}
