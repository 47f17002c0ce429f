//! hashgrade-core: black-box grading of string hash functions
//!
//! Measures two properties of an externally supplied
//! `bytes -> u16` hash function: that it is deterministic across repeated
//! calls, and that its outputs are spread uniformly over `[0, 2^16 - 1]`.
//!
//! # Architecture
//!
//! ```text
//! DatasetSource → Evaluator ─┬→ determinism::check   (pass/fail gate)
//!                            └→ distribution::score  (chi-squared p-value)
//!                                     ↓
//!                            EvaluationResult → ScoreReporter
//! ```
//!
//! # Modules
//!
//! - `capability`: the `HashFunction` interface and built-in reference hashes
//! - `bucketizer`: equal-width bin specs and histograms
//! - `determinism`: two-pass shuffled idempotence check
//! - `distribution`: Pearson's chi-squared test against the uniform distribution
//! - `evaluation`: per-run orchestration and score aggregation
//! - `dataset`: datasets and glob-based discovery
//! - `report`: autograder `results.json` and console output
//! - `config`: `hashgrade.toml` loading and validation
//! - `logging`: tracing subscriber setup
//!
//! # Safety
//!
//! This crate forbids unsafe code. Loading native code lives in
//! `hashgrade-native`.

#![forbid(unsafe_code)]

pub mod bucketizer;
pub mod capability;
pub mod config;
pub mod dataset;
pub mod determinism;
pub mod distribution;
pub mod error;
pub mod evaluation;
pub mod logging;
pub mod report;

pub use capability::{FnHash, HashFunction, ReferenceHash};
pub use error::{Error, Result};
pub use evaluation::{EvaluationConfig, EvaluationResult, Evaluator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
