//! Evaluation orchestrator.
//!
//! Runs the idempotence gate and the uniformity scorer over each dataset and
//! sums the per-dataset partial scores into a final grade:
//!
//! ```text
//! for each dataset:
//!     empty?          -> skipped (a chi-squared test on zero samples is undefined)
//!     not idempotent? -> the whole run fails, no partial credit
//!     otherwise       -> score += p_value * per_dataset_max
//! ```
//!
//! All derived state (bin spec, shuffle RNG) is rebuilt on every run.

use std::num::NonZeroUsize;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::bucketizer::BinSpec;
use crate::capability::{HashFunction, U16_MAX_HASH};
use crate::dataset::{Dataset, DatasetSource};
use crate::determinism;
use crate::distribution;
use crate::error::{EvaluationError, Result};
use crate::logging;

/// Per-run evaluation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Maximum representable hash value `U`.
    pub upper_bound: u64,
    /// Number of histogram bins.
    pub n_bins: NonZeroUsize,
    /// Points awarded for a dataset with a p-value of 1.
    pub per_dataset_max: f64,
    /// Seed for the shuffles of the idempotence check; `None` uses OS entropy.
    pub seed: Option<u64>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            upper_bound: U16_MAX_HASH,
            n_bins: NonZeroUsize::new(257).unwrap_or(NonZeroUsize::MIN),
            per_dataset_max: 50_000.0,
            seed: None,
        }
    }
}

/// Score breakdown for one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetScore {
    pub name: String,
    pub lines: usize,
    pub chi_squared: f64,
    pub degrees_of_freedom: usize,
    pub p_value: f64,
    pub partial_score: f64,
}

/// Outcome of a successful evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Sum of the partial scores.
    pub score: f64,
    /// `score` truncated to an integer for the leaderboard.
    pub leaderboard_value: u64,
    /// Upper bound on `score`: `per_dataset_max` times the datasets scored.
    pub max_score: f64,
    /// Scored datasets, in evaluation order.
    pub datasets: Vec<DatasetScore>,
    /// Names of empty datasets that were not scored.
    pub skipped: Vec<String>,
}

impl EvaluationResult {
    fn from_scores(datasets: Vec<DatasetScore>, skipped: Vec<String>, per_dataset_max: f64) -> Self {
        // `Sum` for floats starts at -0.0; an empty run must report +0.0.
        let score = datasets.iter().fold(0.0, |acc, d| acc + d.partial_score);
        Self {
            score,
            leaderboard_value: leaderboard_value(score),
            max_score: per_dataset_max * datasets.len() as f64,
            datasets,
            skipped,
        }
    }
}

/// Truncate a score to its integer leaderboard value.
#[must_use]
pub fn leaderboard_value(score: f64) -> u64 {
    if score.is_finite() && score > 0.0 {
        score.trunc() as u64
    } else {
        0
    }
}

/// Grades a hash function over a collection of datasets.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    config: EvaluationConfig,
}

impl Evaluator {
    #[must_use]
    pub fn new(config: EvaluationConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Bin spec for the configured range and bin count.
    #[must_use]
    pub fn bin_spec(&self) -> BinSpec {
        BinSpec::uniform(self.config.upper_bound, self.config.n_bins)
    }

    /// Load datasets from `source` and evaluate them.
    pub fn run_source<H, S>(&self, hash: &H, source: &S) -> Result<EvaluationResult>
    where
        H: HashFunction + ?Sized,
        S: DatasetSource + ?Sized,
    {
        let datasets = source.load()?;
        self.run(hash, &datasets)
    }

    /// Evaluate `hash` over `datasets`.
    ///
    /// Fails with [`EvaluationError::NonDeterministic`] as soon as one dataset
    /// fails the idempotence check; capability errors abort the run as well.
    pub fn run<H>(&self, hash: &H, datasets: &[Dataset]) -> Result<EvaluationResult>
    where
        H: HashFunction + ?Sized,
    {
        let spec = self.bin_spec();
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        if datasets.is_empty() {
            tracing::warn!("no datasets to evaluate");
        }

        let mut scores = Vec::with_capacity(datasets.len());
        let mut skipped = Vec::new();

        for dataset in datasets {
            let span = logging::dataset_span(dataset.name(), dataset.len());
            let _guard = span.enter();

            if dataset.is_empty() {
                tracing::warn!("skipping empty dataset");
                skipped.push(dataset.name().to_string());
                continue;
            }

            if !determinism::check(hash, dataset.lines(), &mut rng)? {
                tracing::error!("hash function is not idempotent");
                return Err(EvaluationError::NonDeterministic {
                    dataset: dataset.name().to_string(),
                }
                .into());
            }

            let fit = distribution::score(hash, dataset.name(), dataset.lines(), &spec)?;
            let partial_score = fit.p_value * self.config.per_dataset_max;
            tracing::info!(
                chi_squared = fit.chi_squared,
                p_value = fit.p_value,
                partial_score,
                "dataset scored"
            );

            scores.push(DatasetScore {
                name: dataset.name().to_string(),
                lines: dataset.len(),
                chi_squared: fit.chi_squared,
                degrees_of_freedom: fit.degrees_of_freedom,
                p_value: fit.p_value,
                partial_score,
            });
        }

        let result = EvaluationResult::from_scores(scores, skipped, self.config.per_dataset_max);
        tracing::info!(
            score = result.score,
            leaderboard_value = result.leaderboard_value,
            datasets = result.datasets.len(),
            skipped = result.skipped.len(),
            "evaluation complete"
        );
        Ok(result)
    }
}
