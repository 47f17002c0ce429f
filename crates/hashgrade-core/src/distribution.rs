//! Uniformity scoring via Pearson's chi-squared goodness-of-fit test.
//!
//! # Algorithm
//!
//! 1. Hash every line of the dataset (order is irrelevant for a histogram)
//! 2. Bucket the hashes with a [`BinSpec`]
//! 3. Compare the observed counts against an equal expected count per bin
//! 4. Report the p-value: the probability that a truly uniform hash would
//!    produce a histogram at least this skewed
//!
//! The expected count in each bin is the mean observed count, and the test
//! has `n_bins - 1` degrees of freedom (256 for the default 257 bins). Every
//! bin is expected to receive the same share even when the final bin is
//! wider than the rest (see the truncation note in [`crate::bucketizer`]).

use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::bucketizer::BinSpec;
use crate::capability::HashFunction;
use crate::error::{EvaluationError, Result};

/// Outcome of a chi-squared goodness-of-fit test against the uniform distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoodnessOfFit {
    /// Pearson's chi-squared statistic.
    pub chi_squared: f64,
    /// Degrees of freedom (`n_bins - 1`).
    pub degrees_of_freedom: usize,
    /// Survival function of the statistic, in `[0, 1]`.
    pub p_value: f64,
    /// Number of samples the histogram was built from.
    pub samples: u64,
}

/// Run Pearson's test on observed bin counts with equal expected frequencies.
///
/// Returns `None` when there is nothing to test (no bins or no samples);
/// a test over an all-zero histogram is undefined.
#[must_use]
pub fn chi_squared_uniform(observed: &[u64]) -> Option<GoodnessOfFit> {
    let samples: u64 = observed.iter().sum();
    if observed.is_empty() || samples == 0 {
        return None;
    }

    let expected = samples as f64 / observed.len() as f64;
    let chi_squared: f64 = observed
        .iter()
        .map(|&count| {
            let diff = count as f64 - expected;
            diff * diff / expected
        })
        .sum();

    let degrees_of_freedom = observed.len() - 1;
    let p_value = chi_squared_survival(chi_squared, degrees_of_freedom);

    Some(GoodnessOfFit {
        chi_squared,
        degrees_of_freedom,
        p_value,
        samples,
    })
}

/// Survival function (1 - CDF) of the chi-squared distribution.
///
/// A single bin leaves zero degrees of freedom; the fit is then exact by
/// construction and the p-value is 1.
fn chi_squared_survival(x: f64, degrees_of_freedom: usize) -> f64 {
    if degrees_of_freedom == 0 || x <= 0.0 {
        return 1.0;
    }
    ChiSquared::new(degrees_of_freedom as f64)
        .map_or(1.0, |dist| dist.sf(x))
        .clamp(0.0, 1.0)
}

/// Hash every line of `dataset` and test the resulting histogram for uniformity.
///
/// `dataset` names the data in errors. Empty input is rejected with
/// [`EvaluationError::EmptyDataset`]; the orchestrator skips such datasets
/// before they get here.
pub fn score<H>(hash: &H, dataset: &str, lines: &[String], spec: &BinSpec) -> Result<GoodnessOfFit>
where
    H: HashFunction + ?Sized,
{
    let empty = || EvaluationError::EmptyDataset {
        dataset: dataset.to_string(),
    };
    if lines.is_empty() {
        return Err(empty().into());
    }

    let mut histogram = spec.histogram();
    for line in lines {
        let value = hash.hash(line.as_bytes())?;
        histogram.record(value)?;
    }

    chi_squared_uniform(histogram.counts()).ok_or_else(|| empty().into())
}
