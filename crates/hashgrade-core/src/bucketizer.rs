//! Equal-width binning of the hash output range.
//!
//! A [`BinSpec`] splits `[0, U]` into `n_bins` contiguous intervals. Bin `i`
//! covers the half-open interval `[boundaries[i], boundaries[i + 1])`, except
//! the final bin which is closed on both ends so that `U` itself is counted.
//!
//! # Truncation
//!
//! The bin width is `floor(U / n_bins)` (never less than 1). When `U` is not
//! an exact multiple of `n_bins` the first `n_bins - 1` bins keep that width
//! and the final bin absorbs the remainder: it spans
//! `width + (U - n_bins * width)` values. With the default `U = 65535` and
//! `n_bins = 257` the division is exact: every bin is 255 values wide, and
//! the closed final bin also holds `U` itself (256 values).
//!
//! When `n_bins > U` there are not enough distinct values to go around, so
//! the width is clamped to 1 and the boundaries run past `U`; the bins above
//! `U` can never be filled.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::error::EvaluationError;

/// Ordered, strictly increasing bin boundaries spanning `[0, U]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinSpec {
    upper_bound: u64,
    bin_width: u64,
    boundaries: Vec<u64>,
}

impl BinSpec {
    /// Build `n_bins` equal-width bins over `[0, upper_bound]`.
    #[must_use]
    pub fn uniform(upper_bound: u64, n_bins: NonZeroUsize) -> Self {
        let n = n_bins.get() as u64;
        let bin_width = (upper_bound / n).max(1);

        let mut boundaries: Vec<u64> = (0..n).map(|i| i * bin_width).collect();
        boundaries.push(upper_bound.max(n * bin_width));

        tracing::debug!(
            upper_bound,
            n_bins = n,
            bin_width,
            last_boundary = boundaries[boundaries.len() - 1],
            "built bin spec"
        );

        Self {
            upper_bound,
            bin_width,
            boundaries,
        }
    }

    /// Number of bins (`boundaries().len() - 1`).
    #[must_use]
    pub fn n_bins(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Width of every bin except possibly the last.
    #[must_use]
    pub fn bin_width(&self) -> u64 {
        self.bin_width
    }

    /// Largest hash value the spec accepts.
    #[must_use]
    pub fn upper_bound(&self) -> u64 {
        self.upper_bound
    }

    /// The `n_bins + 1` boundary values.
    #[must_use]
    pub fn boundaries(&self) -> &[u64] {
        &self.boundaries
    }

    /// Width of the final (closed) bin, counted in distinct values.
    #[must_use]
    pub fn last_bin_width(&self) -> u64 {
        let n = self.boundaries.len();
        self.boundaries[n - 1] - self.boundaries[n - 2] + 1
    }

    /// True when `U` divides evenly into `n_bins` bins of `bin_width`.
    #[must_use]
    pub fn is_exact(&self) -> bool {
        self.boundaries[self.n_bins()] == self.n_bins() as u64 * self.bin_width
    }

    /// Index of the bin containing `value`, or `None` above the last boundary.
    #[must_use]
    pub fn bin_of(&self, value: u64) -> Option<usize> {
        let last = self.boundaries[self.n_bins()];
        if value > last {
            return None;
        }
        let index = (value / self.bin_width).min(self.n_bins() as u64 - 1);
        Some(index as usize)
    }

    /// Empty histogram shaped by this spec.
    #[must_use]
    pub fn histogram(&self) -> Histogram<'_> {
        Histogram {
            spec: self,
            counts: vec![0; self.n_bins()],
            total: 0,
        }
    }
}

/// Observed counts of hash values per bin.
#[derive(Debug, Clone)]
pub struct Histogram<'a> {
    spec: &'a BinSpec,
    counts: Vec<u64>,
    total: u64,
}

impl Histogram<'_> {
    /// Count one hash value.
    pub fn record(&mut self, value: u64) -> Result<(), EvaluationError> {
        let out_of_range = EvaluationError::HashOutOfRange {
            value,
            upper_bound: self.spec.upper_bound,
        };
        if value > self.spec.upper_bound {
            return Err(out_of_range);
        }
        let bin = self.spec.bin_of(value).ok_or(out_of_range)?;
        self.counts[bin] += 1;
        self.total += 1;
        Ok(())
    }

    /// Count every value in `values`, stopping at the first out-of-range one.
    pub fn record_all<I>(&mut self, values: I) -> Result<(), EvaluationError>
    where
        I: IntoIterator<Item = u64>,
    {
        values.into_iter().try_for_each(|v| self.record(v))
    }

    /// Observed frequency per bin, in bin order.
    #[must_use]
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Total number of recorded values.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Spec the histogram was built from.
    #[must_use]
    pub fn spec(&self) -> &BinSpec {
        self.spec
    }
}
