//! Idempotence check for the hash capability.
//!
//! Every line is hashed twice, each pass in a fresh random order, and the two
//! results are compared per line. Shuffling between passes catches functions
//! whose output depends on call order or leftover state from earlier calls.
//!
//! # Duplicate lines
//!
//! Results of the first pass are keyed by the line's text. When a dataset
//! holds the same line more than once, only the hash from the last occurrence
//! visited in the first pass is kept, so the check proves determinism only
//! for datasets without duplicate lines. Comparing by position instead would
//! change what is being verified and is deliberately not done here.

use std::collections::HashMap;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::capability::HashFunction;
use crate::error::CapabilityError;

/// Hash `lines` in two independent random orders and compare the results.
///
/// Returns `Ok(false)` on the first line whose second hash differs from the
/// first, `Ok(true)` if every line matches. Errors from the capability are
/// propagated unchanged. The caller's slice is never reordered.
pub fn check<H, R>(hash: &H, lines: &[String], rng: &mut R) -> Result<bool, CapabilityError>
where
    H: HashFunction + ?Sized,
    R: Rng + ?Sized,
{
    let mut working: Vec<&str> = lines.iter().map(String::as_str).collect();

    working.shuffle(rng);
    let mut first_pass: HashMap<&str, u64> = HashMap::with_capacity(working.len());
    for line in &working {
        let value = hash.hash(line.as_bytes())?;
        first_pass.insert(*line, value);
    }

    working.shuffle(rng);
    for line in &working {
        let value = hash.hash(line.as_bytes())?;
        if first_pass.get(line) != Some(&value) {
            tracing::debug!(
                line_len = line.len(),
                second = value,
                "hash mismatch between passes"
            );
            return Ok(false);
        }
    }

    Ok(true)
}
