//! The hash capability under evaluation.
//!
//! The evaluation engine treats the hash function as a black box mapping a
//! byte string to an unsigned integer in `[0, U]`. How the function is
//! obtained (a shared object, a subprocess, a built-in baseline) is the
//! caller's concern; the engine only depends on [`HashFunction`].

use std::hash::Hasher;

use serde::{Deserialize, Serialize};
use siphasher::sip::SipHasher;

use crate::error::CapabilityError;

/// Maximum value of a 16-bit hash (`2^16 - 1`).
pub const U16_MAX_HASH: u64 = u16::MAX as u64;

/// A hash function exposing a single fixed signature.
///
/// Implementations must be reentrant. They are never called concurrently.
pub trait HashFunction {
    /// Hash `input`, or report why the capability could not produce a value.
    fn hash(&self, input: &[u8]) -> Result<u64, CapabilityError>;
}

impl<H: HashFunction + ?Sized> HashFunction for &H {
    fn hash(&self, input: &[u8]) -> Result<u64, CapabilityError> {
        (**self).hash(input)
    }
}

impl<H: HashFunction + ?Sized> HashFunction for Box<H> {
    fn hash(&self, input: &[u8]) -> Result<u64, CapabilityError> {
        (**self).hash(input)
    }
}

/// Adapter turning an infallible closure into a [`HashFunction`].
#[derive(Debug, Clone, Copy)]
pub struct FnHash<F>(pub F);

impl<F> HashFunction for FnHash<F>
where
    F: Fn(&[u8]) -> u64,
{
    fn hash(&self, input: &[u8]) -> Result<u64, CapabilityError> {
        Ok((self.0)(input))
    }
}

/// Built-in baseline hash functions.
///
/// Useful for calibrating the harness before grading a submission: a sound
/// setup scores `SipHash` near the maximum and `Constant` at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceHash {
    /// SipHash-2-4 with zero keys, folded to 16 bits.
    SipHash,
    /// Input length modulo 2^16.
    Length,
    /// Always zero.
    Constant,
}

impl ReferenceHash {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SipHash => "siphash",
            Self::Length => "length",
            Self::Constant => "constant",
        }
    }
}

impl std::fmt::Display for ReferenceHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReferenceHash {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "siphash" | "sip" => Ok(Self::SipHash),
            "length" | "len" => Ok(Self::Length),
            "constant" | "const" => Ok(Self::Constant),
            _ => Err(format!(
                "unknown reference hash: {s}. Expected one of: siphash, length, constant"
            )),
        }
    }
}

impl HashFunction for ReferenceHash {
    fn hash(&self, input: &[u8]) -> Result<u64, CapabilityError> {
        Ok(match self {
            Self::SipHash => fold_to_u16(sip_digest(input)),
            Self::Length => input.len() as u64 % (U16_MAX_HASH + 1),
            Self::Constant => 0,
        })
    }
}

fn sip_digest(input: &[u8]) -> u64 {
    let mut hasher = SipHasher::new();
    hasher.write(input);
    hasher.finish()
}

/// XOR the four 16-bit lanes of a 64-bit digest together.
fn fold_to_u16(digest: u64) -> u64 {
    (digest ^ (digest >> 16) ^ (digest >> 32) ^ (digest >> 48)) & U16_MAX_HASH
}
