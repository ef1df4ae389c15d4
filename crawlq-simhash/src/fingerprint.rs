use crate::error::{Result, SimhashError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fingerprinting algorithms. Two fingerprints can only be compared when they
/// were produced by the same algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    /// Title + body word tokens, 3-token shingles, MD5 shingle hashes, 64 bits.
    #[default]
    #[serde(rename = "PLAIN_TEXT_SHINGLE3_V1")]
    PlainTextShingle3V1,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::PlainTextShingle3V1 => "PLAIN_TEXT_SHINGLE3_V1",
        }
    }

    /// Fingerprint size in bits.
    pub fn width(&self) -> u32 {
        match self {
            Algorithm::PlainTextShingle3V1 => 64,
        }
    }

    /// Number of tokens per shingle.
    pub fn window_size(&self) -> usize {
        match self {
            Algorithm::PlainTextShingle3V1 => 3,
        }
    }
}

/// A simhash fingerprint: a fixed-width bit vector tagged with the algorithm
/// that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    algorithm: Algorithm,
    bits: u64,
}

impl Fingerprint {
    pub fn new(algorithm: Algorithm, bits: u64) -> Self {
        Self { algorithm, bits }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn bits(&self) -> u64 {
        self.bits
    }

    pub fn width(&self) -> u32 {
        self.algorithm.width()
    }

    pub fn is_zero(&self) -> bool {
        self.bits == 0
    }

    /// Number of differing bits between two fingerprints.
    ///
    /// Comparing fingerprints from different algorithms or of different widths
    /// is a usage error and is reported as such rather than as a large distance.
    pub fn distance(&self, other: &Fingerprint) -> Result<u32> {
        if self.algorithm != other.algorithm {
            return Err(SimhashError::IncompatibleAlgorithms(
                self.algorithm.as_str(),
                other.algorithm.as_str(),
            ));
        }
        if self.width() != other.width() {
            return Err(SimhashError::IncompatibleWidths(self.width(), other.width()));
        }
        Ok((self.bits ^ other.bits).count_ones())
    }
}

/// Fingerprints are written to record files as signed 64-bit decimals.
impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits as i64)
    }
}

impl FromStr for Fingerprint {
    type Err = SimhashError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let value = trimmed
            .parse::<i64>()
            .map(|v| v as u64)
            .or_else(|_| trimmed.parse::<u64>())
            .map_err(|e| SimhashError::InvalidFingerprint(format!("{}: {}", trimmed, e)))?;
        Ok(Fingerprint::new(Algorithm::default(), value))
    }
}
