//! Shingling and the simhash majority vote.
//!
//! A token sequence is cut into overlapping windows of `window_size` tokens
//! (shingles). Every distinct shingle is hashed to 64 bits, and the hashes are
//! folded into one fingerprint by a per-bit vote.

use crate::fingerprint::{Algorithm, Fingerprint};
use std::collections::HashSet;
use std::hash::Hash;

/// Distinct contiguous windows of exactly `window_size` tokens.
///
/// Sequences shorter than the window produce no shingles.
pub fn shingles<T: Eq + Hash>(tokens: &[T], window_size: usize) -> HashSet<&[T]> {
    if window_size == 0 || tokens.len() < window_size {
        return HashSet::new();
    }
    tokens.windows(window_size).collect()
}

/// 32-bit polynomial hash (base 31, wrapping) over the UTF-16 code units of a
/// token. Shingle hashes are built from these values, so changing it changes
/// every stored fingerprint.
pub fn token_hash(token: &str) -> i32 {
    token
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

/// Hash of one shingle: MD5 over the big-endian token hashes, first 8 digest
/// bytes read as a big-endian integer.
pub fn shingle_hash<S: AsRef<str>>(shingle: &[S]) -> u64 {
    let mut context = md5::Context::new();
    for token in shingle {
        context.consume(token_hash(token.as_ref()).to_be_bytes());
    }
    let digest = context.compute();
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest.0[..8]);
    u64::from_be_bytes(head)
}

/// Per-bit majority vote over a set of 64-bit hashes.
///
/// Counter `i` tracks bit `i` of the inputs (LSB first) and goes up for a 0 bit
/// and down for a 1 bit. The output is written MSB first: counter 0 lands in
/// bit 63. Ties produce a 0 bit. An empty input gives 0.
pub fn majority_vote<I: IntoIterator<Item = u64>>(hashes: I) -> u64 {
    let mut counters = [0i64; 64];
    for hash in hashes {
        for (bit, counter) in counters.iter_mut().enumerate() {
            if (hash >> bit) & 1 == 0 {
                *counter += 1;
            } else {
                *counter -= 1;
            }
        }
    }
    counters
        .iter()
        .fold(0u64, |acc, &counter| (acc << 1) | u64::from(counter > 0))
}

/// Computes fingerprints over already tokenized, lower-cased text.
#[derive(Debug, Clone)]
pub struct FingerprintBuilder {
    algorithm: Algorithm,
    window_size: usize,
}

impl FingerprintBuilder {
    pub fn new() -> Self {
        Self::for_algorithm(Algorithm::default())
    }

    pub fn for_algorithm(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            window_size: algorithm.window_size(),
        }
    }

    /// Overrides the shingle window. Fingerprints built with a non-default
    /// window are still tagged with the builder's algorithm, so only compare
    /// them with fingerprints built the same way.
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Raw 64-bit simhash of a token sequence.
    pub fn simhash<S: AsRef<str> + Eq + Hash>(&self, tokens: &[S]) -> u64 {
        let hashes: HashSet<u64> = shingles(tokens, self.window_size)
            .into_iter()
            .map(shingle_hash)
            .collect();
        majority_vote(hashes)
    }

    pub fn fingerprint<S: AsRef<str> + Eq + Hash>(&self, tokens: &[S]) -> Fingerprint {
        Fingerprint::new(self.algorithm, self.simhash(tokens))
    }
}

impl Default for FingerprintBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shingles_dedup_windows() {
        let tokens = ["a", "b", "c", "a", "b", "c"];
        let set = shingles(&tokens, 3);
        // abc, bca, cab, abc
        assert_eq!(set.len(), 3);
        assert!(set.contains(&["a", "b", "c"][..]));
    }

    #[test]
    fn test_shingles_exact_window() {
        let tokens = ["one", "two", "three"];
        assert_eq!(shingles(&tokens, 3).len(), 1);
    }

    #[test]
    fn test_shingles_short_sequence() {
        let tokens = ["one", "two"];
        assert!(shingles(&tokens, 3).is_empty());
        assert!(shingles(&tokens, 0).is_empty());
    }

    #[test]
    fn test_token_hash_known_values() {
        assert_eq!(token_hash(""), 0);
        assert_eq!(token_hash("a"), 97);
        assert_eq!(token_hash("ab"), 97 * 31 + 98);
        assert_eq!(token_hash("hello"), 99162322);
    }

    #[test]
    fn test_token_hash_wraps() {
        // long enough to overflow i32 several times
        assert_eq!(token_hash("polygenelubricants"), i32::MIN);
    }

    #[test]
    fn test_shingle_hash_is_md5_prefix() {
        let digest = md5::compute(token_hash("x").to_be_bytes());
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest.0[..8]);
        assert_eq!(shingle_hash(&["x"]), u64::from_be_bytes(head));
    }

    #[test]
    fn test_majority_vote_single_hash_is_reversed_complement() {
        // a single all-zero hash votes +1 everywhere
        assert_eq!(majority_vote([0u64]), u64::MAX);
        // a single all-one hash votes -1 everywhere
        assert_eq!(majority_vote([u64::MAX]), 0);
        // bit 0 set in the input clears output bit 63 only
        assert_eq!(majority_vote([1u64]), u64::MAX >> 1);
    }

    #[test]
    fn test_majority_vote_ties_are_zero() {
        assert_eq!(majority_vote([0u64, u64::MAX]), 0);
        assert_eq!(majority_vote(Vec::<u64>::new()), 0);
    }

    #[test]
    fn test_builder_short_input_is_zero() {
        let builder = FingerprintBuilder::new();
        let fp = builder.fingerprint(&["only", "two"]);
        assert!(fp.is_zero());
    }

    #[test]
    fn test_builder_is_deterministic() {
        let builder = FingerprintBuilder::new();
        let tokens: Vec<String> = "the quick brown fox jumps over the lazy dog"
            .split(' ')
            .map(String::from)
            .collect();
        assert_eq!(builder.simhash(&tokens), builder.simhash(&tokens));
    }

    #[test]
    fn test_builder_single_shingle_matches_vote() {
        let builder = FingerprintBuilder::new();
        let tokens = ["a", "b", "c"];
        let expected = majority_vote([shingle_hash(&tokens)]);
        assert_eq!(builder.simhash(&tokens), expected);
    }
}
