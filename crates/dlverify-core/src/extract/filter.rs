//! Heuristic filter that keeps only checksum candidates that look like digests.

use std::collections::BTreeSet;

/// Hex lengths of every supported digest (md5 .. sha512 / sha3-512).
pub const CHECKSUM_LENGTHS: [usize; 6] = [32, 40, 56, 64, 96, 128];

/// Minimum number of distinct characters; rejects repeated digits and version-like strings.
const MIN_DIVERSITY: usize = 11;

/// True if `value` mixes hex letters with digits and is diverse enough to be a digest.
pub fn is_hash_like(value: &str) -> bool {
    let has_letter = value
        .chars()
        .any(|c| matches!(c.to_ascii_lowercase(), 'a'..='f'));
    let has_digit = value.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        return false;
    }
    let distinct: BTreeSet<char> = value.chars().collect();
    distinct.len() >= MIN_DIVERSITY
}

/// Keeps candidates whose length matches a supported digest and that pass [`is_hash_like`].
pub fn filter_checksums<'a, I>(candidates: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a String>,
{
    candidates
        .into_iter()
        .filter(|value| CHECKSUM_LENGTHS.contains(&value.len()) && is_hash_like(value))
        .cloned()
        .collect()
}
