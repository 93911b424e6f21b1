//! Supported digest algorithms and the accumulator registry.
//!
//! Algorithm names harvested from pages are free-form ("SHA-256", "sha3-512",
//! "MD5"); [`AlgorithmId::parse`] folds them onto the closed set below and
//! [`create`] hands out a fresh incremental accumulator for each one.

mod accumulator;

pub use accumulator::{create, create_by_name, Accumulator};

use std::fmt;
use std::str::FromStr;

/// Digest algorithms a page may advertise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AlgorithmId {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Sha3_224,
    Sha3_256,
    Sha3_384,
    Sha3_512,
}

impl AlgorithmId {
    pub const ALL: [AlgorithmId; 10] = [
        AlgorithmId::Md5,
        AlgorithmId::Sha1,
        AlgorithmId::Sha224,
        AlgorithmId::Sha256,
        AlgorithmId::Sha384,
        AlgorithmId::Sha512,
        AlgorithmId::Sha3_224,
        AlgorithmId::Sha3_256,
        AlgorithmId::Sha3_384,
        AlgorithmId::Sha3_512,
    ];

    /// Normalized name, as emitted by the page extractor (no hyphens).
    pub fn as_str(self) -> &'static str {
        match self {
            AlgorithmId::Md5 => "md5",
            AlgorithmId::Sha1 => "sha1",
            AlgorithmId::Sha224 => "sha224",
            AlgorithmId::Sha256 => "sha256",
            AlgorithmId::Sha384 => "sha384",
            AlgorithmId::Sha512 => "sha512",
            AlgorithmId::Sha3_224 => "sha3224",
            AlgorithmId::Sha3_256 => "sha3256",
            AlgorithmId::Sha3_384 => "sha3384",
            AlgorithmId::Sha3_512 => "sha3512",
        }
    }

    /// Human-readable name used in CLI output and logs.
    pub fn display_name(self) -> &'static str {
        match self {
            AlgorithmId::Md5 => "MD5",
            AlgorithmId::Sha1 => "SHA-1",
            AlgorithmId::Sha224 => "SHA-224",
            AlgorithmId::Sha256 => "SHA-256",
            AlgorithmId::Sha384 => "SHA-384",
            AlgorithmId::Sha512 => "SHA-512",
            AlgorithmId::Sha3_224 => "SHA3-224",
            AlgorithmId::Sha3_256 => "SHA3-256",
            AlgorithmId::Sha3_384 => "SHA3-384",
            AlgorithmId::Sha3_512 => "SHA3-512",
        }
    }

    /// Length of the lower-case hex digest this algorithm produces.
    pub fn hex_len(self) -> usize {
        match self {
            AlgorithmId::Md5 => 32,
            AlgorithmId::Sha1 => 40,
            AlgorithmId::Sha224 | AlgorithmId::Sha3_224 => 56,
            AlgorithmId::Sha256 | AlgorithmId::Sha3_256 => 64,
            AlgorithmId::Sha384 | AlgorithmId::Sha3_384 => 96,
            AlgorithmId::Sha512 | AlgorithmId::Sha3_512 => 128,
        }
    }

    /// Parses a harvested or user-supplied algorithm name.
    ///
    /// Case-insensitive; hyphens are ignored so "SHA-256", "sha256",
    /// "sha3-256" and "sha3256" are all accepted. Returns `None` for anything
    /// outside the supported set.
    pub fn parse(name: &str) -> Option<Self> {
        let normalized: String = name
            .trim()
            .chars()
            .filter(|c| *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        AlgorithmId::ALL
            .into_iter()
            .find(|id| id.as_str() == normalized)
    }
}

impl fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for names that are not one of the supported algorithms.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported digest algorithm: {0}")]
pub struct UnknownAlgorithm(pub String);

impl FromStr for AlgorithmId {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AlgorithmId::parse(s).ok_or_else(|| UnknownAlgorithm(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_hyphenated_and_mixed_case() {
        assert_eq!(AlgorithmId::parse("SHA-256"), Some(AlgorithmId::Sha256));
        assert_eq!(AlgorithmId::parse("sha256"), Some(AlgorithmId::Sha256));
        assert_eq!(AlgorithmId::parse("Sha3-512"), Some(AlgorithmId::Sha3_512));
        assert_eq!(AlgorithmId::parse("sha3224"), Some(AlgorithmId::Sha3_224));
        assert_eq!(AlgorithmId::parse("MD-5"), Some(AlgorithmId::Md5));
        assert_eq!(AlgorithmId::parse(" sha1 "), Some(AlgorithmId::Sha1));
    }

    #[test]
    fn parse_rejects_unknown_names() {
        assert_eq!(AlgorithmId::parse("blake3"), None);
        assert_eq!(AlgorithmId::parse("sha"), None);
        assert_eq!(AlgorithmId::parse(""), None);
        assert!("crc32".parse::<AlgorithmId>().is_err());
    }

    #[test]
    fn as_str_round_trips_through_parse() {
        for id in AlgorithmId::ALL {
            assert_eq!(AlgorithmId::parse(id.as_str()), Some(id));
            assert_eq!(AlgorithmId::parse(id.display_name()), Some(id));
        }
    }

    #[test]
    fn hex_len_covers_every_checksum_size() {
        let mut lens: Vec<usize> = AlgorithmId::ALL.iter().map(|a| a.hex_len()).collect();
        lens.sort_unstable();
        lens.dedup();
        assert_eq!(lens, vec![32, 40, 56, 64, 96, 128]);
    }
}
