//! Page scraping: checksum candidates, algorithm names and download links.
//!
//! Two independent scans run over the raw page markup. One collects hex runs
//! that could be digests, the other collects algorithm names such as
//! "SHA-256" or "md5". Both are normalized to lower case with the first hyphen
//! removed, so "SHA-256" and "sha256" land on the same entry.

mod filter;
mod links;

pub use filter::{filter_checksums, is_hash_like, CHECKSUM_LENGTHS};
pub use links::{extract_links, is_file_extension_dangerous, LinkFilter, DANGEROUS_EXTENSIONS};

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Hex runs of digest-like length, all lower or all upper case.
static CHECKSUM_VALUE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-f0-9]{32,128}|[A-F0-9]{32,128}").expect("checksum regex is valid")
});

/// sha1/224/256/384/512 and md5 with an optional hyphen, or sha3-224/256/384/512.
static CHECKSUM_ALG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)sha-?(?:1|224|256|384|512)|md-?5|sha3-(?:224|256|384|512)")
        .expect("algorithm regex is valid")
});

/// Raw candidate sets harvested from one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidates {
    /// Checksum-shaped tokens; not yet filtered by [`filter_checksums`].
    pub checksums: BTreeSet<String>,
    /// Normalized algorithm names, e.g. "sha256", "sha3512", "md5".
    pub algorithms: BTreeSet<String>,
}

/// Runs both scans over `text` and returns the deduplicated candidate sets.
pub fn extract_candidates(text: &str) -> Candidates {
    let checksums = extract_pattern(&CHECKSUM_VALUE_PATTERN, text);
    let algorithms = extract_pattern(&CHECKSUM_ALG_PATTERN, text);
    tracing::debug!(
        "{} checksum candidates, {} algorithm names",
        checksums.len(),
        algorithms.len()
    );
    Candidates {
        checksums,
        algorithms,
    }
}

fn extract_pattern(pattern: &Regex, text: &str) -> BTreeSet<String> {
    pattern
        .find_iter(text)
        .map(|m| normalize_token(m.as_str()))
        .collect()
}

fn normalize_token(token: &str) -> String {
    token.to_lowercase().replacen('-', "", 1)
}
