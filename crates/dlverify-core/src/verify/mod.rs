//! Streaming verification: hash a finished download and compare.
//!
//! One accumulator per advertised algorithm; every chunk is fed to all of
//! them in arrival order. The download is valid if any computed digest equals
//! any checksum harvested from the page. The page author's algorithm does not
//! need to be known.

pub mod source;

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::control::VerifyAborted;
use crate::digest::{self, Accumulator, AlgorithmId};
use crate::engine::DownloadId;
use source::{open_source, ByteSource, SourceOptions};

/// Everything needed to verify one completed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyRequest {
    pub id: DownloadId,
    /// URI of the saved file.
    pub uri: String,
    /// Algorithm names from the page; unsupported names are skipped.
    pub algorithms: BTreeSet<String>,
    /// Lower-case hex checksums from the page.
    pub checksums: BTreeSet<String>,
}

/// Result of comparing computed digests with page checksums.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Invalid,
    /// No comparison could be made (nothing to hash with, or the file could not be read).
    Unverifiable(String),
}

/// Verdict plus the digests it was based on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    pub verdict: Verdict,
    pub digests: BTreeMap<AlgorithmId, String>,
    pub bytes: u64,
}

impl VerifyReport {
    pub fn unverifiable(reason: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Unverifiable(reason.into()),
            digests: BTreeMap::new(),
            bytes: 0,
        }
    }
}

/// Valid if any digest equals any checksum.
pub fn compare(digests: &BTreeMap<AlgorithmId, String>, checksums: &BTreeSet<String>) -> Verdict {
    let matched = digests
        .values()
        .any(|d| checksums.iter().any(|c| c.eq_ignore_ascii_case(d)));
    if matched {
        Verdict::Valid
    } else {
        Verdict::Invalid
    }
}

/// One fresh accumulator per supported algorithm name.
fn accumulators_for(algorithms: &BTreeSet<String>) -> Vec<Accumulator> {
    algorithms
        .iter()
        .filter_map(|name| AlgorithmId::parse(name))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(digest::create)
        .collect()
}

/// Hashes everything `source` yields and compares against `checksums`.
///
/// `abort` is checked before each chunk and once more before finalizing;
/// when set, all accumulator state is dropped and `VerifyAborted` returned.
/// Read errors produce an `Unverifiable` report, never a partial digest.
pub async fn verify_stream<S: ByteSource>(
    source: &mut S,
    algorithms: &BTreeSet<String>,
    checksums: &BTreeSet<String>,
    abort: &AtomicBool,
) -> Result<VerifyReport, VerifyAborted> {
    let mut accumulators = accumulators_for(algorithms);
    if accumulators.is_empty() {
        return Ok(VerifyReport::unverifiable(
            "no supported digest algorithm advertised",
        ));
    }

    let mut bytes: u64 = 0;
    loop {
        if abort.load(Ordering::Relaxed) {
            return Err(VerifyAborted);
        }
        match source.next_chunk().await {
            Ok(Some(chunk)) => {
                bytes += chunk.len() as u64;
                for acc in accumulators.iter_mut() {
                    acc.update(&chunk);
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("reading download failed after {} bytes: {}", bytes, e);
                return Ok(VerifyReport::unverifiable(format!("read failed: {e}")));
            }
        }
    }
    if abort.load(Ordering::Relaxed) {
        return Err(VerifyAborted);
    }

    let digests: BTreeMap<AlgorithmId, String> = accumulators
        .into_iter()
        .map(|acc| (acc.algorithm(), acc.finalize()))
        .collect();
    tracing::debug!("computed {} digests over {} bytes", digests.len(), bytes);
    let verdict = compare(&digests, checksums);
    Ok(VerifyReport {
        verdict,
        digests,
        bytes,
    })
}

/// Opens the file behind `request.uri` and runs [`verify_stream`] over it.
/// Failing to open the file is `Unverifiable`; there is no retry.
pub async fn verify_uri(
    request: &VerifyRequest,
    options: &SourceOptions,
    abort: &AtomicBool,
) -> Result<VerifyReport, VerifyAborted> {
    let mut source = match open_source(&request.uri, options).await {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("cannot open {} for hashing: {}", request.uri, e);
            return Ok(VerifyReport::unverifiable(format!(
                "cannot open {}: {}",
                request.uri, e
            )));
        }
    };
    verify_stream(&mut source, &request.algorithms, &request.checksums, abort).await
}

/// Runs verifications on behalf of the runtime.
pub trait Verifier: Send + Sync + 'static {
    fn verify(
        &self,
        request: VerifyRequest,
        abort: Arc<AtomicBool>,
    ) -> impl Future<Output = Result<VerifyReport, VerifyAborted>> + Send;
}

/// Verifier that streams the real file through [`verify_uri`].
#[derive(Debug, Clone, Default)]
pub struct StreamingVerifier {
    pub options: SourceOptions,
}

impl StreamingVerifier {
    pub fn new(options: SourceOptions) -> Self {
        Self { options }
    }
}

impl Verifier for StreamingVerifier {
    async fn verify(
        &self,
        request: VerifyRequest,
        abort: Arc<AtomicBool>,
    ) -> Result<VerifyReport, VerifyAborted> {
        verify_uri(&request, &self.options, &abort).await
    }
}
