//! `dlverify digest` – compute digests of a file.

use anyhow::{Context, Result};
use dlverify_core::config::VerifyConfig;
use dlverify_core::digest::{self, AlgorithmId};
use dlverify_core::verify::source::{ByteSource, FileSource};
use std::collections::BTreeMap;
use std::path::Path;

/// Reads `path` once and feeds every requested accumulator.
/// An empty `algorithms` slice means sha256 only.
pub async fn digest_file(
    path: &Path,
    algorithms: &[AlgorithmId],
    chunk_size: usize,
) -> Result<BTreeMap<AlgorithmId, String>> {
    let mut accumulators: Vec<_> = if algorithms.is_empty() {
        vec![digest::create(AlgorithmId::Sha256)]
    } else {
        let mut ids = algorithms.to_vec();
        ids.sort();
        ids.dedup();
        ids.into_iter().map(digest::create).collect()
    };

    let mut source = FileSource::open(path, chunk_size).await?;
    while let Some(chunk) = source
        .next_chunk()
        .await
        .with_context(|| format!("reading {}", path.display()))?
    {
        for acc in accumulators.iter_mut() {
            acc.update(&chunk);
        }
    }

    Ok(accumulators
        .into_iter()
        .map(|acc| (acc.algorithm(), acc.finalize()))
        .collect())
}

/// Prints `hex  algorithm  path`, one line per algorithm.
pub async fn run_digest(cfg: &VerifyConfig, path: &Path, algorithms: &[AlgorithmId]) -> Result<()> {
    let digests = digest_file(path, algorithms, cfg.chunk_size).await?;
    for (alg, hex) in digests {
        println!("{}  {}  {}", hex, alg.display_name(), path.display());
    }
    Ok(())
}
