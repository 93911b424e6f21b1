//! CLI for the dlverify download checksum verifier.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dlverify_core::config;
use dlverify_core::digest::AlgorithmId;
use std::path::Path;

use commands::{run_digest, run_replay, run_scan, run_verify};

/// Top-level CLI for dlverify.
#[derive(Debug, Parser)]
#[command(name = "dlverify")]
#[command(
    about = "dlverify: check downloads against checksums published on the page that linked them",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Extract checksums, algorithm names and links from a saved HTML page.
    Scan {
        /// Path to the HTML file.
        path: String,
        /// URL the page was served from; used to resolve relative links.
        #[arg(long, value_name = "URL")]
        page_url: Option<String>,
        /// Only keep links to executables, installers and archives.
        #[arg(long)]
        only_dangerous: bool,
    },

    /// Compute digests of a file.
    Digest {
        /// Path to the file.
        path: String,
        /// Algorithm to compute (repeatable, e.g. -a sha256 -a md5). Default: sha256.
        #[arg(short = 'a', long = "algorithm", value_name = "ALG")]
        algorithms: Vec<AlgorithmId>,
    },

    /// Verify a downloaded file against the checksums on the page that linked it.
    Verify {
        /// Path to the downloaded file.
        path: String,
        /// Saved HTML of the page the download was started from.
        #[arg(long, value_name = "HTML")]
        page: String,
        /// URL the file was downloaded from.
        #[arg(long)]
        url: String,
        /// URL the page was served from; used to resolve relative links.
        #[arg(long, value_name = "URL")]
        page_url: Option<String>,
    },

    /// Feed a recorded JSON-lines host event stream through the engine.
    Replay {
        /// Path to the events file.
        path: String,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Scan {
                path,
                page_url,
                only_dangerous,
            } => run_scan(&cfg, Path::new(&path), page_url.as_deref(), only_dangerous)?,
            CliCommand::Digest { path, algorithms } => {
                run_digest(&cfg, Path::new(&path), &algorithms).await?
            }
            CliCommand::Verify {
                path,
                page,
                url,
                page_url,
            } => {
                run_verify(
                    &cfg,
                    Path::new(&path),
                    Path::new(&page),
                    &url,
                    page_url.as_deref(),
                )
                .await?
            }
            CliCommand::Replay { path } => run_replay(&cfg, Path::new(&path)).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
