//! `dlverify scan` – run extraction on a saved page.

use anyhow::{Context, Result};
use dlverify_core::config::VerifyConfig;
use dlverify_core::signal::{scan_page, PageMessage};
use std::fs;
use std::path::Path;

/// Scans the page at `path`. `--only-dangerous` can only tighten the configured filter.
pub fn scan_file(
    cfg: &VerifyConfig,
    path: &Path,
    page_url: Option<&str>,
    only_dangerous: bool,
) -> Result<PageMessage> {
    let html =
        fs::read_to_string(path).with_context(|| format!("reading page {}", path.display()))?;
    let mut filter = cfg.link_filter();
    filter.only_dangerous |= only_dangerous;
    Ok(scan_page(&html, page_url, &filter))
}

pub fn run_scan(
    cfg: &VerifyConfig,
    path: &Path,
    page_url: Option<&str>,
    only_dangerous: bool,
) -> Result<()> {
    let message = scan_file(cfg, path, page_url, only_dangerous)?;
    println!("{}", serde_json::to_string_pretty(&message)?);
    Ok(())
}
