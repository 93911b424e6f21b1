//! `dlverify verify` – check one downloaded file against a saved page.

use anyhow::{bail, Context, Result};
use dlverify_core::config::VerifyConfig;
use dlverify_core::engine::{DeltaState, DownloadCreated, DownloadDelta};
use dlverify_core::runtime::{HostEvent, Notification};
use std::fs;
use std::path::Path;

use super::{drive_events, scan_file};

/// Id used for the single synthetic download.
const DOWNLOAD_ID: i64 = 1;

/// Replays the page visit and the download of `file` from `url`, returning
/// the notifications the runtime produced.
pub async fn verify_download(
    cfg: &VerifyConfig,
    file: &Path,
    page: &Path,
    url: &str,
    page_url: Option<&str>,
) -> Result<Vec<Notification>> {
    let message = scan_file(cfg, page, page_url, false)?;
    let file = fs::canonicalize(file).with_context(|| format!("locating {}", file.display()))?;
    let filename = file
        .to_str()
        .with_context(|| format!("non UTF-8 path {}", file.display()))?
        .to_string();

    let events = vec![
        HostEvent::Page { message },
        HostEvent::Created(DownloadCreated {
            id: DOWNLOAD_ID,
            url: url.to_string(),
            final_url: None,
        }),
        HostEvent::Changed(DownloadDelta::filename(DOWNLOAD_ID, filename)),
        HostEvent::Changed(DownloadDelta::state(DOWNLOAD_ID, DeltaState::Complete)),
    ];
    drive_events(cfg.source_options(), events, |_| {}).await
}

pub async fn run_verify(
    cfg: &VerifyConfig,
    file: &Path,
    page: &Path,
    url: &str,
    page_url: Option<&str>,
) -> Result<()> {
    let notes = verify_download(cfg, file, page, url, page_url).await?;
    for note in &notes {
        match note {
            Notification::ChecksumComputed { digests, .. } => {
                for (alg, hex) in digests {
                    println!("{}  {}", hex, alg);
                }
            }
            Notification::Finished { is_valid: true, .. } => {
                println!("OK: {} matches a checksum on the page", file.display());
            }
            Notification::Finished {
                is_valid: false, ..
            } => bail!(
                "MISMATCH: {} does not match any checksum on the page",
                file.display()
            ),
            Notification::FinishedNoValues { .. } => {
                println!("could not verify {}", file.display());
            }
        }
    }
    Ok(())
}
