//! `dlverify replay` – feed a recorded JSON-lines event stream through the runtime.

use anyhow::{Context, Result};
use dlverify_core::config::VerifyConfig;
use dlverify_core::runtime::HostEvent;
use std::fs;
use std::path::Path;

use super::drive_events;

/// One event per non-blank line; lines starting with `#` are comments.
pub fn parse_events(text: &str) -> Result<Vec<HostEvent>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(n, line)| {
            serde_json::from_str(line).with_context(|| format!("line {}: invalid event", n + 1))
        })
        .collect()
}

pub async fn run_replay(cfg: &VerifyConfig, path: &Path) -> Result<()> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading events {}", path.display()))?;
    let events = parse_events(&text)?;
    tracing::info!("replaying {} events from {}", events.len(), path.display());

    drive_events(cfg.source_options(), events, |note| {
        match serde_json::to_string(note) {
            Ok(line) => println!("{}", line),
            Err(e) => tracing::warn!("cannot encode notification: {}", e),
        }
    })
    .await?;
    Ok(())
}
