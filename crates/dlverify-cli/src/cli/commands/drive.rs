//! Shared driver: run a batch of host events through the engine runtime.

use anyhow::{anyhow, Result};
use dlverify_core::runtime::{HostEvent, Notification, Runtime};
use dlverify_core::verify::source::SourceOptions;
use dlverify_core::verify::StreamingVerifier;
use tokio::sync::mpsc;

const EVENT_QUEUE: usize = 64;

/// Sends `events` in order, then waits for every verification to finish.
/// `on_note` sees each notification as it arrives; all of them are returned.
pub async fn drive_events<F>(
    options: SourceOptions,
    events: Vec<HostEvent>,
    mut on_note: F,
) -> Result<Vec<Notification>>
where
    F: FnMut(&Notification),
{
    let runtime = Runtime::new(StreamingVerifier::new(options));
    let (tx, rx) = mpsc::channel(EVENT_QUEUE);
    let (notify_tx, mut notify_rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(runtime.run(rx, notify_tx));

    let feeder = tokio::spawn(async move {
        for event in events {
            if tx.send(event).await.is_err() {
                break;
            }
        }
    });

    let mut notes = Vec::new();
    while let Some(note) = notify_rx.recv().await {
        on_note(&note);
        notes.push(note);
    }

    feeder
        .await
        .map_err(|e| anyhow!("event feeder task: {}", e))?;
    handle
        .await
        .map_err(|e| anyhow!("runtime task: {}", e))?;
    Ok(notes)
}
