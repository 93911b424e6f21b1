//! HTTP(S) source: libcurl transfer on a blocking thread, chunks over a channel.
//!
//! The curl handler checks the final response status before passing on the
//! first body byte. Dropping the [`HttpSource`] closes the channel, which makes
//! the next write callback return 0 and aborts the transfer.

use std::str;
use tokio::sync::mpsc;

use super::{ByteSource, SourceError, SourceOptions};

/// Chunks buffered between the curl thread and the reader.
const CHANNEL_DEPTH: usize = 8;

/// Abort if throughput stays below this many bytes/s for `low_speed_time`.
const LOW_SPEED_LIMIT: u32 = 1024;

#[derive(Debug)]
enum Message {
    Opened,
    Chunk(Vec<u8>),
    Failed(SourceError),
}

/// Body of an HTTP GET, streamed as it arrives.
#[derive(Debug)]
pub struct HttpSource {
    rx: mpsc::Receiver<Message>,
}

impl HttpSource {
    /// Starts the transfer and waits for a 2xx status (after redirects).
    pub async fn open(url: &str, options: &SourceOptions) -> Result<Self, SourceError> {
        let (tx, mut rx) = mpsc::channel(CHANNEL_DEPTH);
        let url = url.to_string();
        let options = options.clone();
        tokio::task::spawn_blocking(move || transfer(&url, &options, tx));

        match rx.recv().await {
            Some(Message::Opened) => Ok(Self { rx }),
            Some(Message::Failed(e)) => Err(e),
            Some(Message::Chunk(_)) | None => Err(SourceError::Closed),
        }
    }
}

impl ByteSource for HttpSource {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, SourceError> {
        loop {
            match self.rx.recv().await {
                Some(Message::Chunk(chunk)) => return Ok(Some(chunk)),
                Some(Message::Failed(e)) => return Err(e),
                Some(Message::Opened) => continue,
                None => return Ok(None),
            }
        }
    }
}

/// Easy2 handler forwarding body chunks to the async side.
struct ChunkForwarder {
    tx: mpsc::Sender<Message>,
    status: Option<u32>,
    opened: bool,
    failed: bool,
}

impl ChunkForwarder {
    fn new(tx: mpsc::Sender<Message>) -> Self {
        Self {
            tx,
            status: None,
            opened: false,
            failed: false,
        }
    }

    /// Announces the stream once the status is known to be 2xx.
    /// Returns false if body bytes must not be forwarded.
    fn ensure_opened(&mut self) -> bool {
        if self.opened {
            return true;
        }
        if self.failed {
            return false;
        }
        match self.status {
            Some(code) if (200..300).contains(&code) => {
                self.opened = true;
                self.tx.blocking_send(Message::Opened).is_ok()
            }
            other => {
                self.fail(SourceError::Status(other.unwrap_or(0)));
                false
            }
        }
    }

    fn fail(&mut self, err: SourceError) {
        if self.failed {
            return;
        }
        self.failed = true;
        // Reader may be gone already; nothing left to tell.
        let _ = self.tx.blocking_send(Message::Failed(err));
    }
}

impl curl::easy::Handler for ChunkForwarder {
    fn header(&mut self, data: &[u8]) -> bool {
        if let Ok(line) = str::from_utf8(data) {
            // Each redirect hop starts a new status line; the last one wins.
            if let Some(code) = parse_status_line(line) {
                self.status = Some(code);
            }
        }
        true
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, curl::easy::WriteError> {
        if !self.ensure_opened() {
            return Ok(0);
        }
        if self.tx.blocking_send(Message::Chunk(data.to_vec())).is_err() {
            tracing::debug!("hash reader dropped; aborting transfer");
            return Ok(0);
        }
        Ok(data.len())
    }
}

fn transfer(url: &str, options: &SourceOptions, tx: mpsc::Sender<Message>) {
    let mut easy = curl::easy::Easy2::new(ChunkForwarder::new(tx));
    if let Err(e) = configure(&mut easy, url, options) {
        easy.get_mut().fail(SourceError::Curl(e));
        return;
    }

    let result = easy.perform();
    let code = easy.response_code().ok().filter(|c| *c != 0);
    let handler = easy.get_mut();
    if handler.status.is_none() {
        handler.status = code;
    }
    match result {
        // Covers empty bodies, where write was never called.
        Ok(()) => {
            handler.ensure_opened();
        }
        Err(e) => handler.fail(SourceError::Curl(e)),
    }
}

fn configure(
    easy: &mut curl::easy::Easy2<ChunkForwarder>,
    url: &str,
    options: &SourceOptions,
) -> Result<(), curl::Error> {
    easy.url(url)?;
    easy.get(true)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(options.connect_timeout)?;
    easy.low_speed_limit(LOW_SPEED_LIMIT)?;
    easy.low_speed_time(options.low_speed_time)?;
    Ok(())
}

/// Status code from a line like `HTTP/1.1 200 OK` or `HTTP/2 404`.
fn parse_status_line(line: &str) -> Option<u32> {
    let line = line.trim_end();
    if !line.starts_with("HTTP/") {
        return None;
    }
    line.split_whitespace().nth(1)?.parse().ok()
}
