//! Engine context: retained page signals and the live download table.
//!
//! All mutation happens through [`Engine`] methods called from one event loop
//! (see [`crate::runtime`]), so the tables need no locking. Correlation lives
//! here; the per-download state machine is in `lifecycle`.

mod event;
mod lifecycle;
mod record;

pub use event::{Change, DeltaState, DownloadCreated, DownloadDelta};
pub use lifecycle::file_uri;
pub use record::{DownloadRecord, DownloadState, VerificationPhase};

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use crate::digest::AlgorithmId;
use crate::signal::{PageMessage, PageSignal};
use crate::verify::VerifyRequest;

/// Platform-assigned download identifier.
pub type DownloadId = i64;

/// Work the engine asks its host to carry out after an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Hash the finished file and compare against the page's checksums.
    Verify(VerifyRequest),
    /// The download finished but there is nothing to compare against.
    CannotVerify { id: DownloadId, reason: String },
    /// Stop an in-flight verification; its record is already gone.
    Abort(DownloadId),
}

/// Signals (most recent first) and download records for one host process.
#[derive(Debug, Default)]
pub struct Engine {
    signals: VecDeque<Arc<PageSignal>>,
    downloads: HashMap<DownloadId, DownloadRecord>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retains the signal carried by a page message. Keep-alive pings are ignored.
    pub fn record_page(&mut self, message: PageMessage) {
        if let Some(signal) = message.into_signal() {
            tracing::debug!(
                "recorded page signal: {} urls, {} checksums",
                signal.urls.len(),
                signal.checksums.len()
            );
            self.signals.push_front(Arc::new(signal));
        }
    }

    /// Retained signals, most recently recorded first.
    pub fn signals(&self) -> impl Iterator<Item = &Arc<PageSignal>> {
        self.signals.iter()
    }

    /// Most recent signal linking to `url` or `final_url`.
    ///
    /// When several pages link to the same file, the page visited last wins.
    pub fn find_signal(&self, url: &str, final_url: Option<&str>) -> Option<Arc<PageSignal>> {
        self.signals
            .iter()
            .find(|s| s.links_to(url) || final_url.is_some_and(|f| s.links_to(f)))
            .cloned()
    }

    /// Starts tracking a download, binding the matching page signal if any.
    ///
    /// Returns true if a signal was bound. A repeated event for an id that is
    /// already tracked is ignored; a bound signal is never replaced.
    pub fn on_download_created(&mut self, created: &DownloadCreated) -> bool {
        if self.downloads.contains_key(&created.id) {
            tracing::debug!("download {} already tracked; ignoring created event", created.id);
            return false;
        }
        let bound = self.find_signal(&created.url, created.final_url.as_deref());
        let matched = bound.is_some();
        if matched {
            tracing::info!("download {} correlated with page signal ({})", created.id, created.url);
        } else {
            tracing::debug!("download {} has no page signal ({})", created.id, created.url);
        }
        self.downloads
            .insert(created.id, DownloadRecord::new(created.url.clone(), bound));
        matched
    }

    /// Stores the digests a finished verification computed.
    /// Returns false if the record was dropped in the meantime.
    pub fn record_digests(
        &mut self,
        id: DownloadId,
        digests: BTreeMap<AlgorithmId, String>,
    ) -> bool {
        match self.downloads.get_mut(&id) {
            Some(record) => {
                record.computed_digests = Some(digests);
                record.verification = VerificationPhase::Finished;
                true
            }
            None => false,
        }
    }

    /// Marks a verification as finished without digests (e.g. stream failure).
    pub fn mark_verification_failed(&mut self, id: DownloadId) -> bool {
        match self.downloads.get_mut(&id) {
            Some(record) => {
                record.verification = VerificationPhase::Finished;
                true
            }
            None => false,
        }
    }

    pub fn download(&self, id: DownloadId) -> Option<&DownloadRecord> {
        self.downloads.get(&id)
    }

    /// True while any download has not completed or is still being hashed.
    /// Hosts use this to keep their process alive.
    pub fn has_pending_downloads(&self) -> bool {
        self.downloads
            .values()
            .any(|r| !r.state.is_final() || r.is_verifying())
    }
}
