//! Per-download tracking record and its state.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::digest::AlgorithmId;
use crate::signal::PageSignal;

/// Lifecycle state of a tracked download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadState {
    Created,
    FilenameKnown,
    Complete,
    Interrupted,
}

impl DownloadState {
    pub fn as_str(self) -> &'static str {
        match self {
            DownloadState::Created => "created",
            DownloadState::FilenameKnown => "filename_known",
            DownloadState::Complete => "complete",
            DownloadState::Interrupted => "interrupted",
        }
    }

    /// Allowed moves: Created -> FilenameKnown -> Complete, and
    /// Created/FilenameKnown -> Interrupted. Complete and Interrupted are final.
    pub fn can_advance_to(self, next: DownloadState) -> bool {
        matches!(
            (self, next),
            (DownloadState::Created, DownloadState::FilenameKnown)
                | (DownloadState::FilenameKnown, DownloadState::Complete)
                | (DownloadState::Created, DownloadState::Interrupted)
                | (DownloadState::FilenameKnown, DownloadState::Interrupted)
        )
    }

    pub fn is_final(self) -> bool {
        matches!(self, DownloadState::Complete | DownloadState::Interrupted)
    }
}

/// What the engine knows about one download.
#[derive(Debug, Clone)]
pub struct DownloadRecord {
    /// Page signal bound at creation; shared with the engine's signal list.
    pub bound_signal: Option<Arc<PageSignal>>,
    pub url: String,
    /// `file://` URI of the saved file, once the platform reports it.
    pub filename: Option<String>,
    pub state: DownloadState,
    pub computed_digests: Option<BTreeMap<AlgorithmId, String>>,
    pub verification: VerificationPhase,
}

/// Where a download is with respect to verification. It never runs twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationPhase {
    NotRequested,
    Running,
    Finished,
}

impl DownloadRecord {
    pub fn new(url: impl Into<String>, bound_signal: Option<Arc<PageSignal>>) -> Self {
        Self {
            bound_signal,
            url: url.into(),
            filename: None,
            state: DownloadState::Created,
            computed_digests: None,
            verification: VerificationPhase::NotRequested,
        }
    }

    /// Record for a download we never saw created.
    pub fn placeholder() -> Self {
        Self::new(String::new(), None)
    }

    /// True while a requested verification has not reported back.
    pub fn is_verifying(&self) -> bool {
        self.verification == VerificationPhase::Running
    }
}
