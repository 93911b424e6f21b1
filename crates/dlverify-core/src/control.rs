//! Abort tokens for in-flight verifications.
//!
//! Each running verification is registered with an abort token. When its
//! download is interrupted the runtime sets the token; the hashing loop checks
//! it before every chunk and stops without reporting anything.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::engine::DownloadId;

/// Error returned when a verification stops because its download was interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyAborted;

impl std::fmt::Display for VerifyAborted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "verification aborted: download interrupted")
    }
}

impl std::error::Error for VerifyAborted {}

/// Download id -> abort token for every verification still running.
///
/// Owned by the runtime's event loop, so no lock is needed around the map;
/// only the tokens themselves are shared with the hashing tasks.
#[derive(Debug, Default)]
pub struct VerifyControl {
    tokens: HashMap<DownloadId, Arc<AtomicBool>>,
}

impl VerifyControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a verification; returns the token to hand to the hashing task.
    pub fn register(&mut self, id: DownloadId) -> Arc<AtomicBool> {
        let token = Arc::new(AtomicBool::new(false));
        self.tokens.insert(id, Arc::clone(&token));
        token
    }

    /// Forget a verification once its task has reported back.
    pub fn unregister(&mut self, id: DownloadId) {
        self.tokens.remove(&id);
    }

    /// Ask the verification for `id` to stop. No-op if none is running.
    pub fn request_abort(&self, id: DownloadId) -> bool {
        match self.tokens.get(&id) {
            Some(token) => {
                token.store(true, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Number of verifications that have not reported back yet.
    pub fn in_flight(&self) -> usize {
        self.tokens.len()
    }
}
