//! Event loop that drives the engine and runs verifications.
//!
//! The runtime owns the [`Engine`] and applies host events to it one at a
//! time. Verifications run as tokio tasks; their results come back into the
//! same loop, so engine tables are only ever touched from here. Whether any
//! download is still pending is published on a watch channel (the lease).

mod event;

pub use event::{HostEvent, Notification};

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinSet};

use crate::control::{VerifyAborted, VerifyControl};
use crate::engine::{Action, DownloadId, Engine};
use crate::verify::{Verdict, Verifier, VerifyReport};

/// Verification outcome, or the join error if the verifier task panicked.
type TaskResult = (
    DownloadId,
    Result<Result<VerifyReport, VerifyAborted>, JoinError>,
);

pub struct Runtime<V: Verifier> {
    engine: Engine,
    control: VerifyControl,
    verifier: Arc<V>,
    lease: watch::Sender<bool>,
}

impl<V: Verifier> Runtime<V> {
    pub fn new(verifier: V) -> Self {
        Self::with_engine(Engine::new(), verifier)
    }

    /// Runtime resuming from an existing engine (e.g. with signals already recorded).
    pub fn with_engine(engine: Engine, verifier: V) -> Self {
        let (lease, _) = watch::channel(false);
        Self {
            engine,
            control: VerifyControl::new(),
            verifier: Arc::new(verifier),
            lease,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// True while a download is pending or being verified.
    pub fn lease(&self) -> watch::Receiver<bool> {
        self.lease.subscribe()
    }

    /// Processes `events` until the sender side closes and every running
    /// verification has reported back. Returns the engine for inspection.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<HostEvent>,
        notify: mpsc::UnboundedSender<Notification>,
    ) -> Engine {
        let mut tasks: JoinSet<TaskResult> = JoinSet::new();
        let mut events_open = true;

        loop {
            if !events_open && tasks.is_empty() {
                break;
            }
            tokio::select! {
                event = events.recv(), if events_open => match event {
                    Some(event) => self.handle_event(event, &mut tasks, &notify),
                    None => {
                        tracing::debug!(
                            "event stream closed; {} verifications still running",
                            tasks.len()
                        );
                        events_open = false;
                    }
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => match joined {
                    Ok((id, result)) => self.finish(id, result, &notify),
                    Err(e) => tracing::error!("verification task failed: {}", e),
                },
            }
            self.publish_lease(&tasks);
        }

        tracing::debug!("runtime stopped with {} in-flight tokens", self.control.in_flight());
        self.engine
    }

    fn handle_event(
        &mut self,
        event: HostEvent,
        tasks: &mut JoinSet<TaskResult>,
        notify: &mpsc::UnboundedSender<Notification>,
    ) {
        match event {
            HostEvent::Page { message } => self.engine.record_page(message),
            HostEvent::Created(created) => {
                self.engine.on_download_created(&created);
            }
            HostEvent::Changed(delta) => {
                for action in self.engine.on_download_changed(&delta) {
                    self.dispatch(action, tasks, notify);
                }
            }
        }
    }

    fn dispatch(
        &mut self,
        action: Action,
        tasks: &mut JoinSet<TaskResult>,
        notify: &mpsc::UnboundedSender<Notification>,
    ) {
        match action {
            Action::Verify(request) => {
                let id = request.id;
                tracing::info!("verifying download {} ({})", id, request.uri);
                let abort = self.control.register(id);
                let verifier = Arc::clone(&self.verifier);
                // Inner task so a panicking verifier still reports back under its id.
                tasks.spawn(async move {
                    let inner = tokio::spawn(async move { verifier.verify(request, abort).await });
                    (id, inner.await)
                });
            }
            Action::CannotVerify { id, reason } => {
                tracing::info!("download {}: cannot verify ({})", id, reason);
                send(notify, Notification::FinishedNoValues { id });
            }
            Action::Abort(id) => {
                if !self.control.request_abort(id) {
                    tracing::debug!("no running verification to abort for download {}", id);
                }
            }
        }
    }

    fn finish(
        &mut self,
        id: DownloadId,
        result: Result<Result<VerifyReport, VerifyAborted>, JoinError>,
        notify: &mpsc::UnboundedSender<Notification>,
    ) {
        self.control.unregister(id);
        let result = match result {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("download {}: verification task failed: {}", id, e);
                if self.engine.mark_verification_failed(id) {
                    send(notify, Notification::FinishedNoValues { id });
                }
                return;
            }
        };
        let report = match result {
            Ok(report) => report,
            Err(e) => {
                tracing::debug!("download {}: {}", id, e);
                return;
            }
        };
        // Interrupted after hashing finished but before the result arrived.
        if self.engine.download(id).is_none() {
            tracing::debug!("download {} dropped; discarding verification result", id);
            return;
        }

        match report.verdict {
            Verdict::Valid | Verdict::Invalid => {
                let is_valid = report.verdict == Verdict::Valid;
                if is_valid {
                    tracing::info!("download {}: checksum matches ({} bytes)", id, report.bytes);
                } else {
                    tracing::info!("download {}: checksum does NOT match", id);
                }
                send(notify, Notification::checksum_computed(id, &report.digests));
                self.engine.record_digests(id, report.digests);
                send(notify, Notification::Finished { id, is_valid });
            }
            Verdict::Unverifiable(reason) => {
                tracing::warn!("download {}: could not verify: {}", id, reason);
                self.engine.mark_verification_failed(id);
                send(notify, Notification::FinishedNoValues { id });
            }
        }
    }

    fn publish_lease(&self, tasks: &JoinSet<TaskResult>) {
        let pending = self.engine.has_pending_downloads() || !tasks.is_empty();
        self.lease.send_if_modified(|held| {
            if *held == pending {
                return false;
            }
            tracing::debug!("lease {}", if pending { "acquired" } else { "released" });
            *held = pending;
            true
        });
    }
}

fn send(notify: &mpsc::UnboundedSender<Notification>, notification: Notification) {
    if notify.send(notification).is_err() {
        tracing::debug!("notification receiver gone");
    }
}
