//! Per-download state machine driven by download deltas.

use std::path::Path;

use super::{
    Action, DeltaState, DownloadDelta, DownloadId, DownloadRecord, DownloadState, Engine,
    VerificationPhase,
};
use crate::verify::VerifyRequest;

/// Whether the record survives the delta.
enum Step {
    Keep(Option<Action>),
    Drop(Option<Action>),
}

impl Engine {
    /// Applies a filename and/or state change and returns what the host should do.
    ///
    /// A delta for an unknown id starts a placeholder record (no page signal).
    /// Transitions the state machine does not allow are logged and ignored.
    pub fn on_download_changed(&mut self, delta: &DownloadDelta) -> Vec<Action> {
        let id = delta.id;
        let record = self.downloads.entry(id).or_insert_with(|| {
            tracing::debug!("delta for untracked download {}; adding placeholder", id);
            DownloadRecord::placeholder()
        });

        if let Some(change) = &delta.filename {
            apply_filename(id, record, &change.current);
        }

        let step = match delta.state.as_ref().map(|c| c.current) {
            None | Some(DeltaState::InProgress) => Step::Keep(None),
            Some(DeltaState::Complete) => complete(id, record),
            Some(DeltaState::Interrupted) => interrupt(id, record),
        };

        match step {
            Step::Keep(action) => action.into_iter().collect(),
            Step::Drop(action) => {
                self.downloads.remove(&id);
                action.into_iter().collect()
            }
        }
    }
}

/// Records the saved path. A later name (e.g. after the platform renames the
/// file) replaces the earlier one until the download completes.
fn apply_filename(id: DownloadId, record: &mut DownloadRecord, current: &str) {
    if current.is_empty() {
        return;
    }
    if record.state != DownloadState::FilenameKnown
        && !record.state.can_advance_to(DownloadState::FilenameKnown)
    {
        tracing::debug!(
            "download {}: ignoring filename change in state {}",
            id,
            record.state.as_str()
        );
        return;
    }
    let uri = file_uri(current);
    tracing::debug!("download {} saved as {}", id, uri);
    record.filename = Some(uri);
    record.state = DownloadState::FilenameKnown;
}

fn complete(id: DownloadId, record: &mut DownloadRecord) -> Step {
    match record.state {
        DownloadState::FilenameKnown => {}
        DownloadState::Created => {
            tracing::warn!("download {} completed before its filename was reported", id);
            return Step::Drop(Some(Action::CannotVerify {
                id,
                reason: "download completed without a known file name".to_string(),
            }));
        }
        DownloadState::Complete | DownloadState::Interrupted => {
            tracing::debug!("download {}: ignoring repeated final state", id);
            return Step::Keep(None);
        }
    }

    record.state = DownloadState::Complete;

    let request = match (&record.bound_signal, &record.filename) {
        (Some(signal), Some(uri)) if signal.has_verification_data() => VerifyRequest {
            id,
            uri: uri.clone(),
            algorithms: signal.algorithms.clone(),
            checksums: signal.checksums.clone(),
        },
        _ => {
            tracing::info!("download {}: cannot verify the hash value", id);
            return Step::Keep(Some(Action::CannotVerify {
                id,
                reason: "no checksum found on the linking page".to_string(),
            }));
        }
    };

    record.verification = VerificationPhase::Running;
    Step::Keep(Some(Action::Verify(request)))
}

fn interrupt(id: DownloadId, record: &mut DownloadRecord) -> Step {
    if record.state.can_advance_to(DownloadState::Interrupted) {
        tracing::info!("download {} interrupted", id);
        record.state = DownloadState::Interrupted;
        return Step::Drop(None);
    }
    if record.is_verifying() {
        tracing::info!("download {} interrupted while hashing; abandoning verification", id);
        return Step::Drop(Some(Action::Abort(id)));
    }
    tracing::debug!(
        "download {}: ignoring interruption in state {}",
        id,
        record.state.as_str()
    );
    Step::Keep(None)
}

/// Turns a platform filename into a URI the byte sources understand.
///
/// Values that already carry a scheme (`file://`, `http://`) are kept;
/// absolute paths become `file://` URIs.
pub fn file_uri(filename: &str) -> String {
    if let Ok(u) = url::Url::parse(filename) {
        // One-letter "schemes" are Windows drive letters.
        if u.scheme().len() > 1 {
            return filename.to_string();
        }
    }
    let path = Path::new(filename);
    if path.is_absolute() {
        if let Ok(u) = url::Url::from_file_path(path) {
            return u.to_string();
        }
    }
    format!("file://{}", filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DownloadCreated;
    use crate::signal::PageMessage;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    fn engine_with_download(id: DownloadId, with_checksums: bool) -> Engine {
        let mut engine = Engine::new();
        let message = if with_checksums {
            PageMessage::Content {
                checksums: vec![EMPTY_SHA256.to_string()],
                algorithms: vec!["sha256".to_string()],
                urls: vec!["http://x/empty.bin".to_string()],
            }
        } else {
            PageMessage::NoContent {
                urls: vec!["http://x/empty.bin".to_string()],
            }
        };
        engine.record_page(message);
        engine.on_download_created(&DownloadCreated {
            id,
            url: "http://x/empty.bin".to_string(),
            final_url: None,
        });
        engine
    }

    #[test]
    fn filename_then_complete_requests_verification() {
        let mut engine = engine_with_download(1, true);
        assert!(engine
            .on_download_changed(&DownloadDelta::filename(1, "/tmp/empty.bin"))
            .is_empty());
        assert_eq!(engine.download(1).unwrap().state, DownloadState::FilenameKnown);
        assert_eq!(
            engine.download(1).unwrap().filename.as_deref(),
            Some("file:///tmp/empty.bin")
        );

        let actions = engine.on_download_changed(&DownloadDelta::state(1, DeltaState::Complete));
        match actions.as_slice() {
            [Action::Verify(req)] => {
                assert_eq!(req.id, 1);
                assert_eq!(req.uri, "file:///tmp/empty.bin");
                assert!(req.checksums.contains(EMPTY_SHA256));
                assert!(req.algorithms.contains("sha256"));
            }
            other => panic!("expected Verify, got {:?}", other),
        }
        assert!(engine.has_pending_downloads());
        assert!(engine.record_digests(1, Default::default()));
        assert!(!engine.has_pending_downloads());
    }

    #[test]
    fn verification_is_requested_once() {
        let mut engine = engine_with_download(1, true);
        engine.on_download_changed(&DownloadDelta::filename(1, "/tmp/empty.bin"));
        let first = engine.on_download_changed(&DownloadDelta::state(1, DeltaState::Complete));
        let second = engine.on_download_changed(&DownloadDelta::state(1, DeltaState::Complete));
        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
    }

    #[test]
    fn complete_without_checksums_cannot_verify() {
        let mut engine = engine_with_download(2, false);
        engine.on_download_changed(&DownloadDelta::filename(2, "/tmp/empty.bin"));
        let actions = engine.on_download_changed(&DownloadDelta::state(2, DeltaState::Complete));
        assert!(matches!(actions.as_slice(), [Action::CannotVerify { id: 2, .. }]));
        assert_eq!(engine.download(2).unwrap().state, DownloadState::Complete);
        assert!(!engine.has_pending_downloads());
    }

    #[test]
    fn interrupted_before_filename_drops_record_without_verifying() {
        let mut engine = engine_with_download(3, true);
        let actions = engine.on_download_changed(&DownloadDelta::state(3, DeltaState::Interrupted));
        assert!(actions.is_empty());
        assert!(engine.download(3).is_none());
        assert!(!engine.has_pending_downloads());
    }

    #[test]
    fn interrupted_while_hashing_aborts() {
        let mut engine = engine_with_download(4, true);
        engine.on_download_changed(&DownloadDelta::filename(4, "/tmp/empty.bin"));
        engine.on_download_changed(&DownloadDelta::state(4, DeltaState::Complete));
        let actions = engine.on_download_changed(&DownloadDelta::state(4, DeltaState::Interrupted));
        assert_eq!(actions, vec![Action::Abort(4)]);
        assert!(engine.download(4).is_none());
    }

    #[test]
    fn interrupted_after_verification_is_ignored() {
        let mut engine = engine_with_download(5, true);
        engine.on_download_changed(&DownloadDelta::filename(5, "/tmp/empty.bin"));
        engine.on_download_changed(&DownloadDelta::state(5, DeltaState::Complete));
        engine.record_digests(5, Default::default());
        let actions = engine.on_download_changed(&DownloadDelta::state(5, DeltaState::Interrupted));
        assert!(actions.is_empty());
        assert_eq!(engine.download(5).unwrap().state, DownloadState::Complete);
    }

    #[test]
    fn unknown_id_gets_placeholder() {
        let mut engine = Engine::new();
        engine.on_download_changed(&DownloadDelta::filename(9, "/tmp/x.bin"));
        let record = engine.download(9).unwrap();
        assert!(record.bound_signal.is_none());
        assert_eq!(record.state, DownloadState::FilenameKnown);

        let actions = engine.on_download_changed(&DownloadDelta::state(9, DeltaState::Complete));
        assert!(matches!(actions.as_slice(), [Action::CannotVerify { id: 9, .. }]));
    }

    #[test]
    fn complete_before_filename_is_dropped() {
        let mut engine = engine_with_download(6, true);
        let actions = engine.on_download_changed(&DownloadDelta::state(6, DeltaState::Complete));
        assert!(matches!(actions.as_slice(), [Action::CannotVerify { id: 6, .. }]));
        assert!(engine.download(6).is_none());
    }

    #[test]
    fn later_filename_replaces_earlier_one() {
        let mut engine = engine_with_download(3, true);
        engine.on_download_changed(&DownloadDelta::filename(3, "/tmp/a.exe.crdownload"));
        engine.on_download_changed(&DownloadDelta::filename(3, "/tmp/a.exe"));
        let record = engine.download(3).unwrap();
        assert_eq!(record.state, DownloadState::FilenameKnown);
        assert_eq!(record.filename.as_deref(), Some("file:///tmp/a.exe"));

        let actions = engine.on_download_changed(&DownloadDelta::state(3, DeltaState::Complete));
        match &actions[..] {
            [Action::Verify(request)] => assert_eq!(request.uri, "file:///tmp/a.exe"),
            other => panic!("expected verify, got {other:?}"),
        }

        engine.on_download_changed(&DownloadDelta::filename(3, "/tmp/moved.exe"));
        assert_eq!(
            engine.download(3).unwrap().filename.as_deref(),
            Some("file:///tmp/a.exe")
        );
    }

    #[test]
    fn empty_filename_is_ignored() {
        let mut engine = engine_with_download(7, true);
        engine.on_download_changed(&DownloadDelta::filename(7, ""));
        assert_eq!(engine.download(7).unwrap().state, DownloadState::Created);
    }

    #[test]
    fn filename_and_state_in_one_delta() {
        let mut engine = engine_with_download(8, true);
        let delta = DownloadDelta {
            id: 8,
            filename: Some(crate::engine::Change {
                current: "/tmp/empty.bin".to_string(),
            }),
            state: Some(crate::engine::Change {
                current: DeltaState::Complete,
            }),
        };
        let actions = engine.on_download_changed(&delta);
        assert!(matches!(actions.as_slice(), [Action::Verify(_)]));
    }

    #[test]
    fn file_uri_conversions() {
        assert_eq!(file_uri("/home/u/Downloads/a b.iso"), "file:///home/u/Downloads/a%20b.iso");
        assert_eq!(file_uri("file:///tmp/x"), "file:///tmp/x");
        assert_eq!(file_uri("http://host/x"), "http://host/x");
    }
}
