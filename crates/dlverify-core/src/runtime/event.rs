//! Runtime inputs and outputs as JSON-friendly enums.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::digest::AlgorithmId;
use crate::engine::{DownloadCreated, DownloadDelta, DownloadId};
use crate::signal::PageMessage;

/// One event from the host platform (one JSON line in a replay file).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum HostEvent {
    /// A page finished loading and reported what it found.
    Page { message: PageMessage },
    Created(DownloadCreated),
    Changed(DownloadDelta),
}

/// Outcome notification for the UI collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Notification {
    /// Digests were compared against the page checksums.
    #[serde(rename_all = "camelCase")]
    Finished { id: DownloadId, is_valid: bool },
    /// The download finished but could not be verified.
    FinishedNoValues { id: DownloadId },
    /// Digests computed for a download, keyed by normalized algorithm name.
    ChecksumComputed {
        id: DownloadId,
        digests: BTreeMap<String, String>,
    },
}

impl Notification {
    pub fn id(&self) -> DownloadId {
        match self {
            Notification::Finished { id, .. }
            | Notification::FinishedNoValues { id }
            | Notification::ChecksumComputed { id, .. } => *id,
        }
    }

    pub(crate) fn checksum_computed(
        id: DownloadId,
        digests: &BTreeMap<AlgorithmId, String>,
    ) -> Self {
        Notification::ChecksumComputed {
            id,
            digests: digests
                .iter()
                .map(|(alg, hex)| (alg.as_str().to_string(), hex.clone()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DeltaState;

    #[test]
    fn parse_host_event_lines() {
        let page: HostEvent = serde_json::from_str(
            r#"{"event":"page","message":{"type":"noContent","urls":["http://x/a.iso"]}}"#,
        )
        .unwrap();
        assert!(matches!(page, HostEvent::Page { message: PageMessage::NoContent { .. } }));

        let created: HostEvent =
            serde_json::from_str(r#"{"event":"created","id":3,"url":"http://x/a.iso"}"#).unwrap();
        assert_eq!(
            created,
            HostEvent::Created(DownloadCreated {
                id: 3,
                url: "http://x/a.iso".to_string(),
                final_url: None,
            })
        );

        let changed: HostEvent =
            serde_json::from_str(r#"{"event":"changed","id":3,"state":{"current":"interrupted"}}"#)
                .unwrap();
        assert_eq!(
            changed,
            HostEvent::Changed(DownloadDelta::state(3, DeltaState::Interrupted))
        );
    }

    #[test]
    fn notification_json_shape() {
        let json = serde_json::to_value(Notification::Finished {
            id: 4,
            is_valid: true,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"type": "finished", "id": 4, "isValid": true}));

        let json = serde_json::to_value(Notification::FinishedNoValues { id: 4 }).unwrap();
        assert_eq!(json, serde_json::json!({"type": "finishedNoValues", "id": 4}));

        let mut digests = BTreeMap::new();
        digests.insert(AlgorithmId::Sha3_256, "ab".repeat(32));
        let n = Notification::checksum_computed(4, &digests);
        assert_eq!(n.id(), 4);
        let json = serde_json::to_value(n).unwrap();
        assert_eq!(json["type"], "checksumComputed");
        assert_eq!(json["digests"]["sha3256"], "ab".repeat(32));
    }
}
