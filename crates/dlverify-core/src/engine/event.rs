//! Download lifecycle inputs delivered by the hosting platform.

use serde::{Deserialize, Serialize};

use super::DownloadId;

/// A new download started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadCreated {
    pub id: DownloadId,
    pub url: String,
    /// URL after redirects, if the platform already knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
}

/// `{ "current": ... }` wrapper used by download deltas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change<T> {
    pub current: T,
}

/// Platform download state as reported in a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaState {
    InProgress,
    Interrupted,
    Complete,
}

/// Something about a download changed: its filename, its state, or both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadDelta {
    pub id: DownloadId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<Change<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Change<DeltaState>>,
}

impl DownloadDelta {
    pub fn filename(id: DownloadId, path: impl Into<String>) -> Self {
        Self {
            id,
            filename: Some(Change {
                current: path.into(),
            }),
            state: None,
        }
    }

    pub fn state(id: DownloadId, state: DeltaState) -> Self {
        Self {
            id,
            filename: None,
            state: Some(Change { current: state }),
        }
    }
}
