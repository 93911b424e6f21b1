//! Page signal: what one page visit contributes to verification.
//!
//! A page is scanned once, producing a [`PageMessage`] in the shape the page
//! context sends to the engine. The engine turns `content` and `noContent`
//! messages into an immutable [`PageSignal`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::digest::AlgorithmId;
use crate::extract::{extract_candidates, extract_links, filter_checksums, LinkFilter};

/// URLs, checksums and algorithm names harvested from one page visit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSignal {
    pub urls: BTreeSet<String>,
    /// Lower-case hex.
    pub checksums: BTreeSet<String>,
    /// Normalized algorithm names; unknown names are kept and skipped later.
    pub algorithms: BTreeSet<String>,
}

impl PageSignal {
    /// True if the page links to `url`.
    pub fn links_to(&self, url: &str) -> bool {
        !url.is_empty() && self.urls.contains(url)
    }

    /// True if there is anything to verify against.
    pub fn has_verification_data(&self) -> bool {
        !self.checksums.is_empty() && !self.algorithms.is_empty()
    }

    /// Algorithm names that map to a supported accumulator.
    pub fn known_algorithms(&self) -> BTreeSet<AlgorithmId> {
        self.algorithms
            .iter()
            .filter_map(|name| AlgorithmId::parse(name))
            .collect()
    }
}

/// Message from the page context to the engine (`type`-tagged JSON).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PageMessage {
    Content {
        checksums: Vec<String>,
        algorithms: Vec<String>,
        urls: Vec<String>,
    },
    NoContent {
        urls: Vec<String>,
    },
    /// Liveness ping; carries no data.
    KeepAlive,
}

impl PageMessage {
    /// The signal this message contributes, or `None` for keep-alive pings.
    pub fn into_signal(self) -> Option<PageSignal> {
        match self {
            PageMessage::Content {
                checksums,
                algorithms,
                urls,
            } => Some(PageSignal {
                urls: urls.into_iter().collect(),
                checksums: checksums.into_iter().map(|c| c.to_lowercase()).collect(),
                algorithms: algorithms.into_iter().collect(),
            }),
            PageMessage::NoContent { urls } => Some(PageSignal {
                urls: urls.into_iter().collect(),
                ..PageSignal::default()
            }),
            PageMessage::KeepAlive => None,
        }
    }
}

/// Scans a page's markup and builds the message the page context would send.
///
/// `content` is produced only when both a checksum and an algorithm name were
/// found; otherwise the page reports `noContent` with its links.
pub fn scan_page(html: &str, page_url: Option<&str>, links: &LinkFilter) -> PageMessage {
    let candidates = extract_candidates(html);
    let checksums = filter_checksums(&candidates.checksums);
    let urls = extract_links(html, page_url, links);

    if checksums.is_empty() || candidates.algorithms.is_empty() {
        tracing::info!("no checksum/algorithm pairs found");
        return PageMessage::NoContent {
            urls: urls.into_iter().collect(),
        };
    }

    tracing::debug!(
        "page signal: {} checksums, algorithms {:?}",
        checksums.len(),
        candidates.algorithms
    );
    PageMessage::Content {
        checksums: checksums.into_iter().collect(),
        algorithms: candidates.algorithms.into_iter().collect(),
        urls: urls.into_iter().collect(),
    }
}
