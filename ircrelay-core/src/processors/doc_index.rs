//! Documentation index and `>name` reference matching.
//!
//! The DocIndexRefresher is responsible for:
//! - Fetching the docs directory listing
//! - Extracting every `name.html` anchor into a fresh [`DocIndex`]
//! - Swapping the new index in, or keeping the old one on any failure
//!
//! The DocMatcher reads the current snapshot and turns references such as
//! `>userguide#starting` into documentation links.

use crate::config::SnapshotStore;
use crate::events::ChatLine;
use crate::utils::patterns::{DOC_LINK_RE, DOC_REF_RE};
use ircrelay_sdk::config::DocsConfig;
use reqwest::StatusCode;
use std::collections::BTreeSet;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Errors that can occur while refreshing the index.
#[derive(Debug, Error)]
pub enum IndexRefreshError {
    /// HTTP request or body read error.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    /// The listing did not answer with 200.
    #[error("unexpected status {0}")]
    Status(StatusCode),

    /// The listing contained no `.html` anchors.
    #[error("listing contained no documentation pages")]
    Empty,
}

/// Known documentation page names, without the `.html` extension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocIndex {
    names: BTreeSet<String>,
}

impl DocIndex {
    /// Extract every `href='...'>name.html` anchor of a directory listing.
    pub fn from_listing(body: &str) -> Self {
        DOC_LINK_RE
            .captures_iter(body)
            .filter_map(|caps| caps.get(1))
            .map(|name| name.as_str().to_owned())
            .filter(|name| !name.is_empty())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// The stored spelling of `name`, if known.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.names.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl FromIterator<String> for DocIndex {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

/// DocIndexRefresher rebuilds the shared index from the docs listing.
#[derive(Clone)]
pub struct DocIndexRefresher {
    http: reqwest::Client,
    index_url: String,
    index: SnapshotStore<DocIndex>,
}

impl DocIndexRefresher {
    pub fn new(http: reqwest::Client, index_url: String, index: SnapshotStore<DocIndex>) -> Self {
        Self {
            http,
            index_url,
            index,
        }
    }

    /// Fetch the listing and swap in a new index. Returns the page count.
    ///
    /// On error the previous index stays in place.
    pub async fn refresh(&self) -> Result<usize, IndexRefreshError> {
        info!(url = %self.index_url, "Retrieving documentation index");
        let response = self.http.get(&self.index_url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(IndexRefreshError::Status(status));
        }
        let body = response.text().await?;

        let index = DocIndex::from_listing(&body);
        if index.is_empty() {
            return Err(IndexRefreshError::Empty);
        }

        let pages = index.len();
        debug!(docfiles = ?index.iter().collect::<Vec<_>>(), "Parsed documentation index");
        let version = self.index.store(index).await;
        info!(pages, version, "Documentation index updated");
        Ok(pages)
    }

    /// Run [`refresh`](Self::refresh) in the background, logging failures.
    pub fn spawn_refresh(&self) -> JoinHandle<()> {
        let refresher = self.clone();
        tokio::spawn(async move {
            if let Err(e) = refresher.refresh().await {
                warn!(error = %e, "Could not refresh documentation index, keeping the old one");
            }
        })
    }
}

/// DocMatcher turns `>name[#fragment]` references into documentation links.
#[derive(Clone)]
pub struct DocMatcher {
    index: SnapshotStore<DocIndex>,
    doc_base_url: String,
}

impl DocMatcher {
    pub fn new(index: SnapshotStore<DocIndex>, config: &DocsConfig) -> Self {
        Self {
            index,
            doc_base_url: config.doc_base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// One `[Documentation reference]` line per known reference in `text`,
    /// in order of appearance.
    pub async fn matches(&self, text: &str) -> Vec<ChatLine> {
        let index = self.index.load().await;
        match_references(&index, &self.doc_base_url, text)
    }
}

/// Match `text` against a fixed index snapshot.
///
/// The referenced name is lower-cased before lookup; the emitted link uses
/// the spelling stored in the index.
pub fn match_references(index: &DocIndex, doc_base_url: &str, text: &str) -> Vec<ChatLine> {
    DOC_REF_RE
        .captures_iter(text.as_bytes())
        .filter_map(|caps| {
            // Both groups are ASCII-only, so the conversions cannot fail.
            let docref = std::str::from_utf8(caps.get(1)?.as_bytes())
                .ok()?
                .to_ascii_lowercase();
            debug!(docref = %docref, "Checking whether reference is a known doc page");
            let name = index.get(&docref)?;
            let fragment = caps
                .get(2)
                .and_then(|m| std::str::from_utf8(m.as_bytes()).ok())
                .unwrap_or("");
            Some(ChatLine::doc_reference(&format!(
                "{doc_base_url}/{name}.html{fragment}"
            )))
        })
        .collect()
}
