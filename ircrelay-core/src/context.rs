//! Shared handles every processor is built from.

use crate::config::SnapshotStore;
use crate::events::ChatLineSender;
use crate::processors::{ChatHandler, DocIndex, DocIndexRefresher, DocMatcher, TitleFetcher};
use ircrelay_sdk::config::RelayConfig;
use tracing::warn;

const USER_AGENT: &str = concat!("ircrelay/", env!("CARGO_PKG_VERSION"));

/// Configuration plus the state shared between the HTTP side and the session.
#[derive(Clone)]
pub struct RelayContext {
    config: RelayConfig,
    http: reqwest::Client,
    lines_tx: ChatLineSender,
    doc_index: SnapshotStore<DocIndex>,
}

impl RelayContext {
    /// Build a context whose producers all send into `lines_tx`.
    ///
    /// The documentation index starts out empty until the first refresh.
    pub fn new(config: RelayConfig, lines_tx: ChatLineSender) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to build HTTP client, using defaults");
                reqwest::Client::new()
            });

        Self {
            config,
            http,
            lines_tx,
            doc_index: SnapshotStore::default(),
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Sender for the single serialized output channel.
    pub fn lines(&self) -> ChatLineSender {
        self.lines_tx.clone()
    }

    pub fn doc_index(&self) -> &SnapshotStore<DocIndex> {
        &self.doc_index
    }

    pub fn title_fetcher(&self) -> TitleFetcher {
        TitleFetcher::new(
            self.http.clone(),
            self.config.title.clone(),
            self.lines_tx.clone(),
        )
    }

    pub fn doc_matcher(&self) -> DocMatcher {
        DocMatcher::new(self.doc_index.clone(), &self.config.docs)
    }

    pub fn doc_refresher(&self) -> DocIndexRefresher {
        DocIndexRefresher::new(
            self.http.clone(),
            self.config.docs.index_url.clone(),
            self.doc_index.clone(),
        )
    }

    pub fn chat_handler(&self) -> ChatHandler {
        ChatHandler::new(self.doc_matcher(), self.title_fetcher(), self.lines_tx.clone())
    }
}
