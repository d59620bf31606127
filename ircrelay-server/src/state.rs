//! Application state shared across all request handlers.

use ircrelay_core::RelayContext;
use ircrelay_core::config::SnapshotStore;
use ircrelay_core::events::ChatLineSender;
use ircrelay_core::processors::{DocIndex, SessionState};
use tokio::sync::watch;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around.
#[derive(Clone)]
pub struct AppState {
    /// Producer handle into the relay session's output channel.
    pub lines: ChatLineSender,
    /// Current state of the chat session.
    pub session: watch::Receiver<SessionState>,
    /// Current documentation index snapshot.
    pub doc_index: SnapshotStore<DocIndex>,
}

impl AppState {
    pub fn new(context: &RelayContext, session: watch::Receiver<SessionState>) -> Self {
        Self {
            lines: context.lines(),
            session,
            doc_index: context.doc_index().clone(),
        }
    }
}
