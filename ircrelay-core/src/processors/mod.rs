//! Processors that turn incoming events into chat lines.
//!
//! - `RelaySession`: Owns the chat connection, drains `ChatLine`s onto it,
//!   routes channel messages to the `ChatHandler`
//! - `ChatHandler`: Receives `IncomingMessage`, emits doc references and spawns title lookups
//! - `TitleFetcher`: Fetches a link's `<title>`, emits `[Link info]` lines
//! - `DocIndexRefresher`: Rebuilds the documentation index on schedule
//! - `DocMatcher`: Turns `>name#fragment` references into documentation links

pub mod chat_handler;
pub mod doc_index;
pub mod relay_session;
pub mod title_fetcher;

pub use chat_handler::{ChatHandler, HandledMessage};
pub use doc_index::{DocIndex, DocIndexRefresher, DocMatcher, IndexRefreshError};
pub use relay_session::{RelaySession, SessionState};
pub use title_fetcher::{FetchError, TitleFetcher};
