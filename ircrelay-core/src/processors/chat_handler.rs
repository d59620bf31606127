//! ChatHandler processor.
//!
//! Reacts to a message posted in the relay's channel:
//! - Documentation references are answered right away, in order
//! - Every `http://` link gets its own background title lookup
//!
//! Routing (is this message for our channel at all?) is the session's job.

use super::doc_index::DocMatcher;
use super::title_fetcher::{TitleFetcher, extract_urls};
use crate::events::ChatLineSender;
use crate::transport::IncomingMessage;
use kanau::processor::Processor;
use std::convert::Infallible;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// What handling one message kicked off.
#[derive(Debug, Default)]
pub struct HandledMessage {
    /// Documentation lines sent.
    pub doc_references: usize,
    /// One handle per link found, in order of appearance.
    pub title_fetches: Vec<JoinHandle<()>>,
}

/// ChatHandler turns channel chatter into doc links and link titles.
pub struct ChatHandler {
    matcher: DocMatcher,
    fetcher: TitleFetcher,
    lines_tx: ChatLineSender,
}

impl ChatHandler {
    pub fn new(matcher: DocMatcher, fetcher: TitleFetcher, lines_tx: ChatLineSender) -> Self {
        Self {
            matcher,
            fetcher,
            lines_tx,
        }
    }
}

impl Processor<IncomingMessage> for ChatHandler {
    type Output = HandledMessage;
    type Error = Infallible;

    async fn process(&self, message: IncomingMessage) -> Result<HandledMessage, Infallible> {
        debug!(sender = ?message.sender, text = %message.text, "Handling channel message");

        let mut handled = HandledMessage::default();
        for line in self.matcher.matches(&message.text).await {
            if self.lines_tx.send(line).await.is_err() {
                warn!("Chat line channel closed, dropping doc reference");
                break;
            }
            handled.doc_references += 1;
        }

        handled.title_fetches = extract_urls(&message.text)
            .into_iter()
            .map(|url| self.fetcher.spawn(url.to_owned()))
            .collect();

        Ok(handled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SnapshotStore;
    use crate::events::chat_line_channel;
    use crate::processors::doc_index::DocIndex;
    use ircrelay_sdk::config::{DocsConfig, TitleConfig};
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn message(text: &str) -> IncomingMessage {
        IncomingMessage {
            sender: Some("alice".to_owned()),
            target: "#i3".to_owned(),
            text: text.to_owned(),
        }
    }

    #[tokio::test]
    async fn test_doc_references_then_link_titles() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<title>Bug 42</title>"))
            .mount(&server)
            .await;

        let (tx, mut rx) = chat_line_channel();
        let index = SnapshotStore::new(DocIndex::from_iter(["userguide".to_owned()]));
        let matcher = DocMatcher::new(index, &DocsConfig::default());
        let title = TitleConfig {
            timeout: Duration::from_secs(5),
            ..TitleConfig::default()
        };
        let fetcher = TitleFetcher::new(reqwest::Client::new(), title, tx.clone());
        let handler = ChatHandler::new(matcher, fetcher, tx);

        let text = format!("read >userguide and {}/bugs/42", server.uri());
        let handled = handler.process(message(&text)).await.unwrap();
        assert_eq!(handled.doc_references, 1);
        assert_eq!(handled.title_fetches.len(), 1);
        for fetch in handled.title_fetches {
            fetch.await.unwrap();
        }

        assert_eq!(
            rx.recv().await.unwrap().text(),
            "[Documentation reference] http://i3wm.org/docs/userguide.html"
        );
        assert_eq!(rx.recv().await.unwrap().text(), "[Link info] Bug 42");
    }

    #[tokio::test]
    async fn test_plain_chatter_produces_nothing() {
        let (tx, mut rx) = chat_line_channel();
        let matcher = DocMatcher::new(SnapshotStore::default(), &DocsConfig::default());
        let fetcher = TitleFetcher::new(reqwest::Client::new(), TitleConfig::default(), tx.clone());
        let handler = ChatHandler::new(matcher, fetcher, tx);

        let handled = handler.process(message("good morning")).await.unwrap();
        assert_eq!(handled.doc_references, 0);
        assert!(handled.title_fetches.is_empty());
        assert!(rx.try_recv().is_err());
    }
}
