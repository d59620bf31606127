//! TitleFetcher processor.
//!
//! The TitleFetcher is responsible for:
//! - Finding `http://` links in chat text
//! - Fetching each link with a hard deadline per attempt
//! - Scanning the body line by line for a `<title>` element
//! - Retrying once when a 404 was probably caused by trailing prose punctuation
//! - Emitting `[Link info] {title}` lines
//!
//! Nothing here ever fails loudly: every error ends in a log line and no
//! chat output.

use crate::events::{ChatLine, ChatLineSender};
use crate::utils::patterns::{TITLE_RE, URL_RE};
use ircrelay_sdk::config::TitleConfig;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Characters that end up glued to a URL written inside a sentence,
/// e.g. "(see http://i3wm.org/docs/userguide.html)".
const PROSE_SUFFIXES: [char; 2] = [',', ')'];

/// Errors that can occur while looking up a title.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The attempt did not finish before the deadline.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// HTTP request or body read error.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Anything but 200.
    #[error("unexpected status {0}")]
    Status(StatusCode),

    /// The body ended without a `<title>` line.
    #[error("no title found")]
    NoTitle,
}

/// Candidate links in a chat message, in order of appearance.
pub fn extract_urls(text: &str) -> Vec<&str> {
    URL_RE.find_iter(text).map(|m| m.as_str()).collect()
}

/// TitleFetcher looks up page titles for links posted in the channel.
#[derive(Clone)]
pub struct TitleFetcher {
    http: reqwest::Client,
    config: TitleConfig,
    lines_tx: ChatLineSender,
}

impl TitleFetcher {
    /// Create a new TitleFetcher.
    ///
    /// # Arguments
    ///
    /// * `http` - Shared HTTP client
    /// * `config` - Deadline and line-length limits
    /// * `lines_tx` - Where `[Link info]` lines are sent
    pub fn new(http: reqwest::Client, config: TitleConfig, lines_tx: ChatLineSender) -> Self {
        Self {
            http,
            config,
            lines_tx,
        }
    }

    /// Fire-and-forget lookup of `url`. A found title is sent as a chat line.
    pub fn spawn(&self, url: String) -> JoinHandle<()> {
        let fetcher = self.clone();
        tokio::spawn(async move {
            let Some(title) = fetcher.fetch_title(&url).await else {
                return;
            };
            if fetcher.lines_tx.send(ChatLine::link_info(&title)).await.is_err() {
                warn!(url = %url, "Chat line channel closed, dropping link info");
            }
        })
    }

    /// Look up the title of `url`, or `None` on any failure.
    pub async fn fetch_title(&self, url: &str) -> Option<String> {
        match self.try_fetch_title(url).await {
            Ok(title) => Some(title),
            Err(e) => {
                debug!(url = %url, error = %e, "No title for URL");
                None
            }
        }
    }

    /// Look up the title of `url`, applying the retry-once policy.
    pub async fn try_fetch_title(&self, url: &str) -> Result<String, FetchError> {
        match self.fetch_once(url).await {
            Err(FetchError::Status(StatusCode::NOT_FOUND)) if url.ends_with(PROSE_SUFFIXES) => {
                let trimmed = url.trim_end_matches(PROSE_SUFFIXES);
                info!(url = %url, retry = %trimmed, "Retrying without trailing punctuation");
                self.fetch_once(trimmed).await
            }
            other => other,
        }
    }

    /// One attempt, bounded by the configured deadline. The in-flight
    /// request is dropped when the deadline wins.
    async fn fetch_once(&self, url: &str) -> Result<String, FetchError> {
        tokio::time::timeout(self.config.timeout, self.get_title(url))
            .await
            .map_err(|_| FetchError::Timeout(self.config.timeout))?
    }

    async fn get_title(&self, url: &str) -> Result<String, FetchError> {
        let mut response = self.http.get(url).send().await?;
        let status = response.status();
        info!(url = %url, status = status.as_u16(), "Fetched URL");

        if status != StatusCode::OK {
            return Err(FetchError::Status(status));
        }

        let mut scanner = TitleScanner::new(self.config.max_line_len);
        while let Some(chunk) = response.chunk().await? {
            if let Some(title) = scanner.feed(&chunk) {
                return Ok(title);
            }
        }
        scanner.finish().ok_or(FetchError::NoTitle)
    }
}

/// Incremental line splitter that stops at the first `<title>` line.
///
/// Unterminated input is buffered up to `max_line_len` bytes; past that it
/// is scanned in pieces of that size, so a title straddling such a boundary
/// is missed.
struct TitleScanner {
    buf: Vec<u8>,
    max_line_len: usize,
}

impl TitleScanner {
    fn new(max_line_len: usize) -> Self {
        Self {
            buf: Vec::new(),
            max_line_len: max_line_len.max(1),
        }
    }

    fn feed(&mut self, chunk: &[u8]) -> Option<String> {
        self.buf.extend_from_slice(chunk);

        let mut consumed = 0;
        loop {
            let rest = &self.buf[consumed..];
            let (line, advance) = match rest.iter().position(|&b| b == b'\n') {
                Some(end) => (&rest[..end], end + 1),
                None if rest.len() >= self.max_line_len => {
                    (&rest[..self.max_line_len], self.max_line_len)
                }
                None => break,
            };
            if let Some(title) = title_in(line) {
                return Some(title);
            }
            consumed += advance;
        }

        self.buf.drain(..consumed);
        None
    }

    /// Scan whatever is left after the body ended without a final newline.
    fn finish(self) -> Option<String> {
        title_in(&self.buf)
    }
}

fn title_in(line: &[u8]) -> Option<String> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let captures = TITLE_RE.captures(line)?;
    let title = captures.get(1)?;
    Some(String::from_utf8_lossy(title.as_bytes()).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::chat_line_channel;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(timeout: Duration) -> (TitleFetcher, crate::events::ChatLineReceiver) {
        let (tx, rx) = chat_line_channel();
        let config = TitleConfig {
            timeout,
            ..TitleConfig::default()
        };
        (TitleFetcher::new(reqwest::Client::new(), config, tx), rx)
    }

    #[test]
    fn test_extract_urls_in_order() {
        assert_eq!(
            extract_urls("a http://x.example/1 b http://y.example/2) https://z.example"),
            vec!["http://x.example/1", "http://y.example/2)"]
        );
        assert!(extract_urls("no links here").is_empty());
    }

    #[test]
    fn test_scanner_finds_title_split_across_chunks() {
        let mut scanner = TitleScanner::new(1024);
        assert_eq!(scanner.feed(b"<html>\n<head><tit"), None);
        assert_eq!(
            scanner.feed(b"le>i3 &amp; friends</title>\r\n"),
            Some("i3 &amp; friends".to_owned())
        );
    }

    #[test]
    fn test_scanner_ignores_title_spanning_lines() {
        let mut scanner = TitleScanner::new(1024);
        assert_eq!(scanner.feed(b"<title>broken\n</title>\n"), None);
        assert_eq!(scanner.finish(), None);
    }

    #[test]
    fn test_scanner_checks_unterminated_last_line() {
        let mut scanner = TitleScanner::new(1024);
        assert_eq!(scanner.feed(b"x\n<title>tail</title>"), None);
        assert_eq!(scanner.finish(), Some("tail".to_owned()));
    }

    #[test]
    fn test_scanner_bounds_buffer_on_overlong_lines() {
        let mut scanner = TitleScanner::new(8);
        assert_eq!(scanner.feed(&[b'a'; 20]), None);
        assert!(scanner.buf.len() < 8);
        assert_eq!(scanner.feed(b"\n<title>t</title>\n"), Some("t".to_owned()));
    }

    #[tokio::test]
    async fn test_title_found_on_ok_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html>\n<head>\n<title>i3: improved tiling wm</title>\n</head>\n",
            ))
            .mount(&server)
            .await;

        let (fetcher, _rx) = fetcher(Duration::from_secs(10));
        let title = fetcher
            .fetch_title(&format!("{}/page.html", server.uri()))
            .await;
        assert_eq!(title.as_deref(), Some("i3: improved tiling wm"));
    }

    #[tokio::test]
    async fn test_404_with_trailing_paren_retries_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page.html)"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/page.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<title>ok</title>\n"))
            .expect(1)
            .mount(&server)
            .await;

        let (fetcher, _rx) = fetcher(Duration::from_secs(10));
        let title = fetcher
            .fetch_title(&format!("{}/page.html)", server.uri()))
            .await;
        assert_eq!(title.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn test_404_without_prose_suffix_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let (fetcher, _rx) = fetcher(Duration::from_secs(10));
        let result = fetcher
            .try_fetch_title(&format!("{}/missing", server.uri()))
            .await;
        assert!(matches!(result, Err(FetchError::Status(StatusCode::NOT_FOUND))));
    }

    #[tokio::test]
    async fn test_other_status_with_suffix_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let (fetcher, _rx) = fetcher(Duration::from_secs(10));
        let url = format!("{}/page,", server.uri());
        assert_eq!(fetcher.fetch_title(&url).await, None);
    }

    #[tokio::test]
    async fn test_slow_server_times_out_quietly() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<title>late</title>\n")
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let (fetcher, _rx) = fetcher(Duration::from_millis(200));
        let result = fetcher.try_fetch_title(&server.uri()).await;
        assert!(matches!(result, Err(FetchError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_body_without_title_yields_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("plain text\n"))
            .mount(&server)
            .await;

        let (fetcher, _rx) = fetcher(Duration::from_secs(10));
        let result = fetcher.try_fetch_title(&server.uri()).await;
        assert!(matches!(result, Err(FetchError::NoTitle)));
    }

    #[tokio::test]
    async fn test_spawn_emits_link_info_line() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<title>hello</title>"))
            .mount(&server)
            .await;

        let (fetcher, mut rx) = fetcher(Duration::from_secs(10));
        fetcher.spawn(server.uri()).await.unwrap();

        let line = rx.recv().await.unwrap();
        assert_eq!(line.text(), "[Link info] hello");
        assert_eq!(line.producer(), crate::events::Producer::LinkInfo);
    }

    #[tokio::test]
    async fn test_spawn_on_failure_emits_nothing() {
        let (fetcher, mut rx) = fetcher(Duration::from_millis(500));
        // Nothing listens on the discard port.
        fetcher.spawn("http://127.0.0.1:9/".to_owned()).await.unwrap();
        assert!(rx.try_recv().is_err());
    }
}
