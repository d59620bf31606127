//! Plain-text IRC client implementing [`ChatTransport`].
//!
//! One TCP connection split into a reader task, which parses lines and turns
//! them into [`TransportEvent`]s, and a writer task, which owns the write half
//! and serializes everything we send. The reader answers `PING` itself so a
//! busy relay loop never gets the session timed out.

use super::message::IrcMessage;
use super::{ChatTransport, IncomingMessage, TransportError, TransportEvent};
use crate::events::TransportEventSender;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use ircrelay_sdk::config::IrcConfig;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, FramedRead, FramedWrite};
use tracing::{debug, info, warn};

/// Servers never send lines this long; anything beyond it is garbage.
const MAX_INBOUND_LINE: usize = 8 * 1024;

/// IRC is byte-oriented: split on `\n` only and let the caller decode text.
fn irc_codec(max_length: usize) -> AnyDelimiterCodec {
    AnyDelimiterCodec::new_with_max_length(b"\n".to_vec(), b"\r\n".to_vec(), max_length)
}

/// IRC transport over a plain TCP connection.
pub struct IrcTransport {
    config: IrcConfig,
    events_tx: TransportEventSender,
    connection: Option<IrcConnection>,
}

/// Handles of one live connection.
struct IrcConnection {
    outbound: mpsc::UnboundedSender<String>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl IrcConnection {
    /// Tear down immediately, without flushing queued lines.
    fn abort(self) {
        self.reader.abort();
        self.writer.abort();
    }

    fn send(&self, line: String) -> Result<(), TransportError> {
        self.outbound
            .send(line)
            .map_err(|_| TransportError::NotConnected)
    }
}

impl IrcTransport {
    /// Create a transport that reports connection events on `events_tx`.
    pub fn new(config: IrcConfig, events_tx: TransportEventSender) -> Self {
        Self {
            config,
            events_tx,
            connection: None,
        }
    }

    fn connection(&self) -> Result<&IrcConnection, TransportError> {
        self.connection.as_ref().ok_or(TransportError::NotConnected)
    }
}

#[async_trait]
impl ChatTransport for IrcTransport {
    async fn connect(&mut self) -> Result<(), TransportError> {
        if let Some(previous) = self.connection.take() {
            debug!("Dropping previous IRC connection");
            previous.abort();
        }

        info!(server = %self.config.server, "Opening IRC connection");
        let stream = TcpStream::connect(&self.config.server).await?;
        let (read_half, write_half) = stream.into_split();

        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let writer = tokio::spawn(write_loop(
            FramedWrite::new(write_half, irc_codec(usize::MAX)),
            outbound_rx,
        ));
        let reader = tokio::spawn(read_loop(
            FramedRead::new(read_half, irc_codec(MAX_INBOUND_LINE)),
            outbound.clone(),
            self.events_tx.clone(),
        ));

        let connection = IrcConnection {
            outbound,
            reader,
            writer,
        };
        connection.send(format!("NICK {}", self.config.nickname))?;
        connection.send(format!(
            "USER {} 0 * :{}",
            self.config.username, self.config.realname
        ))?;
        self.connection = Some(connection);
        Ok(())
    }

    async fn join(&mut self, channel: &str) -> Result<(), TransportError> {
        self.connection()?.send(format!("JOIN {channel}"))
    }

    async fn send_message(&mut self, channel: &str, text: &str) -> Result<(), TransportError> {
        // A raw newline would smuggle a second command onto the wire.
        let text = text.replace(['\r', '\n'], " ");
        self.connection()?.send(format!("PRIVMSG {channel} :{text}"))
    }

    async fn disconnect(&mut self, reason: &str) {
        let Some(connection) = self.connection.take() else {
            return;
        };
        let _ = connection.send(format!("QUIT :{reason}"));
        // Stop reading so no Disconnected event fires; the writer exits
        // once it has flushed the QUIT and every sender is gone.
        connection.reader.abort();
        let IrcConnection {
            outbound, writer, ..
        } = connection;
        drop(outbound);
        if let Err(e) = writer.await {
            debug!(error = %e, "IRC writer ended abnormally");
        }
    }
}

async fn write_loop(
    mut sink: FramedWrite<OwnedWriteHalf, AnyDelimiterCodec>,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
) {
    while let Some(line) = outbound_rx.recv().await {
        debug!(line = %line, "IRC >>");
        if let Err(e) = sink.send(line).await {
            warn!(error = %e, "IRC write failed");
            break;
        }
    }
}

async fn read_loop(
    mut lines: FramedRead<OwnedReadHalf, AnyDelimiterCodec>,
    outbound: mpsc::UnboundedSender<String>,
    events_tx: TransportEventSender,
) {
    while let Some(result) = lines.next().await {
        let raw = match result {
            Ok(raw) => raw,
            Err(AnyDelimiterCodecError::MaxChunkLengthExceeded) => {
                warn!("Discarding overlong IRC line");
                continue;
            }
            Err(e) => {
                warn!(error = %e, "IRC read failed");
                break;
            }
        };
        // Clients send whatever their locale produces; a stray Latin-1
        // byte must not cost us the connection.
        let raw = raw.strip_suffix(b"\r").unwrap_or(&raw[..]);
        let line = String::from_utf8_lossy(raw);
        debug!(line = %line, "IRC <<");

        let Some(message) = IrcMessage::parse(&line) else {
            continue;
        };
        if let Some(event) = handle_message(message, &outbound) {
            if events_tx.send(event).await.is_err() {
                debug!("Transport event receiver dropped, stopping reader");
                return;
            }
        }
    }

    info!("IRC connection closed");
    let _ = events_tx.send(TransportEvent::Disconnected).await;
}

/// React to one server line. Protocol chores are answered inline; lines the
/// session cares about become events.
fn handle_message(
    message: IrcMessage,
    outbound: &mpsc::UnboundedSender<String>,
) -> Option<TransportEvent> {
    match message.command.as_str() {
        "PING" => {
            let token = message.params.last().map_or("", String::as_str);
            let _ = outbound.send(format!("PONG :{token}"));
            None
        }
        // RPL_WELCOME: registration done.
        "001" => Some(TransportEvent::Connected),
        // ERR_NICKNAMEINUSE: retry with an underscore appended.
        "433" => {
            let taken = message.params.get(1)?;
            warn!(nickname = %taken, "Nickname in use, trying an alternative");
            let _ = outbound.send(format!("NICK {taken}_"));
            None
        }
        "PRIVMSG" => {
            let sender = message.nick().map(str::to_owned);
            let mut params = message.params.into_iter();
            let (Some(target), Some(text)) = (params.next(), params.next()) else {
                return None;
            };
            Some(TransportEvent::Message(IncomingMessage {
                sender,
                target,
                text,
            }))
        }
        "ERROR" => {
            warn!(reason = ?message.params.last(), "IRC server closed the link");
            None
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::transport_event_channel;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    fn parse(line: &str) -> IrcMessage {
        IrcMessage::parse(line).unwrap()
    }

    #[test]
    fn test_ping_answered_with_pong() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        assert_eq!(handle_message(parse("PING :abc"), &tx), None);
        assert_eq!(rx.try_recv().unwrap(), "PONG :abc");
    }

    #[test]
    fn test_welcome_is_connected() {
        let (tx, _rx) = mpsc::unbounded_channel();
        assert_eq!(
            handle_message(parse(":srv 001 i3 :Welcome"), &tx),
            Some(TransportEvent::Connected)
        );
    }

    #[test]
    fn test_nick_collision_retries_with_suffix() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        handle_message(parse(":srv 433 * i3 :Nickname is already in use"), &tx);
        assert_eq!(rx.try_recv().unwrap(), "NICK i3_");
    }

    #[test]
    fn test_privmsg_becomes_message_event() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let event = handle_message(parse(":bob!b@h PRIVMSG #i3 :hello there"), &tx);
        assert_eq!(
            event,
            Some(TransportEvent::Message(IncomingMessage {
                sender: Some("bob".to_owned()),
                target: "#i3".to_owned(),
                text: "hello there".to_owned(),
            }))
        );
    }

    #[tokio::test]
    async fn test_session_against_local_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let (read, mut write) = socket.into_split();
            let mut lines = BufReader::new(read).lines();
            let mut received = Vec::new();
            received.push(lines.next_line().await.unwrap().unwrap());
            received.push(lines.next_line().await.unwrap().unwrap());
            write
                .write_all(b":srv 001 relay :Welcome\r\n:bob!b@h PRIVMSG #i3 :caf\xe9\r\n")
                .await
                .unwrap();
            write.write_all(b":bob!b@h PRIVMSG #i3 :hi\r\n").await.unwrap();
            received.push(lines.next_line().await.unwrap().unwrap());
            received.push(lines.next_line().await.unwrap().unwrap());
            drop(write);
            received
        });

        let (events_tx, mut events_rx) = transport_event_channel();
        let config = IrcConfig {
            server: addr.to_string(),
            nickname: "relay".to_owned(),
            username: "relay".to_owned(),
            realname: "test".to_owned(),
            channel: "#i3".to_owned(),
        };
        let mut transport = IrcTransport::new(config, events_tx);
        transport.connect().await.unwrap();

        assert_eq!(events_rx.recv().await, Some(TransportEvent::Connected));
        transport.join("#i3").await.unwrap();
        assert!(matches!(
            events_rx.recv().await,
            Some(TransportEvent::Message(IncomingMessage { ref text, .. })) if text == "caf\u{fffd}"
        ));
        assert!(matches!(
            events_rx.recv().await,
            Some(TransportEvent::Message(IncomingMessage { ref text, .. })) if text == "hi"
        ));
        // The invalid byte did not cost the connection.
        assert!(events_rx.try_recv().is_err());
        transport.send_message("#i3", "built\nok").await.unwrap();

        let received = server.await.unwrap();
        assert_eq!(
            received,
            vec![
                "NICK relay",
                "USER relay 0 * :test",
                "JOIN #i3",
                "PRIVMSG #i3 :built ok",
            ]
        );
        assert_eq!(events_rx.recv().await, Some(TransportEvent::Disconnected));
    }

    #[tokio::test]
    async fn test_primitives_fail_without_connection() {
        let (events_tx, _events_rx) = transport_event_channel();
        let mut transport = IrcTransport::new(IrcConfig::default(), events_tx);
        assert!(matches!(
            transport.join("#i3").await,
            Err(TransportError::NotConnected)
        ));
        assert!(matches!(
            transport.send_message("#i3", "x").await,
            Err(TransportError::NotConnected)
        ));
        transport.disconnect("bye").await;
    }
}
