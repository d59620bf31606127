//! Chat transport abstraction.
//!
//! The `RelaySession` only talks to the network through [`ChatTransport`].
//! Asynchronous happenings on the connection (registration finished, the
//! socket died, someone spoke) arrive as [`TransportEvent`]s on the channel
//! handed to the transport at construction.

pub mod irc;
pub mod message;

pub use irc::IrcTransport;
pub use message::IrcMessage;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::codec::AnyDelimiterCodecError;

/// Errors reported by a transport primitive.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Socket error while connecting.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Framing error on the line stream.
    #[error("line codec error: {0}")]
    Codec(#[from] AnyDelimiterCodecError),

    /// A primitive was called without a live connection.
    #[error("not connected")]
    NotConnected,
}

/// A message someone sent to a channel or directly to the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Nickname of the sender, if the server included a prefix.
    pub sender: Option<String>,
    /// Channel name, or our own nickname for a private message.
    pub target: String,
    pub text: String,
}

/// Asynchronous notifications from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Registration with the network completed; joins are now accepted.
    Connected,
    /// The connection is gone.
    Disconnected,
    Message(IncomingMessage),
}

/// Connect / join / send / disconnect primitives of a chat network.
#[async_trait]
pub trait ChatTransport: Send {
    /// Open a connection, dropping any previous one first.
    ///
    /// Success means the socket is up; [`TransportEvent::Connected`] follows
    /// once the network accepted us.
    async fn connect(&mut self) -> Result<(), TransportError>;

    async fn join(&mut self, channel: &str) -> Result<(), TransportError>;

    async fn send_message(&mut self, channel: &str, text: &str) -> Result<(), TransportError>;

    /// Leave the network. Does not emit [`TransportEvent::Disconnected`].
    async fn disconnect(&mut self, reason: &str);
}
