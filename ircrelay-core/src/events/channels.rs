//! Channel factories and handles.

use super::types::ChatLine;
use crate::transport::TransportEvent;
use tokio::sync::mpsc;

/// Default buffer size for the relay channels.
///
/// A full line channel makes producers wait on `send`, which in turn holds
/// webhook requests open until the session catches up.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Sender handle for outbound chat lines.
pub type ChatLineSender = mpsc::Sender<ChatLine>;
/// Receiver handle for outbound chat lines. Owned by the `RelaySession`.
pub type ChatLineReceiver = mpsc::Receiver<ChatLine>;

/// Sender handle for transport events (connected, disconnected, messages).
pub type TransportEventSender = mpsc::Sender<TransportEvent>;
/// Receiver handle for transport events.
pub type TransportEventReceiver = mpsc::Receiver<TransportEvent>;

/// Create the outbound chat line channel.
///
/// Returns a (sender, receiver) pair. Every producer should hold its own
/// clone of the sender.
pub fn chat_line_channel() -> (ChatLineSender, ChatLineReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

/// Create the transport event channel.
///
/// The sender goes to the `ChatTransport`, the receiver to the `RelaySession`.
pub fn transport_event_channel() -> (TransportEventSender, TransportEventReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}
