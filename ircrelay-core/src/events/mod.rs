//! Chat lines and the channels that carry them.
//!
//! # Line Flow
//!
//! 1. Webhook handlers decode buildbot packets / commit bodies into `ChatLine`s
//! 2. `ChatHandler` emits doc-reference lines and spawns title fetches
//! 3. Title fetches emit link-info lines
//! 4. `RelaySession` drains every line onto the single chat session
//!
//! Every producer holds its own clone of the [`ChatLineSender`], so lines
//! from one producer arrive in the order they were sent.

pub mod buildbot;
pub mod channels;
pub mod types;

pub use buildbot::{BuildFinished, DecodeError, NormalizedEvent, decode};
pub use channels::{
    ChatLineReceiver, ChatLineSender, DEFAULT_CHANNEL_BUFFER, TransportEventReceiver,
    TransportEventSender, chat_line_channel, transport_event_channel,
};
pub use types::{ChatLine, Producer};
