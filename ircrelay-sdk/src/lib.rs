//! Shared types for the ircrelay chat bridge.
//!
//! The server and any producer posting to its webhooks agree on the
//! objects defined here. The HTTP client lives behind the `client` feature.

#[cfg(feature = "client")]
pub mod client;
pub mod config;
pub mod objects;
