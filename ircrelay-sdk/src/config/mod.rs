//! Configuration types for the relay.
//!
//! These types represent the validated runtime configuration shared by the
//! core processors and the server. Loading and parsing the config file is
//! handled by the server crate.

mod docs;
mod irc;
mod server;
mod title;

pub use docs::DocsConfig;
pub use irc::IrcConfig;
pub use server::ServerConfig;
pub use title::TitleConfig;

/// Complete runtime configuration of one relay process.
#[derive(Debug, Clone, Default)]
pub struct RelayConfig {
    pub server: ServerConfig,
    pub irc: IrcConfig,
    pub docs: DocsConfig,
    pub title: TitleConfig,
}
