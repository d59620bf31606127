//! TOML file configuration structures.
//!
//! These structs directly map to the `ircrelay.toml` file format. Every key
//! is optional; a missing file section falls back to the built-in defaults.

use ircrelay_sdk::config::{DocsConfig, IrcConfig, ServerConfig as RuntimeServerConfig, TitleConfig};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub server: ServerSection,
    pub irc: IrcSection,
    pub docs: DocsSection,
    pub title: TitleSection,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// The address and port to listen on (e.g., "127.0.0.1:8080").
    pub listen: SocketAddr,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: RuntimeServerConfig::default().listen,
        }
    }
}

/// Chat network and bot identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IrcSection {
    /// `host:port` of the IRC server.
    pub server: String,
    pub nickname: String,
    pub username: String,
    pub realname: String,
    pub channel: String,
}

impl Default for IrcSection {
    fn default() -> Self {
        let irc = IrcConfig::default();
        Self {
            server: irc.server,
            nickname: irc.nickname,
            username: irc.username,
            realname: irc.realname,
            channel: irc.channel,
        }
    }
}

/// Documentation index source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsSection {
    pub index_url: String,
    pub doc_base_url: String,
    pub refresh_interval_secs: u64,
}

impl Default for DocsSection {
    fn default() -> Self {
        let docs = DocsConfig::default();
        Self {
            index_url: docs.index_url,
            doc_base_url: docs.doc_base_url,
            refresh_interval_secs: docs.refresh_interval.as_secs(),
        }
    }
}

/// Link title lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleSection {
    pub timeout_secs: u64,
    pub max_line_len: usize,
}

impl Default for TitleSection {
    fn default() -> Self {
        let title = TitleConfig::default();
        Self {
            timeout_secs: title.timeout.as_secs(),
            max_line_len: title.max_line_len,
        }
    }
}
