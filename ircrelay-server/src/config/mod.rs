//! Configuration module for ircrelay-server.
//!
//! Handles loading configuration from an optional TOML file and CLI
//! arguments, and turning it into the runtime [`RelayConfig`].

pub mod file;

use crate::config::file::FileConfig;
use ircrelay_sdk::config::{
    DocsConfig, IrcConfig, RelayConfig, ServerConfig, TitleConfig,
};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    listen_override: Option<SocketAddr>,
    channel_override: Option<String>,
}

impl ConfigLoader {
    /// Create a new config loader. Without a path, only defaults and
    /// overrides apply.
    pub fn new(
        config_path: Option<impl AsRef<Path>>,
        listen_override: Option<SocketAddr>,
        channel_override: Option<String>,
    ) -> Self {
        Self {
            config_path: config_path.map(|p| p.as_ref().to_path_buf()),
            listen_override,
            channel_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file, if one was given
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    pub fn load(&self) -> Result<RelayConfig, ConfigError> {
        let mut file_config = match &self.config_path {
            Some(path) => {
                let config_content = std::fs::read_to_string(path)?;
                toml::from_str(&config_content)?
            }
            None => FileConfig::default(),
        };

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }
        if let Some(channel) = &self.channel_override {
            file_config.irc.channel = channel.clone();
        }

        self.validate(&file_config)?;

        Ok(build_relay_config(file_config))
    }

    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        let channel = &config.irc.channel;
        if !(channel.starts_with('#') || channel.starts_with('&')) || channel.len() < 2 {
            return Err(ConfigError::ValidationError(format!(
                "channel {channel:?} must start with '#' or '&'"
            )));
        }
        if channel.contains([' ', ',', '\x07']) {
            return Err(ConfigError::ValidationError(format!(
                "channel {channel:?} contains a forbidden character"
            )));
        }
        if config.title.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "title.timeout_secs must be greater than zero".to_owned(),
            ));
        }
        if config.title.max_line_len == 0 {
            return Err(ConfigError::ValidationError(
                "title.max_line_len must be greater than zero".to_owned(),
            ));
        }
        if config.docs.refresh_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "docs.refresh_interval_secs must be greater than zero".to_owned(),
            ));
        }
        if !config.irc.server.contains(':') {
            return Err(ConfigError::ValidationError(format!(
                "irc.server {:?} must be host:port",
                config.irc.server
            )));
        }
        Ok(())
    }
}

fn build_relay_config(file_config: FileConfig) -> RelayConfig {
    RelayConfig {
        server: ServerConfig {
            listen: file_config.server.listen,
        },
        irc: IrcConfig {
            server: file_config.irc.server,
            nickname: file_config.irc.nickname,
            username: file_config.irc.username,
            realname: file_config.irc.realname,
            channel: file_config.irc.channel,
        },
        docs: DocsConfig {
            index_url: file_config.docs.index_url,
            doc_base_url: file_config.docs.doc_base_url.trim_end_matches('/').to_owned(),
            refresh_interval: Duration::from_secs(file_config.docs.refresh_interval_secs),
        },
        title: TitleConfig {
            timeout: Duration::from_secs(file_config.title.timeout_secs),
            max_line_len: file_config.title.max_line_len,
        },
    }
}
