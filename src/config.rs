//! Session configuration parsed from environment variables.

use std::path::{Path, PathBuf};

use crate::error::SessionError;

/// Address of the official lobby server.
pub const DEFAULT_HOST: &str = "140.247.62.101";
pub const DEFAULT_PORT: u16 = 46631;
/// Display name used when none (or only whitespace) is given.
pub const DEFAULT_PLAYER_NAME: &str = "Player";
pub const DEFAULT_DATA_PATH: &str = ".";
/// Metascheme file name, resolved relative to the data path.
pub const METASCHEME_FILE: &str = "metasettings.ini";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub player_name: String,
    pub host: String,
    pub port: u16,
    pub data_path: PathBuf,
}

impl SessionConfig {
    /// Config for the official server with the given data path and player name.
    ///
    /// A blank name becomes [`DEFAULT_PLAYER_NAME`]; other names are not trimmed.
    #[must_use]
    pub fn new(data_path: impl Into<PathBuf>, player_name: &str) -> Self {
        Self {
            player_name: normalize_player_name(Some(player_name)),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            data_path: data_path.into(),
        }
    }

    /// Override the target server.
    #[must_use]
    pub fn with_server(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    /// Build typed session config from environment variables.
    ///
    /// Optional:
    /// - `LOBBY_PLAYER_NAME`: default `"Player"`
    /// - `LOBBY_HOST`: default official server
    /// - `LOBBY_PORT`: default 46631
    /// - `LOBBY_DATA_PATH`: directory holding `metasettings.ini`, default `.`
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Config`] if `LOBBY_PORT` is set but is not a valid port.
    pub fn from_env() -> Result<Self, SessionError> {
        let player_name = normalize_player_name(std::env::var("LOBBY_PLAYER_NAME").ok().as_deref());
        let host = std::env::var("LOBBY_HOST")
            .ok()
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_port(std::env::var("LOBBY_PORT").ok().as_deref())?;
        let data_path = PathBuf::from(std::env::var("LOBBY_DATA_PATH").unwrap_or_else(|_| DEFAULT_DATA_PATH.into()));

        Ok(Self { player_name, host, port, data_path })
    }

    /// Full path of the metascheme file inside the data path.
    #[must_use]
    pub fn metascheme_path(&self) -> PathBuf {
        self.data_path.join(METASCHEME_FILE)
    }

    #[must_use]
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }
}

/// Fall back to [`DEFAULT_PLAYER_NAME`] for absent or blank names.
///
/// Any other name is kept exactly as given, surrounding whitespace included.
#[must_use]
pub fn normalize_player_name(raw: Option<&str>) -> String {
    match raw {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => DEFAULT_PLAYER_NAME.to_string(),
    }
}

fn parse_port(raw: Option<&str>) -> Result<u16, SessionError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_PORT);
    };
    match raw.trim().parse::<u16>() {
        Ok(0) | Err(_) => Err(SessionError::Config(format!("invalid LOBBY_PORT: {raw}"))),
        Ok(port) => Ok(port),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
