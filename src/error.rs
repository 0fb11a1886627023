//! Error taxonomy for session construction and outbound calls.

use std::path::PathBuf;

/// Error returned by [`crate::session::NetworkSession`] and [`crate::config::SessionConfig`].
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The metascheme file could not be loaded by the engine.
    #[error("missing or unreadable metascheme: {}", path.display())]
    Configuration { path: PathBuf },

    /// The engine refused to establish a connection.
    #[error("unable to connect to {host}:{port}")]
    Connection { host: String, port: u16 },

    /// An outbound call was made after the session was torn down.
    #[error("session is not connected")]
    NotConnected,

    /// An environment configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    Config(String),
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
