//! Client error types.

use crate::config::ConfigError;
use sidekick_protocol::ProtocolError;
use std::fmt;
use thiserror::Error;

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0} timed out")]
    Timeout(&'static str),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("agent error: {message}")]
    Agent { message: String },

    #[error("empty secret")]
    EmptySecret,

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Broad classification of a [`ClientError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Write/read failed, timed out or the connection dropped.
    Transport,
    /// The agent's reply did not match the protocol.
    Protocol,
    /// The agent explicitly reported an error.
    Application,
    /// The agent returned a secret that was empty after trimming.
    EmptySecret,
    /// Local configuration was invalid.
    Config,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Transport => write!(f, "transport"),
            FailureKind::Protocol => write!(f, "protocol"),
            FailureKind::Application => write!(f, "application"),
            FailureKind::EmptySecret => write!(f, "empty secret"),
            FailureKind::Config => write!(f, "config"),
        }
    }
}

impl ClientError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ClientError::Io(_) | ClientError::Timeout(_) | ClientError::ConnectionClosed => {
                FailureKind::Transport
            }
            ClientError::Protocol(_) => FailureKind::Protocol,
            ClientError::Agent { .. } => FailureKind::Application,
            ClientError::EmptySecret => FailureKind::EmptySecret,
            ClientError::Config(_) => FailureKind::Config,
        }
    }

    /// Returns whether a retry (possibly on a new connection) might succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind() == FailureKind::Transport
    }
}
