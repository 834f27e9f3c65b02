//! Error types for the chat server
//!
//! Three layers: `AppError` for anything that ends a task (only `Bind` ends
//! the process), `AdmissionError` for rejected handshakes, and `SendError`
//! for a single failed outbound delivery.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    /// Listener could not bind (fatal)
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// IO error on a single connection
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No line arrived within the configured read deadline
    #[error("Idle for more than {0:?}")]
    IdleTimeout(Duration),

    /// Channel send error (coordinator is gone)
    #[error("Channel send error")]
    ChannelSend,
}

/// Reasons a handshake does not make a client Active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("username is empty")]
    EmptyUsername,

    #[error("username already exists")]
    UsernameTaken,

    #[error("server is full")]
    ServerFull,
}

impl AdmissionError {
    /// Line written to the rejected client before its connection is closed
    pub fn rejection_line(&self) -> &'static str {
        match self {
            AdmissionError::EmptyUsername => {
                "Username cannot be empty. Connection will be closed.\n"
            }
            AdmissionError::UsernameTaken => {
                "Username already exists. Connection will be closed.\n"
            }
            AdmissionError::ServerFull => "Chat is full. Connection will be closed.\n",
        }
    }
}

/// Outbound delivery errors
#[derive(Debug, Error)]
pub enum SendError {
    /// The client's outbound queue is at capacity
    #[error("Outbound queue full")]
    QueueFull,

    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,
}
