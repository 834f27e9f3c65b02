//! Basic type definitions for the chat server
//!
//! - `ClientId`: UUID-based identity of one accepted connection
//! - `Line`: a rendered wire line, shared between history and every outbound queue

use std::sync::Arc;

use uuid::Uuid;

/// Unique connection identifier (newtype pattern)
///
/// Usernames can repeat over the lifetime of the server, so the registry
/// and the broadcast exclusion rule key on this instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub Uuid);

impl ClientId {
    /// Create a new random client ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A fully rendered line, newline included
pub type Line = Arc<str>;
