//! Chat message model and wire rendering
//!
//! Two line shapes go out on the wire:
//! - system announcements: `"<payload>\n"`
//! - user messages: `"[<YYYY-MM-DD HH:MM:SS>][<username>]: <payload>\n"`

use chrono::{Local, NaiveDateTime};

use crate::types::Line;

/// Timestamp layout used in rendered user lines
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Who produced a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Author {
    /// The "Server" pseudo-sender for join/leave announcements
    Server,
    /// A connected user
    User(String),
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub from: Author,
    pub payload: String,
    pub timestamp: NaiveDateTime,
}

impl Message {
    /// Create a user message stamped with the current local time
    pub fn chat(username: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::chat_at(username, payload, Local::now().naive_local())
    }

    /// Create a user message with an explicit timestamp
    pub fn chat_at(
        username: impl Into<String>,
        payload: impl Into<String>,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            from: Author::User(username.into()),
            payload: payload.into(),
            timestamp,
        }
    }

    /// Create a system announcement
    pub fn system(payload: impl Into<String>) -> Self {
        Self {
            from: Author::Server,
            payload: payload.into(),
            timestamp: Local::now().naive_local(),
        }
    }

    /// Announcement for a client that just became Active
    pub fn joined(username: &str) -> Self {
        Self::system(format!("{} has joined our chat...", username))
    }

    /// Announcement for a client that just closed
    pub fn left(username: &str) -> Self {
        Self::system(format!("{} has left our chat...", username))
    }

    /// Render to the exact bytes written to clients
    pub fn render(&self) -> Line {
        match &self.from {
            Author::Server => format!("{}\n", self.payload).into(),
            Author::User(username) => format!(
                "[{}][{}]: {}\n",
                self.timestamp.format(TIMESTAMP_FORMAT),
                username,
                self.payload
            )
            .into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn fixed_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 1)
            .unwrap()
    }

    #[test]
    fn test_render_user_message() {
        let msg = Message::chat_at("alice", "hello", fixed_time());
        assert_eq!(&*msg.render(), "[2024-03-07 09:05:01][alice]: hello\n");
    }

    #[test]
    fn test_render_system_message_has_no_prefix() {
        let msg = Message::joined("bob");
        assert_eq!(&*msg.render(), "bob has joined our chat...\n");

        let msg = Message::left("bob");
        assert_eq!(&*msg.render(), "bob has left our chat...\n");
    }

    #[test]
    fn test_user_named_server_is_still_a_user() {
        let msg = Message::chat_at("Server", "hi", fixed_time());
        assert_eq!(&*msg.render(), "[2024-03-07 09:05:01][Server]: hi\n");
    }
}
