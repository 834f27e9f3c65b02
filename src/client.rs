//! Client struct definition
//!
//! A registered (Active) connection as the coordinator sees it.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::SendError;
use crate::types::{ClientId, Line};

/// Registered client information
///
/// Holds the connection identity, the username chosen during the
/// handshake, and the sending half of the session's outbound queue.
#[derive(Debug)]
pub struct Client {
    /// Unique identifier for this connection
    pub id: ClientId,
    /// Username, unique among Active clients
    pub username: String,
    /// Coordinator → session write task
    pub outbound: mpsc::Sender<Line>,
}

impl Client {
    pub fn new(id: ClientId, username: String, outbound: mpsc::Sender<Line>) -> Self {
        Self {
            id,
            username,
            outbound,
        }
    }

    /// Queue a line for this client without waiting
    ///
    /// The coordinator must never stall behind one slow socket, so a full
    /// queue is reported as a failure instead of awaited.
    pub fn deliver(&self, line: Line) -> Result<(), SendError> {
        self.outbound.try_send(line).map_err(|err| match err {
            TrySendError::Full(_) => SendError::QueueFull,
            TrySendError::Closed(_) => SendError::ChannelClosed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deliver_queues_line() {
        let (tx, mut rx) = mpsc::channel(4);
        let client = Client::new(ClientId::new(), "alice".to_string(), tx);

        client.deliver(Line::from("hi\n")).unwrap();

        assert_eq!(&*rx.recv().await.unwrap(), "hi\n");
    }

    #[tokio::test]
    async fn test_deliver_to_closed_queue() {
        let (tx, rx) = mpsc::channel(4);
        let client = Client::new(ClientId::new(), "alice".to_string(), tx);
        drop(rx);

        assert!(matches!(
            client.deliver(Line::from("hi\n")),
            Err(SendError::ChannelClosed)
        ));
    }

    #[tokio::test]
    async fn test_deliver_to_full_queue() {
        let (tx, _rx) = mpsc::channel(1);
        let client = Client::new(ClientId::new(), "alice".to_string(), tx);

        client.deliver(Line::from("one\n")).unwrap();

        assert!(matches!(
            client.deliver(Line::from("two\n")),
            Err(SendError::QueueFull)
        ));
    }
}
