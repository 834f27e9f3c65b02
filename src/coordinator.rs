//! Coordinator actor implementation
//!
//! The single owner of the registry and the history. Sessions reach it only
//! through the event channel, and it applies events one at a time in
//! arrival order, so the history is a total order of every join, leave and
//! chat across all sessions.

use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::broadcast::broadcast;
use crate::client::Client;
use crate::error::AdmissionError;
use crate::history::History;
use crate::message::Message;
use crate::registry::Registry;
use crate::types::{ClientId, Line};

/// Reply to a Join: the history to replay, or the reason for rejection
pub type JoinReply = Result<Vec<Line>, AdmissionError>;

/// Events sent from sessions to the coordinator
#[derive(Debug)]
pub enum Event {
    /// A handshake finished; register the client and announce it
    Join {
        client_id: ClientId,
        username: String,
        outbound: mpsc::Sender<Line>,
        reply: oneshot::Sender<JoinReply>,
    },
    /// A session's read loop ended
    Leave {
        client_id: ClientId,
        username: String,
    },
    /// A non-empty line from an Active client
    Chat {
        client_id: ClientId,
        message: Message,
    },
}

/// The coordinator actor
pub struct Coordinator {
    registry: Registry,
    history: History,
    /// Event receiver channel
    receiver: mpsc::Receiver<Event>,
    /// Number of Active clients
    active: watch::Sender<usize>,
}

impl Coordinator {
    pub fn new(
        receiver: mpsc::Receiver<Event>,
        max_clients: usize,
        history_limit: Option<usize>,
    ) -> Self {
        let (active, _) = watch::channel(0);
        Self {
            registry: Registry::new(max_clients),
            history: History::new(history_limit),
            receiver,
            active,
        }
    }

    /// Subscribe to the Active client count
    pub fn active_clients(&self) -> watch::Receiver<usize> {
        self.active.subscribe()
    }

    /// Run the event loop
    ///
    /// Stops when `shutdown` fires or every event sender is dropped. Dropping
    /// the registry on exit closes every outbound queue, which ends the
    /// sessions' write tasks.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(max_clients = self.registry.max_clients(), "Coordinator started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                event = self.receiver.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
            }
        }

        self.receiver.close();
        info!(
            clients = self.registry.len(),
            history = self.history.len(),
            "Coordinator shutting down"
        );
    }

    /// Process a single event
    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Join {
                client_id,
                username,
                outbound,
                reply,
            } => {
                self.handle_join(client_id, username, outbound, reply);
            }
            Event::Leave {
                client_id,
                username,
            } => {
                self.handle_leave(client_id, &username);
            }
            Event::Chat { client_id, message } => {
                self.handle_chat(client_id, message);
            }
        }
    }

    fn handle_join(
        &mut self,
        client_id: ClientId,
        username: String,
        outbound: mpsc::Sender<Line>,
        reply: oneshot::Sender<JoinReply>,
    ) {
        let client = Client::new(client_id, username.clone(), outbound);
        if let Err(rejection) = self.registry.register(client) {
            info!(client = %client_id, username, reason = %rejection, "Join rejected");
            let _ = reply.send(Err(rejection));
            return;
        }

        // Taken before the join line so the joiner does not see its own arrival
        let replay = self.history.snapshot();
        self.publish_active();

        let line = Message::joined(&username).render();
        self.history.push(line.clone());
        broadcast(&self.registry, &line, Some(client_id));

        info!(
            client = %client_id,
            username,
            active = self.registry.len(),
            "Client joined"
        );

        if reply.send(Ok(replay)).is_err() {
            debug!(client = %client_id, "Session vanished before join reply");
            self.handle_leave(client_id, &username);
        }
    }

    fn handle_leave(&mut self, client_id: ClientId, username: &str) {
        if self.registry.remove(client_id).is_none() {
            debug!(client = %client_id, "Leave for unregistered client ignored");
            return;
        }
        self.publish_active();

        let line = Message::left(username).render();
        self.history.push(line.clone());
        broadcast(&self.registry, &line, None);

        info!(
            client = %client_id,
            username,
            active = self.registry.len(),
            "Client left"
        );
    }

    fn handle_chat(&mut self, client_id: ClientId, message: Message) {
        if self.registry.get(client_id).is_none() {
            debug!(client = %client_id, "Chat from unregistered client ignored");
            return;
        }

        let line = message.render();
        self.history.push(line.clone());
        let delivered = broadcast(&self.registry, &line, Some(client_id));
        debug!(client = %client_id, delivered, "Chat broadcast");
    }

    fn publish_active(&self) {
        self.active.send_replace(self.registry.len());
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;

    struct Harness {
        events: mpsc::Sender<Event>,
        active: watch::Receiver<usize>,
        shutdown: CancellationToken,
        task: tokio::task::JoinHandle<()>,
    }

    fn start(max_clients: usize) -> Harness {
        let (events, receiver) = mpsc::channel(16);
        let coordinator = Coordinator::new(receiver, max_clients, None);
        let active = coordinator.active_clients();
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(coordinator.run(shutdown.clone()));
        Harness {
            events,
            active,
            shutdown,
            task,
        }
    }

    async fn join(
        events: &mpsc::Sender<Event>,
        name: &str,
    ) -> (ClientId, JoinReply, mpsc::Receiver<Line>) {
        let client_id = ClientId::new();
        let (outbound, rx) = mpsc::channel(16);
        let (reply, reply_rx) = oneshot::channel();
        events
            .send(Event::Join {
                client_id,
                username: name.to_string(),
                outbound,
                reply,
            })
            .await
            .unwrap();
        (client_id, reply_rx.await.unwrap(), rx)
    }

    async fn next(rx: &mut mpsc::Receiver<Line>) -> String {
        timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for line")
            .expect("queue closed")
            .to_string()
    }

    #[tokio::test]
    async fn test_join_replays_history_and_announces_to_others() {
        let h = start(10);

        let (_alice, reply, mut alice_rx) = join(&h.events, "alice").await;
        assert_eq!(reply.unwrap(), Vec::<Line>::new());

        let (_bob, reply, mut bob_rx) = join(&h.events, "bob").await;
        let replay: Vec<String> = reply.unwrap().iter().map(|l| l.to_string()).collect();
        assert_eq!(replay, vec!["alice has joined our chat...\n"]);

        assert_eq!(next(&mut alice_rx).await, "bob has joined our chat...\n");
        assert!(bob_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let h = start(10);
        let (_alice, reply, _rx) = join(&h.events, "alice").await;
        assert!(reply.is_ok());

        let (_other, reply, _rx2) = join(&h.events, "alice").await;
        assert_eq!(reply, Err(AdmissionError::UsernameTaken));
    }

    #[tokio::test]
    async fn test_capacity_rejects_extra_join() {
        let mut h = start(2);
        let (_a, r1, _rx1) = join(&h.events, "a").await;
        let (_b, r2, _rx2) = join(&h.events, "b").await;
        let (_c, r3, _rx3) = join(&h.events, "c").await;

        assert!(r1.is_ok());
        assert!(r2.is_ok());
        assert_eq!(r3, Err(AdmissionError::ServerFull));
        assert_eq!(*h.active.borrow_and_update(), 2);
    }

    #[tokio::test]
    async fn test_chat_excludes_sender() {
        let h = start(10);
        let (alice, _, mut alice_rx) = join(&h.events, "alice").await;
        let (_bob, _, mut bob_rx) = join(&h.events, "bob").await;
        assert_eq!(next(&mut alice_rx).await, "bob has joined our chat...\n");

        h.events
            .send(Event::Chat {
                client_id: alice,
                message: Message::chat("alice", "hello"),
            })
            .await
            .unwrap();

        let line = next(&mut bob_rx).await;
        assert!(line.ends_with("][alice]: hello\n"));
        assert!(alice_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_leave_is_applied_once() {
        let mut h = start(10);
        let (alice, _, _alice_rx) = join(&h.events, "alice").await;
        let (_bob, _, mut bob_rx) = join(&h.events, "bob").await;

        for _ in 0..2 {
            h.events
                .send(Event::Leave {
                    client_id: alice,
                    username: "alice".to_string(),
                })
                .await
                .unwrap();
        }

        // A later chat proves both leaves were processed
        let (carol, _, _carol_rx) = join(&h.events, "carol").await;
        h.events
            .send(Event::Chat {
                client_id: carol,
                message: Message::chat("carol", "hi"),
            })
            .await
            .unwrap();

        assert_eq!(next(&mut bob_rx).await, "alice has left our chat...\n");
        assert_eq!(next(&mut bob_rx).await, "carol has joined our chat...\n");
        assert!(next(&mut bob_rx).await.ends_with("][carol]: hi\n"));
        assert_eq!(*h.active.borrow_and_update(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_joiners_see_consistent_prefixes() {
        let h = start(10);
        let (alice, _, _alice_rx) = join(&h.events, "alice").await;
        for i in 0..5 {
            h.events
                .send(Event::Chat {
                    client_id: alice,
                    message: Message::chat("alice", format!("m{}", i)),
                })
                .await
                .unwrap();
        }

        let (_, first, _rx1) = join(&h.events, "first").await;
        let (_, second, _rx2) = join(&h.events, "second").await;
        let first = first.unwrap();
        let second = second.unwrap();

        assert_eq!(first.len(), 6);
        assert_eq!(&second[..first.len()], &first[..]);
        assert_eq!(&*second[6], "first has joined our chat...\n");
    }

    #[tokio::test]
    async fn test_shutdown_stops_loop_and_closes_queues() {
        let h = start(10);
        let (_alice, _, mut alice_rx) = join(&h.events, "alice").await;

        h.shutdown.cancel();
        timeout(Duration::from_secs(1), h.task)
            .await
            .unwrap()
            .unwrap();

        assert!(alice_rx.recv().await.is_none());
        assert!(h.events.is_closed());
    }
}
