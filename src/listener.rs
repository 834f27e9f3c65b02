//! Listener and admission
//!
//! Binds the endpoint, starts the coordinator, and accepts connections
//! only while a slot is free. A slot is taken on accept and held by the
//! session until it closes, so handshakes in progress count against the
//! maximum too. At capacity the accept loop waits instead of accepting and
//! rejecting.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch, AcquireError, OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::banner::Banner;
use crate::config::ServerConfig;
use crate::coordinator::{Coordinator, Event};
use crate::error::AppError;
use crate::handler::{handle_connection, SessionContext};

/// A bound chat server, ready to run
pub struct ChatServer {
    listener: TcpListener,
    config: ServerConfig,
    banner: Arc<Banner>,
    coordinator: Coordinator,
    events: mpsc::Sender<Event>,
}

impl ChatServer {
    /// Bind the configured address
    pub async fn bind(config: ServerConfig, banner: Banner) -> Result<Self, AppError> {
        let listener = TcpListener::bind(config.addr)
            .await
            .map_err(|source| AppError::Bind {
                addr: config.addr,
                source,
            })?;
        let (events, receiver) = mpsc::channel(config.event_buffer);
        let coordinator = Coordinator::new(receiver, config.max_clients, config.history_limit);
        Ok(Self {
            listener,
            config,
            banner: Arc::new(banner),
            coordinator,
            events,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Number of Active sessions, updated after every join and leave
    pub fn active_clients(&self) -> watch::Receiver<usize> {
        self.coordinator.active_clients()
    }

    /// Serve until `shutdown` completes
    ///
    /// On shutdown the accept loop stops, the coordinator exits, and every
    /// session is cancelled.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), AppError>
    where
        F: Future<Output = ()> + Send,
    {
        let ChatServer {
            listener,
            config,
            banner,
            coordinator,
            events,
        } = self;

        let slots = Arc::new(Semaphore::new(config.max_clients));
        let token = CancellationToken::new();
        let coordinator_task = tokio::spawn(coordinator.run(token.clone()));

        let ctx = SessionContext {
            events,
            banner,
            idle_timeout: config.idle_timeout,
            outbound_buffer: config.outbound_buffer,
            shutdown: token.clone(),
        };

        info!(addr = %listener.local_addr()?, max_clients = config.max_clients, "Listening");

        tokio::pin!(shutdown);
        loop {
            let slot = tokio::select! {
                _ = &mut shutdown => break,
                slot = acquire_slot(&slots) => match slot {
                    Ok(slot) => slot,
                    Err(_) => break,
                },
            };

            tokio::select! {
                _ = &mut shutdown => break,
                accepted = listener.accept() => handle_accept_result(accepted, &ctx, slot),
            }
        }

        info!("Shutting down");
        token.cancel();
        drop(ctx);
        if let Err(e) = coordinator_task.await {
            error!("Coordinator task failed: {}", e);
        }

        Ok(())
    }

    /// Serve until Ctrl-C
    pub async fn run_until_ctrl_c(self) -> Result<(), AppError> {
        self.run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = %err, "Failed to install Ctrl-C handler");
                std::future::pending::<()>().await;
            }
        })
        .await
    }
}

/// Wait for a free session slot
async fn acquire_slot(slots: &Arc<Semaphore>) -> Result<OwnedSemaphorePermit, AcquireError> {
    if slots.available_permits() == 0 {
        debug!("At capacity, waiting for a free slot");
    }
    Arc::clone(slots).acquire_owned().await
}

fn handle_accept_result(
    result: std::io::Result<(TcpStream, SocketAddr)>,
    ctx: &SessionContext,
    slot: OwnedSemaphorePermit,
) {
    match result {
        Ok((stream, peer)) => {
            info!(peer = %peer, "New connection");
            let ctx = ctx.clone();
            tokio::spawn(async move {
                // Released when the session ends, whatever the outcome
                let _slot = slot;
                if let Err(e) = handle_connection(stream, ctx).await {
                    warn!(peer = %peer, error = %e, "Connection closed with error");
                }
            });
        }
        Err(e) => {
            error!("Failed to accept connection: {}", e);
        }
    }
}
