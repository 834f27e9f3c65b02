//! Session handler
//!
//! Drives one connection through `Connecting → Active → Closed`:
//! banner and prompt, username handshake, history replay, then a read loop
//! feeding the coordinator while a write task drains the outbound queue.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::banner::Banner;
use crate::codec::{ChatLineCodec, Inbound};
use crate::coordinator::Event;
use crate::error::{AdmissionError, AppError};
use crate::message::Message;
use crate::types::{ClientId, Line};

/// Prompt sent after the banner
pub const PROMPT: &str = "[ENTER YOUR NAME]: ";

/// Longest accepted line in bytes, newline excluded
pub const MAX_LINE_LENGTH: usize = 4096;

type Lines = FramedRead<OwnedReadHalf, ChatLineCodec>;

/// Everything a session needs besides its socket
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub events: mpsc::Sender<Event>,
    pub banner: Arc<Banner>,
    pub idle_timeout: Option<Duration>,
    pub outbound_buffer: usize,
    pub shutdown: CancellationToken,
}

/// Handle a newly accepted connection until it closes
pub async fn handle_connection(stream: TcpStream, ctx: SessionContext) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    let client_id = ClientId::new();

    let (reader, mut writer) = stream.into_split();
    let mut lines = FramedRead::new(reader, ChatLineCodec::new(MAX_LINE_LENGTH));

    writer.write_all(ctx.banner.as_bytes()).await?;
    writer.write_all(PROMPT.as_bytes()).await?;

    let Some(candidate) = read_username(&mut lines, &ctx, client_id).await? else {
        debug!(client = %client_id, peer = %peer_addr, "Closed before sending a username");
        return Ok(());
    };

    let username = match validate_username(&candidate) {
        Ok(username) => username.to_string(),
        Err(rejection) => return reject(&mut writer, rejection).await,
    };

    let (outbound_tx, outbound_rx) = mpsc::channel(ctx.outbound_buffer);
    let history = match join(&ctx.events, client_id, &username, outbound_tx).await? {
        Ok(history) => history,
        Err(rejection) => return reject(&mut writer, rejection).await,
    };

    info!(client = %client_id, peer = %peer_addr, username, "Session active");

    // Active: from here on every path ends with a Leave
    if let Err(e) = write_lines(&mut writer, &history).await {
        warn!(client = %client_id, error = %e, "History replay failed");
    }
    let write_task = tokio::spawn(write_loop(writer, outbound_rx, client_id));

    read_loop(&mut lines, &ctx, client_id, &username).await;

    let _ = ctx
        .events
        .send(Event::Leave {
            client_id,
            username: username.clone(),
        })
        .await;

    // Ends once the coordinator drops this client's queue
    let _ = write_task.await;

    info!(client = %client_id, username, "Session closed");
    Ok(())
}

/// Trim the candidate and reject it if nothing is left
pub fn validate_username(candidate: &str) -> Result<&str, AdmissionError> {
    let username = candidate.trim();
    if username.is_empty() {
        return Err(AdmissionError::EmptyUsername);
    }
    Ok(username)
}

/// Build a chat message from a received line, or `None` for a blank line
pub fn chat_message(username: &str, line: String) -> Option<Message> {
    if line.trim().is_empty() {
        return None;
    }
    Some(Message::chat(username, line))
}

async fn read_username(
    lines: &mut Lines,
    ctx: &SessionContext,
    client_id: ClientId,
) -> Result<Option<String>, AppError> {
    tokio::select! {
        _ = ctx.shutdown.cancelled() => Ok(None),
        line = next_line(lines, ctx.idle_timeout, client_id) => line,
    }
}

async fn reject<W>(writer: &mut W, rejection: AdmissionError) -> Result<(), AppError>
where
    W: AsyncWrite + Unpin,
{
    info!(reason = %rejection, "Handshake rejected");
    writer.write_all(rejection.rejection_line().as_bytes()).await?;
    writer.shutdown().await?;
    Ok(())
}

async fn join(
    events: &mpsc::Sender<Event>,
    client_id: ClientId,
    username: &str,
    outbound: mpsc::Sender<Line>,
) -> Result<Result<Vec<Line>, AdmissionError>, AppError> {
    let (reply, reply_rx) = oneshot::channel();
    events
        .send(Event::Join {
            client_id,
            username: username.to_string(),
            outbound,
            reply,
        })
        .await
        .map_err(|_| AppError::ChannelSend)?;
    reply_rx.await.map_err(|_| AppError::ChannelSend)
}

async fn read_loop(lines: &mut Lines, ctx: &SessionContext, client_id: ClientId, username: &str) {
    loop {
        let next = tokio::select! {
            _ = ctx.shutdown.cancelled() => {
                debug!(client = %client_id, "Server shutting down");
                break;
            }
            next = next_line(lines, ctx.idle_timeout, client_id) => next,
        };

        match next {
            Ok(Some(line)) => {
                let Some(message) = chat_message(username, line) else {
                    continue;
                };
                // Blocks while the coordinator is behind; stalls only this client
                let event = Event::Chat { client_id, message };
                if ctx.events.send(event).await.is_err() {
                    debug!(client = %client_id, "Coordinator closed, ending read loop");
                    break;
                }
            }
            Ok(None) => {
                debug!(client = %client_id, "Client closed connection");
                break;
            }
            Err(e) => {
                info!(client = %client_id, error = %e, "Read failed");
                break;
            }
        }
    }
}

/// Next complete line; oversized lines are skipped here
async fn next_line(
    lines: &mut Lines,
    idle_timeout: Option<Duration>,
    client_id: ClientId,
) -> Result<Option<String>, AppError> {
    loop {
        let next = match idle_timeout {
            Some(limit) => tokio::time::timeout(limit, lines.next())
                .await
                .map_err(|_| AppError::IdleTimeout(limit))?,
            None => lines.next().await,
        };
        match next.transpose()? {
            Some(Inbound::Line(line)) => return Ok(Some(line)),
            Some(Inbound::Oversized) => {
                warn!(client = %client_id, max = MAX_LINE_LENGTH, "Discarding oversized line");
            }
            None => return Ok(None),
        }
    }
}

async fn write_lines<W>(writer: &mut W, lines: &[Line]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    for line in lines {
        writer.write_all(line.as_bytes()).await?;
    }
    Ok(())
}

async fn write_loop(
    mut writer: OwnedWriteHalf,
    mut outbound: mpsc::Receiver<Line>,
    client_id: ClientId,
) {
    while let Some(line) = outbound.recv().await {
        if let Err(e) = writer.write_all(line.as_bytes()).await {
            warn!(client = %client_id, error = %e, "Write failed");
        }
    }
    let _ = writer.shutdown().await;
    debug!(client = %client_id, "Write task ended");
}
