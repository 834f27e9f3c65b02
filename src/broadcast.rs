//! Fan-out of rendered lines to registered clients

use tracing::{debug, warn};

use crate::error::SendError;
use crate::registry::Registry;
use crate::types::{ClientId, Line};

/// Deliver `line` to every registered client except `exclude`
///
/// A failed delivery is logged and skipped. It never removes the client:
/// only the session's read loop decides that a client is gone.
/// Returns the number of clients the line was queued for.
pub fn broadcast(registry: &Registry, line: &Line, exclude: Option<ClientId>) -> usize {
    let mut delivered = 0;

    for client in registry.clients() {
        if Some(client.id) == exclude {
            continue;
        }
        match client.deliver(line.clone()) {
            Ok(()) => delivered += 1,
            Err(SendError::QueueFull) => {
                warn!(
                    client = %client.id,
                    username = %client.username,
                    "Outbound queue full, dropping line"
                );
            }
            Err(SendError::ChannelClosed) => {
                debug!(
                    client = %client.id,
                    username = %client.username,
                    "Write task already gone, skipping"
                );
            }
        }
    }

    delivered
}
