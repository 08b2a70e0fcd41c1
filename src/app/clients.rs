//! Registry of live connections and their outbound queues

use dashmap::DashMap;
use std::net::SocketAddr;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::game::PlayerId;
use crate::net::protocol::{encode_line, ServerMsg, WorldSnapshot};

/// Frames buffered per client before snapshots start being dropped
pub const OUTBOUND_QUEUE_CAPACITY: usize = 64;

/// Handle for routing frames to one connection
#[derive(Debug)]
pub struct ClientHandle {
    pub addr: SocketAddr,
    /// Drained by the connection's writer task
    outbound: mpsc::Sender<String>,
    /// Flipped to `true` to stop the connection's reader task
    close_tx: watch::Sender<bool>,
}

impl ClientHandle {
    pub fn new(addr: SocketAddr, outbound: mpsc::Sender<String>, close_tx: watch::Sender<bool>) -> Self {
        Self {
            addr,
            outbound,
            close_tx,
        }
    }

    pub fn try_send(&self, line: String) -> Result<(), TrySendError<String>> {
        self.outbound.try_send(line)
    }

    /// Signal the reader task to stop. Dropping the handle afterwards closes
    /// the outbound queue, which ends the writer task and the socket.
    pub fn close(&self) {
        self.close_tx.send_replace(true);
    }
}

/// Outcome of one broadcast
#[derive(Debug, Default)]
pub struct BroadcastReport {
    pub sent: usize,
    pub bytes: usize,
    /// Clients whose queue was full; they skip this snapshot. Hit lists
    /// are drained when the snapshot is built, so a skipped snapshot loses
    /// that client's hit confirmations for the tick. Positions, health and
    /// scores are resent in full by the next snapshot.
    pub dropped: usize,
    /// Clients whose writer is gone; they must be disconnected
    pub broken: Vec<PlayerId>,
}

/// Registry of all connected clients
pub struct ClientRegistry {
    clients: DashMap<PlayerId, ClientHandle>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self {
            clients: DashMap::new(),
        }
    }

    pub fn insert(&self, id: PlayerId, handle: ClientHandle) {
        self.clients.insert(id, handle);
    }

    pub fn remove(&self, id: PlayerId) -> Option<ClientHandle> {
        self.clients.remove(&id).map(|(_, handle)| handle)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn ids(&self) -> Vec<PlayerId> {
        self.clients.iter().map(|entry| *entry.key()).collect()
    }

    /// Queue a personalised copy of `world` for every client.
    ///
    /// Never blocks and never removes entries; failed clients are reported
    /// back so the caller can disconnect them after iteration.
    pub fn broadcast(&self, world: &WorldSnapshot) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        for entry in self.clients.iter() {
            let player_id = *entry.key();
            let line = match encode_line(&ServerMsg::State {
                your_id: player_id,
                world,
            }) {
                Ok(line) => line,
                Err(e) => {
                    warn!(player_id, error = %e, "Failed to encode snapshot");
                    continue;
                }
            };
            let len = line.len();

            match entry.value().try_send(line) {
                Ok(()) => {
                    report.sent += 1;
                    report.bytes += len;
                }
                Err(TrySendError::Full(_)) => {
                    debug!(player_id, "Outbound queue full, skipping snapshot");
                    report.dropped += 1;
                }
                Err(TrySendError::Closed(_)) => {
                    report.broken.push(player_id);
                }
            }
        }

        report
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}
