//! Per-connection reader and writer tasks

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::app::clients::OUTBOUND_QUEUE_CAPACITY;
use crate::app::{ClientHandle, GameServer};
use crate::game::PlayerId;

use super::protocol::{decode_line, ClientMsg};

/// Serve one accepted socket until it closes.
///
/// The player is spawned before the first line is read. Snapshots are
/// written by a separate task so a slow socket never stalls the reader.
pub async fn run_session(server: Arc<GameServer>, stream: TcpStream, addr: SocketAddr) {
    if let Err(e) = stream.set_nodelay(true) {
        warn!(addr = %addr, error = %e, "Failed to set TCP_NODELAY");
    }

    let (read_half, write_half) = stream.into_split();
    let (outbound_tx, outbound_rx) = mpsc::channel::<String>(OUTBOUND_QUEUE_CAPACITY);
    let (close_tx, close_rx) = watch::channel(false);

    // Dropping both halves closes the socket
    let Some(player_id) = server.join(ClientHandle::new(addr, outbound_tx, close_tx)) else {
        debug!(addr = %addr, "Rejecting connection during shutdown");
        return;
    };

    // Spawn writer task: outbound queue -> socket
    tokio::spawn(write_loop(server.clone(), player_id, write_half, outbound_rx));

    read_loop(&server, player_id, read_half, close_rx).await;

    server.disconnect(player_id);
}

/// Reader loop: socket -> roster
async fn read_loop(
    server: &GameServer,
    player_id: PlayerId,
    read_half: OwnedReadHalf,
    mut close_rx: watch::Receiver<bool>,
) {
    let mut lines = BufReader::new(read_half).lines();

    loop {
        tokio::select! {
            result = lines.next_line() => match result {
                Ok(Some(line)) => handle_line(server, player_id, &line),
                Ok(None) => {
                    debug!(player_id, "Client closed connection");
                    break;
                }
                Err(e) => {
                    debug!(player_id, error = %e, "Read failed");
                    break;
                }
            },
            _ = close_rx.changed() => {
                debug!(player_id, "Connection closed by server");
                break;
            }
        }
    }
}

fn handle_line(server: &GameServer, player_id: PlayerId, line: &str) {
    match decode_line(line) {
        Some(ClientMsg::Input(input)) => server.apply_input(player_id, &input),
        Some(ClientMsg::Unknown) => {}
        None => debug!(player_id, "Discarding malformed line"),
    }
}

/// Writer loop: outbound queue -> socket.
///
/// Ends when the queue closes (the client was disconnected) or a write
/// fails; either way the write half is dropped, which shuts the socket.
async fn write_loop(
    server: Arc<GameServer>,
    player_id: PlayerId,
    mut write_half: OwnedWriteHalf,
    mut outbound_rx: mpsc::Receiver<String>,
) {
    while let Some(line) = outbound_rx.recv().await {
        if let Err(e) = write_half.write_all(line.as_bytes()).await {
            debug!(player_id, error = %e, "Write failed");
            break;
        }
    }

    server.disconnect(player_id);
}
