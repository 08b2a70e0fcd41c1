//! Server state shared by the listener, connection and tick tasks

use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use crate::config::Config;
use crate::game::{GameState, PlayerId};
use crate::net::protocol::InputMsg;
use crate::util::time::ServerClock;

use super::clients::{ClientHandle, ClientRegistry};

/// The match server.
///
/// Holds the single lock around the roster and scores, plus the registry of
/// live connections. Lock hold times are one input apply or one
/// fixed-update pass; network I/O never happens under the lock.
pub struct GameServer {
    pub config: Arc<Config>,
    game: Mutex<GameState>,
    clients: ClientRegistry,
    next_player_id: AtomicU32,
    clock: ServerClock,
    shutdown_tx: watch::Sender<bool>,
}

impl GameServer {
    pub fn new(config: Config) -> Self {
        let game = GameState::new(&config.rules);
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            config: Arc::new(config),
            game: Mutex::new(game),
            clients: ClientRegistry::new(),
            next_player_id: AtomicU32::new(1),
            clock: ServerClock::new(),
            shutdown_tx,
        }
    }

    /// Lock the roster
    pub fn game(&self) -> MutexGuard<'_, GameState> {
        self.game.lock()
    }

    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    pub fn clock(&self) -> &ServerClock {
        &self.clock
    }

    fn allocate_player_id(&self) -> PlayerId {
        self.next_player_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Register a new connection: spawn its player and start routing
    /// snapshots to it. Returns the new player's id, or `None` once
    /// shutdown has been signalled.
    pub fn join(&self, handle: ClientHandle) -> Option<PlayerId> {
        if self.is_shutting_down() {
            return None;
        }

        let player_id = self.allocate_player_id();
        let addr = handle.addr;

        let team = self.game().add_player(player_id).team;
        self.clients.insert(player_id, handle);

        // Shutdown may have swept the registry between the check above and
        // the insert
        if self.is_shutting_down() {
            self.disconnect(player_id);
            return None;
        }

        info!(player_id, team = %team, addr = %addr, "Player joined");
        Some(player_id)
    }

    /// Overwrite the player's inputs with the decoded message
    pub fn apply_input(&self, player_id: PlayerId, input: &InputMsg) {
        self.game()
            .apply_input(player_id, input.keys(), input.aim_angle());
    }

    /// Tear down a connection and its player. Safe to call repeatedly and
    /// from both the reader and the broadcaster; later calls are no-ops.
    pub fn disconnect(&self, player_id: PlayerId) {
        let handle = self.clients.remove(player_id);
        let removed = self.game().remove_player(player_id);

        if let Some(handle) = &handle {
            handle.close();
        }

        if handle.is_some() || removed {
            info!(player_id, "Player disconnected");
        }
    }

    /// Stop the listener and tick loop and drop every connection
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
        for player_id in self.clients.ids() {
            self.disconnect(player_id);
        }
        info!(uptime_secs = self.clock.uptime_secs(), "Server shut down");
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    pub fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }
}
