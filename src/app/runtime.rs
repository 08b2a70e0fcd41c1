//! Server startup and shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::Config;
use crate::game::physics::{WORLD_HEIGHT, WORLD_WIDTH};
use crate::game::tick::run_tick_loop;
use crate::net::{Listener, ServerError};

use super::GameServer;

/// A running server: the listener and tick tasks plus the shared state
pub struct ServerHandle {
    pub server: Arc<GameServer>,
    pub local_addr: SocketAddr,
    listener_task: JoinHandle<()>,
    tick_task: JoinHandle<()>,
}

/// Bind the listening socket and spawn the accept loop and the tick loop
pub async fn start(config: Config) -> Result<ServerHandle, ServerError> {
    let server = Arc::new(GameServer::new(config));

    let listener = Listener::bind(server.clone()).await?;
    let local_addr = listener.local_addr()?;

    info!(addr = %local_addr, "Server listening");
    info!(
        width = WORLD_WIDTH,
        height = WORLD_HEIGHT,
        win_score = server.config.rules.win_score,
        hit_range = server.config.rules.hit_range,
        "Arena ready"
    );

    let listener_task = tokio::spawn(listener.run());
    let tick_task = tokio::spawn(run_tick_loop(server.clone()));

    Ok(ServerHandle {
        server,
        local_addr,
        listener_task,
        tick_task,
    })
}

impl ServerHandle {
    /// Close the listener and every client socket, then wait for the
    /// background tasks to finish
    pub async fn shutdown(self) {
        self.server.shutdown();

        if let Err(e) = self.listener_task.await {
            warn!(error = %e, "Listener task panicked");
        }
        if let Err(e) = self.tick_task.await {
            warn!(error = %e, "Tick task panicked");
        }
    }
}
