//! TCP listener: binds the game port and spawns a session per client

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::app::GameServer;

use super::handler::run_session;

/// Back-off after a failed accept (e.g. out of file descriptors)
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(10);

/// Startup errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read local address: {0}")]
    LocalAddr(#[source] io::Error),
}

pub struct Listener {
    listener: TcpListener,
    server: Arc<GameServer>,
}

impl Listener {
    /// Bind the configured address. Failure here is fatal.
    pub async fn bind(server: Arc<GameServer>) -> Result<Self, ServerError> {
        let addr = server.config.server_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        Ok(Self { listener, server })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.listener.local_addr().map_err(ServerError::LocalAddr)
    }

    /// Accept connections until the server shuts down
    pub async fn run(self) {
        let mut shutdown = self.server.subscribe_shutdown();

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        tokio::spawn(run_session(self.server.clone(), stream, addr));
                    }
                    Err(e) => {
                        warn!(error = %e, "Accept failed");
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                },
                _ = shutdown.changed() => break,
            }
        }

        info!("Listener stopped");
    }
}
