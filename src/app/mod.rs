//! Server wiring: shared state, connection registry and task startup

pub mod clients;
pub mod runtime;
pub mod state;

pub use clients::{ClientHandle, ClientRegistry};
pub use runtime::{start, ServerHandle};
pub use state::GameServer;
