//! Laser Tag Server - authoritative two-team arena shooter over TCP
//!
//! Clients connect over plain TCP and exchange newline-delimited JSON. The
//! server owns the simulation: it accepts key/aim inputs, runs a fixed-step
//! tick loop (movement, hitscan combat, respawns, scoring) and streams a
//! personalised world snapshot to every client.

pub mod app;
pub mod config;
pub mod game;
pub mod net;
pub mod util;
