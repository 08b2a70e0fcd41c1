//! Game simulation modules

pub mod arena;
pub mod combat;
pub mod physics;
pub mod player;
pub mod snapshot;
pub mod tick;

pub use arena::GameState;
pub use player::{InputSnapshot, Player, PlayerId, Team};
