//! Per-connection player simulation state

use std::fmt;

use crate::util::geometry::{is_zero, normalize};

use super::combat::{CombatSystem, RESPAWN_DELAY_SEC, SHOT_COOLDOWN_SEC};

/// Player identity, assigned monotonically at connect time
pub type PlayerId = u32;

/// Full health
pub const MAX_HEALTH: i32 = 100;

/// The two teams, in join alternation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Team {
    Green,
    Orange,
}

impl Team {
    /// Wire index (0 or 1)
    pub fn index(self) -> u8 {
        match self {
            Team::Green => 0,
            Team::Orange => 1,
        }
    }

    pub fn other(self) -> Self {
        match self {
            Team::Green => Team::Orange,
            Team::Orange => Team::Green,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::Green => f.write_str("GREEN"),
            Team::Orange => f.write_str("ORANGE"),
        }
    }
}

/// Latest input received from the client, replaced wholesale on every message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub shoot: bool,
}

/// Player state (authoritative)
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub team: Team,

    // Position and facing
    pub x: f32,
    pub y: f32,
    /// Facing / aim angle in degrees
    pub angle: f32,
    /// Last non-zero movement direction
    pub last_move_dir: (f32, f32),

    // Vitals
    pub health: i32,
    pub alive: bool,
    pub respawn_at: Option<f64>,

    pub input: InputSnapshot,

    // Combat bookkeeping
    last_shot_at: Option<f64>,
    /// Victims hit since the last broadcast
    pub hits: Vec<PlayerId>,
    pub kills: u32,
}

impl Player {
    pub fn new(id: PlayerId, team: Team, x: f32, y: f32) -> Self {
        Self {
            id,
            team,
            x,
            y,
            angle: 0.0,
            last_move_dir: (1.0, 0.0),
            health: MAX_HEALTH,
            alive: true,
            respawn_at: None,
            input: InputSnapshot::default(),
            last_shot_at: None,
            hits: Vec::new(),
            kills: 0,
        }
    }

    /// Replace the input snapshot. A missing angle keeps the current facing.
    pub fn apply_input(&mut self, input: InputSnapshot, angle: Option<f32>) {
        self.input = input;
        if let Some(angle) = angle.filter(|a| a.is_finite()) {
            self.angle = angle;
        }
    }

    /// Unit movement vector from the directional keys, `(0, 0)` when idle
    pub fn move_direction(&self) -> (f32, f32) {
        let mut dx = 0.0;
        let mut dy = 0.0;
        if self.input.left {
            dx -= 1.0;
        }
        if self.input.right {
            dx += 1.0;
        }
        if self.input.up {
            dy -= 1.0;
        }
        if self.input.down {
            dy += 1.0;
        }
        normalize(dx, dy)
    }

    /// Remember `dir` as the last movement direction unless it is zero
    pub fn record_move_direction(&mut self, dir: (f32, f32)) {
        if !is_zero(dir) {
            self.last_move_dir = dir;
        }
    }

    /// Fire-rate gate. Consumes the cooldown and returns true only if the
    /// player is alive and the cooldown has elapsed.
    pub fn try_consume_shot(&mut self, now: f64) -> bool {
        if !self.alive {
            return false;
        }
        let ready = self
            .last_shot_at
            .map_or(true, |last| now - last >= SHOT_COOLDOWN_SEC);
        if ready {
            self.last_shot_at = Some(now);
        }
        ready
    }

    pub fn last_shot_at(&self) -> Option<f64> {
        self.last_shot_at
    }

    /// Apply `damage`, returns true if this hit killed the player
    pub fn take_damage(&mut self, damage: i32, now: f64) -> bool {
        if !self.alive {
            return false;
        }
        let (new_health, killed) = CombatSystem::apply_damage(self.health, damage);
        self.health = new_health;
        if killed {
            self.alive = false;
            self.respawn_at = Some(now + RESPAWN_DELAY_SEC);
        }
        killed
    }

    pub fn respawn_due(&self, now: f64) -> bool {
        !self.alive && self.respawn_at.is_some_and(|at| now >= at)
    }

    pub fn respawn(&mut self, x: f32, y: f32) {
        self.alive = true;
        self.health = MAX_HEALTH;
        self.respawn_at = None;
        self.x = x;
        self.y = y;
    }
}
