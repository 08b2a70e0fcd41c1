//! Snapshot building for network transmission

use crate::net::protocol::{MapInfo, PlayerSnapshot, TeamScores, WorldSnapshot};

use super::arena::GameState;
use super::physics::{WORLD_HEIGHT, WORLD_WIDTH};
use super::player::Team;

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn round2(value: f32) -> f32 {
    round_to(value as f64, 2) as f32
}

/// Builds snapshots for network transmission
pub struct SnapshotBuilder;

impl SnapshotBuilder {
    /// Pack the roster and scores at server time `now`.
    ///
    /// Every player's hit list is moved into the snapshot and left empty,
    /// so each hit is reported exactly once.
    pub fn build(state: &mut GameState, now: f64) -> WorldSnapshot {
        let scores = TeamScores {
            green: state.score(Team::Green),
            orange: state.score(Team::Orange),
        };
        let winner_team = state.winner().map(Team::index);

        let players = state
            .players
            .values_mut()
            .map(|p| PlayerSnapshot {
                id: p.id,
                team: p.team.index(),
                x: round2(p.x),
                y: round2(p.y),
                angle: round2(p.angle),
                alive: p.alive,
                health: p.health,
                kills: p.kills,
                is_shooting: p.input.shoot,
                keys: p.input.into(),
                hits: std::mem::take(&mut p.hits),
            })
            .collect();

        WorldSnapshot {
            t: round_to(now, 3),
            map: MapInfo {
                width: WORLD_WIDTH,
                height: WORLD_HEIGHT,
            },
            players,
            scores,
            game_won: winner_team.is_some(),
            winner_team,
        }
    }
}

/// Snapshot traffic stats for debugging
#[derive(Debug, Default)]
pub struct SnapshotStats {
    pub total_snapshots: u64,
    pub total_bytes: u64,
    /// Shots that landed, across all fixed-update passes
    pub total_hits: u64,
    pub avg_players_per_snapshot: f32,
}

impl SnapshotStats {
    pub fn record(&mut self, player_count: usize, bytes: usize) {
        self.total_snapshots += 1;
        self.total_bytes += bytes as u64;

        // Running average
        let n = self.total_snapshots as f32;
        self.avg_players_per_snapshot =
            self.avg_players_per_snapshot * ((n - 1.0) / n) + (player_count as f32 / n);
    }

    pub fn record_hits(&mut self, hits: u32) {
        self.total_hits += u64::from(hits);
    }

    pub fn avg_bytes(&self) -> u64 {
        self.total_bytes.checked_div(self.total_snapshots).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameRules;
    use crate::game::player::InputSnapshot;
    use assert_approx_eq::assert_approx_eq;

    fn state() -> GameState {
        GameState::new(&GameRules {
            spawn_seed: Some(3),
            ..GameRules::default()
        })
    }

    #[test]
    fn test_build_packs_roster_and_scores() {
        let mut state = state();
        state.add_player(1);
        state.add_player(2);
        state.apply_input(
            2,
            InputSnapshot {
                up: true,
                right: true,
                shoot: true,
                ..Default::default()
            },
            Some(123.456),
        );

        let snapshot = SnapshotBuilder::build(&mut state, 12.34567);
        assert_eq!(snapshot.t, 12.346);
        assert_eq!(snapshot.players.len(), 2);
        assert_eq!(snapshot.players[0].id, 1);
        assert_eq!(snapshot.players[0].team, 0);
        assert_eq!(snapshot.players[1].team, 1);
        assert_eq!(snapshot.scores, TeamScores::default());
        assert!(!snapshot.game_won);
        assert_eq!(snapshot.winner_team, None);

        let p2 = &snapshot.players[1];
        assert!(p2.is_shooting);
        assert!(p2.keys.w && p2.keys.d && !p2.keys.a && !p2.keys.s);
        assert_approx_eq!(p2.angle, 123.46, 1e-4);
    }

    #[test]
    fn test_hits_are_consumed_once() {
        let mut state = state();
        state.add_player(1);
        state.add_player(2);
        state.player_mut(1).unwrap().hits.push(2);

        let first = SnapshotBuilder::build(&mut state, 0.0);
        assert_eq!(first.players[0].hits, vec![2]);
        assert!(state.player(1).unwrap().hits.is_empty());

        let second = SnapshotBuilder::build(&mut state, 0.1);
        assert!(second.players[0].hits.is_empty());
    }

    #[test]
    fn test_snapshot_stats() {
        let mut stats = SnapshotStats::default();
        assert_eq!(stats.avg_bytes(), 0);
        stats.record(2, 100);
        stats.record(4, 300);
        assert_eq!(stats.total_snapshots, 2);
        assert_eq!(stats.avg_bytes(), 200);
        assert_approx_eq!(stats.avg_players_per_snapshot, 3.0, 1e-5);

        stats.record_hits(2);
        stats.record_hits(0);
        assert_eq!(stats.total_hits, 2);
    }
}
