//! Match state and the authoritative fixed-update pass

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::config::GameRules;
use crate::util::time::tick_delta;

use super::combat::CombatSystem;
use super::physics::{PhysicsSystem, PLAYER_RADIUS};
use super::player::{InputSnapshot, Player, PlayerId, Team};

/// Roster and scores for one match.
///
/// Keyed by player id; ids are allocated monotonically, so iteration order
/// is join order.
pub struct GameState {
    pub players: BTreeMap<PlayerId, Player>,
    scores: [u32; 2],
    next_team: Team,
    combat: CombatSystem,
    win_score: u32,
    winner: Option<Team>,
    rng: ChaCha8Rng,
    dt: f32,
}

impl GameState {
    pub fn new(rules: &GameRules) -> Self {
        let seed = rules.spawn_seed.unwrap_or_else(rand::random::<u64>);
        Self {
            players: BTreeMap::new(),
            scores: [0, 0],
            next_team: Team::Green,
            combat: CombatSystem::new(rules.hit_range),
            win_score: rules.win_score,
            winner: None,
            rng: ChaCha8Rng::seed_from_u64(seed),
            dt: tick_delta(rules.tick_rate_hz) as f32,
        }
    }

    /// Add a freshly connected player on the next team in the alternation
    pub fn add_player(&mut self, id: PlayerId) -> &Player {
        let team = self.next_team;
        self.next_team = team.other();

        let (x, y) = PhysicsSystem::spawn_point(team, &mut self.rng);
        info!(player_id = id, team = %team, x, y, "Player added");
        self.players
            .entry(id)
            .or_insert_with(|| Player::new(id, team, x, y))
    }

    /// Remove a player. Team alternation is not rebalanced.
    /// Returns false if the player was already gone.
    pub fn remove_player(&mut self, id: PlayerId) -> bool {
        self.players.remove(&id).is_some()
    }

    /// Overwrite a player's input snapshot
    pub fn apply_input(&mut self, id: PlayerId, input: InputSnapshot, angle: Option<f32>) -> bool {
        match self.players.get_mut(&id) {
            Some(player) => {
                player.apply_input(input, angle);
                true
            }
            None => false,
        }
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn score(&self, team: Team) -> u32 {
        self.scores[team.index() as usize]
    }

    pub fn winner(&self) -> Option<Team> {
        self.winner
    }

    /// Fixed step length in seconds
    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Run one fixed simulation step at server time `now`.
    ///
    /// Respawns first, then every alive player moves, then shots are
    /// resolved against the moved positions. Returns the number of hits.
    pub fn fixed_update(&mut self, now: f64) -> u32 {
        self.check_win_condition();
        self.update_respawns(now);
        self.update_movement();
        self.update_combat(now)
    }

    fn check_win_condition(&mut self) {
        if self.winner.is_some() {
            return;
        }
        for team in [Team::Green, Team::Orange] {
            if self.score(team) >= self.win_score {
                self.winner = Some(team);
                info!(
                    team = %team,
                    score_green = self.score(Team::Green),
                    score_orange = self.score(Team::Orange),
                    "Team wins!"
                );
                return;
            }
        }
    }

    fn update_respawns(&mut self, now: f64) {
        for player in self.players.values_mut() {
            if player.respawn_due(now) {
                let (x, y) = PhysicsSystem::spawn_point(player.team, &mut self.rng);
                player.respawn(x, y);
                info!(player_id = player.id, "Player respawned");
            }
        }
    }

    fn update_movement(&mut self) {
        let dt = self.dt;
        for player in self.players.values_mut() {
            if !player.alive {
                continue;
            }

            let dir = player.move_direction();
            player.record_move_direction(dir);

            let (new_x, new_y) = PhysicsSystem::integrate(player.x, player.y, dir, dt);
            player.x = new_x;
            player.y = new_y;
        }
    }

    /// Resolve every due shot in roster order
    fn update_combat(&mut self, now: f64) -> u32 {
        let mut hits = 0;
        let shooter_ids: Vec<PlayerId> = self.players.keys().copied().collect();

        for shooter_id in shooter_ids {
            let fired = match self.players.get_mut(&shooter_id) {
                Some(shooter) => shooter.input.shoot && shooter.try_consume_shot(now),
                None => false,
            };
            if !fired {
                continue;
            }

            let Some(shooter) = self.players.get(&shooter_id) else {
                continue;
            };
            let shooter_team = shooter.team;
            let Some((target_id, distance)) =
                self.combat
                    .find_target(shooter, PLAYER_RADIUS, self.players.values())
            else {
                continue;
            };

            let damage = self.combat.damage;
            let target_killed = match self.players.get_mut(&target_id) {
                Some(target) => target.take_damage(damage, now),
                None => continue,
            };

            if let Some(shooter) = self.players.get_mut(&shooter_id) {
                shooter.hits.push(target_id);
                if target_killed {
                    shooter.kills += 1;
                }
            }

            if target_killed {
                self.scores[shooter_team.index() as usize] += 1;
                info!(
                    player_id = shooter_id,
                    victim_id = target_id,
                    team = %shooter_team,
                    score_green = self.score(Team::Green),
                    score_orange = self.score(Team::Orange),
                    "Player killed"
                );
            } else {
                debug!(player_id = shooter_id, victim_id = target_id, distance, "Hit");
            }

            hits += 1;
        }

        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::combat::{RESPAWN_DELAY_SEC, SHOT_DAMAGE};
    use crate::game::physics::{WORLD_HEIGHT, WORLD_WIDTH};
    use crate::game::player::MAX_HEALTH;

    fn rules() -> GameRules {
        GameRules {
            spawn_seed: Some(42),
            hit_range: 5000.0,
            ..GameRules::default()
        }
    }

    fn shoot_at(state: &mut GameState, shooter: PlayerId, target: PlayerId) {
        let (sx, sy) = {
            let p = state.player(shooter).unwrap();
            (p.x, p.y)
        };
        let (tx, ty) = {
            let p = state.player(target).unwrap();
            (p.x, p.y)
        };
        let angle = (ty - sy).atan2(tx - sx).to_degrees();
        state.apply_input(
            shooter,
            InputSnapshot {
                shoot: true,
                ..Default::default()
            },
            Some(angle),
        );
    }

    #[test]
    fn test_team_alternation() {
        let mut state = GameState::new(&rules());
        for id in 1..=9 {
            state.add_player(id);
        }
        for (k, player) in state.players.values().enumerate() {
            let expected = if k % 2 == 0 { Team::Green } else { Team::Orange };
            assert_eq!(player.team, expected);
        }
    }

    #[test]
    fn test_alternation_not_rebalanced_after_disconnect() {
        let mut state = GameState::new(&rules());
        state.add_player(1);
        state.add_player(2);
        state.remove_player(2);
        assert_eq!(state.add_player(3).team, Team::Green);
    }

    #[test]
    fn test_remove_player_is_idempotent() {
        let mut state = GameState::new(&rules());
        state.add_player(1);
        state.add_player(2);
        assert!(state.remove_player(1));
        assert!(!state.remove_player(1));
        assert_eq!(state.players.keys().copied().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_idle_player_is_unchanged() {
        let mut state = GameState::new(&rules());
        let (x, y) = {
            let p = state.add_player(1);
            (p.x, p.y)
        };
        let dt = state.dt() as f64;
        for i in 0..180 {
            state.fixed_update(i as f64 * dt);
        }
        let p = state.player(1).unwrap();
        assert_eq!((p.x, p.y), (x, y));
        assert_eq!(p.health, MAX_HEALTH);
        assert!(p.alive);
    }

    #[test]
    fn test_world_bounds_hold_under_movement() {
        let mut state = GameState::new(&rules());
        state.add_player(1);
        state.add_player(2);
        let patterns = [
            InputSnapshot { up: true, left: true, ..Default::default() },
            InputSnapshot { down: true, right: true, ..Default::default() },
            InputSnapshot { up: true, ..Default::default() },
            InputSnapshot { right: true, ..Default::default() },
        ];
        let dt = state.dt() as f64;
        for (n, pattern) in patterns.iter().enumerate() {
            state.apply_input(1, *pattern, None);
            state.apply_input(2, patterns[(n + 1) % patterns.len()], None);
            for i in 0..600 {
                state.fixed_update((n * 600 + i) as f64 * dt);
                for p in state.players.values() {
                    assert!(p.x >= PLAYER_RADIUS && p.x <= WORLD_WIDTH - PLAYER_RADIUS);
                    assert!(p.y >= PLAYER_RADIUS && p.y <= WORLD_HEIGHT - PLAYER_RADIUS);
                }
            }
        }
    }

    #[test]
    fn test_shot_damages_enemy_and_records_hit() {
        let mut state = GameState::new(&rules());
        state.add_player(1);
        state.add_player(2);
        shoot_at(&mut state, 1, 2);

        assert_eq!(state.fixed_update(10.0), 1);
        assert_eq!(state.player(2).unwrap().health, MAX_HEALTH - SHOT_DAMAGE);
        assert_eq!(state.player(1).unwrap().hits, vec![2]);

        // Cooldown holds for the next tick
        assert_eq!(state.fixed_update(10.0 + 1.0 / 60.0), 0);
    }

    #[test]
    fn test_no_friendly_fire() {
        let mut state = GameState::new(&rules());
        state.add_player(1);
        state.add_player(2);
        state.add_player(3);
        shoot_at(&mut state, 1, 3);

        for i in 0..20 {
            state.fixed_update(i as f64);
        }
        assert_eq!(state.player(3).unwrap().health, MAX_HEALTH);
        assert!(!state.player(1).unwrap().hits.contains(&3));
    }

    #[test]
    fn test_kill_scores_and_respawn_timing() {
        let mut state = GameState::new(&rules());
        state.add_player(1);
        state.add_player(2);
        shoot_at(&mut state, 1, 2);

        // Four hits one second apart kill the target
        let mut now = 0.0;
        for _ in 0..4 {
            state.fixed_update(now);
            now += 1.0;
        }
        let death_time = now - 1.0;
        state.apply_input(1, InputSnapshot::default(), None);

        let victim = state.player(2).unwrap();
        assert_eq!(victim.health, 0);
        assert!(!victim.alive);
        assert_eq!(state.score(Team::Green), 1);
        assert_eq!(state.score(Team::Orange), 0);
        assert_eq!(state.player(1).unwrap().kills, 1);

        state.fixed_update(death_time + RESPAWN_DELAY_SEC - 0.01);
        assert!(!state.player(2).unwrap().alive);

        state.fixed_update(death_time + RESPAWN_DELAY_SEC);
        let victim = state.player(2).unwrap();
        assert!(victim.alive);
        assert_eq!(victim.health, MAX_HEALTH);
        assert!(victim.x >= WORLD_WIDTH / 2.0);
    }

    #[test]
    fn test_dead_player_takes_no_further_damage() {
        let mut state = GameState::new(&rules());
        state.add_player(1);
        state.add_player(2);
        state.add_player(3);
        state.player_mut(2).unwrap().take_damage(MAX_HEALTH, 0.0);
        shoot_at(&mut state, 1, 2);
        shoot_at(&mut state, 3, 2);

        for i in 0..5 {
            state.fixed_update(0.5 + i as f64 * 0.3);
        }
        assert_eq!(state.player(2).unwrap().health, 0);
        assert_eq!(state.score(Team::Green), 0);
    }

    #[test]
    fn test_win_declared_once_threshold_reached() {
        let mut state = GameState::new(&GameRules {
            win_score: 1,
            ..rules()
        });
        state.add_player(1);
        state.add_player(2);
        state.player_mut(2).unwrap().health = SHOT_DAMAGE;
        shoot_at(&mut state, 1, 2);

        state.fixed_update(0.0);
        assert_eq!(state.winner(), None);
        state.fixed_update(0.1);
        assert_eq!(state.winner(), Some(Team::Green));
    }
}
