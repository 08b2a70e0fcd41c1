//! Combat system - hitscan weapon, damage, hit detection

use crate::util::geometry::direction_from_degrees;

use super::player::{Player, PlayerId};

/// Minimum time between two consumed shots (seconds)
pub const SHOT_COOLDOWN_SEC: f64 = 0.18;

/// Health removed per hit
pub const SHOT_DAMAGE: i32 = 25;

/// Delay between death and respawn (seconds)
pub const RESPAWN_DELAY_SEC: f64 = 2.0;

/// Default laser reach in world units
pub const DEFAULT_HIT_RANGE: f32 = 1040.0;

/// Slack on the range check so a target exactly at range is not lost to
/// rounding of its position and of the aim direction
const RANGE_TOLERANCE: f64 = 0.01;

/// Combat system for resolving hitscan shots
#[derive(Debug, Clone, Copy)]
pub struct CombatSystem {
    pub hit_range: f32,
    pub damage: i32,
}

impl Default for CombatSystem {
    fn default() -> Self {
        Self::new(DEFAULT_HIT_RANGE)
    }
}

impl CombatSystem {
    pub fn new(hit_range: f32) -> Self {
        Self {
            hit_range,
            damage: SHOT_DAMAGE,
        }
    }

    /// Apply damage to health, returns (new_health, is_dead)
    pub fn apply_damage(current_health: i32, damage: i32) -> (i32, bool) {
        let new_health = (current_health - damage).max(0);
        (new_health, new_health <= 0)
    }

    /// Ray-vs-circle test.
    ///
    /// `dir` must be a unit vector. Returns the distance along the ray to
    /// the point where it enters the circle, or `None` if the circle's
    /// centre projects behind the origin, beyond `max_range`, or the ray
    /// passes wider than `radius`. The projection runs in `f64`.
    pub fn ray_circle_hit(
        origin: (f32, f32),
        dir: (f32, f32),
        center: (f32, f32),
        radius: f32,
        max_range: f32,
    ) -> Option<f32> {
        let to_x = f64::from(center.0) - f64::from(origin.0);
        let to_y = f64::from(center.1) - f64::from(origin.1);
        let (dir_x, dir_y) = (f64::from(dir.0), f64::from(dir.1));

        let t = to_x * dir_x + to_y * dir_y;
        if t < 0.0 || t > f64::from(max_range) + RANGE_TOLERANCE {
            return None;
        }

        let perp = to_x * dir_y - to_y * dir_x;
        let perp_sq = perp * perp;
        let radius_sq = f64::from(radius) * f64::from(radius);
        if perp_sq > radius_sq {
            return None;
        }

        let half_chord = (radius_sq - perp_sq).sqrt();
        Some((t - half_chord) as f32)
    }

    /// Pick the closest alive opposing-team player along the shooter's aim.
    pub fn find_target<'a>(
        &self,
        shooter: &Player,
        radius: f32,
        candidates: impl IntoIterator<Item = &'a Player>,
    ) -> Option<(PlayerId, f32)> {
        let dir = direction_from_degrees(shooter.angle);
        let origin = (shooter.x, shooter.y);

        candidates
            .into_iter()
            .filter(|p| p.alive && p.id != shooter.id && p.team != shooter.team)
            .filter_map(|p| {
                Self::ray_circle_hit(origin, dir, (p.x, p.y), radius, self.hit_range)
                    .map(|distance| (p.id, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::player::Team;

    const RADIUS: f32 = 16.0;

    #[test]
    fn test_apply_damage() {
        assert_eq!(CombatSystem::apply_damage(100, 25), (75, false));
        assert_eq!(CombatSystem::apply_damage(25, 25), (0, true));
        assert_eq!(CombatSystem::apply_damage(10, 25), (0, true));
    }

    #[test]
    fn test_ray_hits_circle_entry_point() {
        let hit = CombatSystem::ray_circle_hit((0.0, 0.0), (1.0, 0.0), (100.0, 0.0), RADIUS, 500.0);
        assert_eq!(hit, Some(100.0 - RADIUS));
    }

    #[test]
    fn test_ray_rejects_target_behind() {
        let hit = CombatSystem::ray_circle_hit((0.0, 0.0), (1.0, 0.0), (-50.0, 0.0), RADIUS, 500.0);
        assert_eq!(hit, None);
    }

    #[test]
    fn test_ray_rejects_wide_miss() {
        let hit = CombatSystem::ray_circle_hit((0.0, 0.0), (1.0, 0.0), (100.0, 17.0), RADIUS, 500.0);
        assert_eq!(hit, None);

        let grazing =
            CombatSystem::ray_circle_hit((0.0, 0.0), (1.0, 0.0), (100.0, 16.0), RADIUS, 500.0);
        assert_eq!(grazing, Some(100.0));
    }

    #[test]
    fn test_hit_range_boundary() {
        let range = 300.0;
        let at_range =
            CombatSystem::ray_circle_hit((10.0, 10.0), (1.0, 0.0), (310.0, 10.0), RADIUS, range);
        assert!(at_range.is_some());

        let beyond =
            CombatSystem::ray_circle_hit((10.0, 10.0), (1.0, 0.0), (310.5, 10.0), RADIUS, range);
        assert!(beyond.is_none());
    }

    #[test]
    fn test_hit_range_boundary_off_axis() {
        let combat = CombatSystem::new(DEFAULT_HIT_RANGE);
        let range = f64::from(DEFAULT_HIT_RANGE);
        let (ox, oy) = (880.0_f32, 640.0_f32);

        for deg in (0..360).step_by(7) {
            let rad = f64::from(deg).to_radians();
            let tx = (f64::from(ox) + range * rad.cos()) as f32;
            let ty = (f64::from(oy) + range * rad.sin()) as f32;

            let mut shooter = Player::new(1, Team::Green, ox, oy);
            shooter.angle = (ty - oy).atan2(tx - ox).to_degrees();
            let at_range = Player::new(2, Team::Orange, tx, ty);
            assert!(
                combat.find_target(&shooter, RADIUS, [&at_range]).is_some(),
                "miss at {deg} degrees"
            );

            let tx = (f64::from(ox) + (range + 1.0) * rad.cos()) as f32;
            let ty = (f64::from(oy) + (range + 1.0) * rad.sin()) as f32;
            let beyond = Player::new(2, Team::Orange, tx, ty);
            assert!(
                combat.find_target(&shooter, RADIUS, [&beyond]).is_none(),
                "hit beyond range at {deg} degrees"
            );
        }
    }

    #[test]
    fn test_find_target_skips_teammates_and_dead() {
        let combat = CombatSystem::new(1000.0);
        let shooter = Player::new(1, Team::Green, 0.0, 0.0);
        let teammate = Player::new(2, Team::Green, 50.0, 0.0);
        let mut dead_enemy = Player::new(3, Team::Orange, 80.0, 0.0);
        dead_enemy.alive = false;
        let enemy = Player::new(4, Team::Orange, 200.0, 0.0);

        let target = combat.find_target(&shooter, RADIUS, [&shooter, &teammate, &dead_enemy, &enemy]);
        assert_eq!(target, Some((4, 200.0 - RADIUS)));
    }

    #[test]
    fn test_find_target_picks_closest() {
        let combat = CombatSystem::new(1000.0);
        let mut shooter = Player::new(1, Team::Orange, 500.0, 500.0);
        shooter.angle = 180.0;
        let far = Player::new(2, Team::Green, 100.0, 500.0);
        let near = Player::new(3, Team::Green, 300.0, 505.0);

        let target = combat.find_target(&shooter, RADIUS, [&far, &near]);
        assert_eq!(target.map(|(id, _)| id), Some(3));
    }

    #[test]
    fn test_find_target_none_when_aiming_away() {
        let combat = CombatSystem::new(1000.0);
        let mut shooter = Player::new(1, Team::Green, 0.0, 0.0);
        shooter.angle = 90.0;
        let enemy = Player::new(2, Team::Orange, 200.0, 0.0);

        assert_eq!(combat.find_target(&shooter, RADIUS, [&enemy]), None);
    }
}
