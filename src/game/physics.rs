//! Player movement and arena constraints

use rand::Rng;

use crate::util::geometry::clamp;

use super::player::Team;

/// Arena size (22 x 16 tiles of 80 units)
pub const WORLD_WIDTH: f32 = 1760.0;
pub const WORLD_HEIGHT: f32 = 1280.0;

/// Movement speed in units per second
pub const PLAYER_SPEED: f32 = 220.0;

/// Player bounding circle radius
pub const PLAYER_RADIUS: f32 = 16.0;

/// Distance kept between a spawn band and the arena edge
pub const SPAWN_MARGIN: f32 = 160.0;

/// Width of each team's spawn band
pub const SPAWN_BAND_WIDTH: f32 = 160.0;

/// Physics system for updating player positions
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Integrate one step of movement along the unit vector `dir` and keep
    /// the bounding circle fully inside the arena.
    /// Returns (new_x, new_y)
    pub fn integrate(x: f32, y: f32, dir: (f32, f32), dt: f32) -> (f32, f32) {
        let new_x = x + dir.0 * PLAYER_SPEED * dt;
        let new_y = y + dir.1 * PLAYER_SPEED * dt;
        Self::clamp_to_world(new_x, new_y)
    }

    pub fn clamp_to_world(x: f32, y: f32) -> (f32, f32) {
        (
            clamp(x, PLAYER_RADIUS, WORLD_WIDTH - PLAYER_RADIUS),
            clamp(y, PLAYER_RADIUS, WORLD_HEIGHT - PLAYER_RADIUS),
        )
    }

    /// Random point inside the team's half: left band for green, right band
    /// for orange.
    pub fn spawn_point<R: Rng + ?Sized>(team: Team, rng: &mut R) -> (f32, f32) {
        let x = match team {
            Team::Green => rng.gen_range(SPAWN_MARGIN..=SPAWN_MARGIN + SPAWN_BAND_WIDTH),
            Team::Orange => rng.gen_range(
                WORLD_WIDTH - SPAWN_MARGIN - SPAWN_BAND_WIDTH..=WORLD_WIDTH - SPAWN_MARGIN,
            ),
        };
        let y = rng.gen_range(SPAWN_MARGIN..=WORLD_HEIGHT - SPAWN_MARGIN);
        (x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn in_bounds(x: f32, y: f32) -> bool {
        (PLAYER_RADIUS..=WORLD_WIDTH - PLAYER_RADIUS).contains(&x)
            && (PLAYER_RADIUS..=WORLD_HEIGHT - PLAYER_RADIUS).contains(&y)
    }

    #[test]
    fn test_integrate_moves_at_speed() {
        let (x, y) = PhysicsSystem::integrate(500.0, 500.0, (1.0, 0.0), 0.5);
        assert_approx_eq!(x, 500.0 + PLAYER_SPEED * 0.5, 1e-3);
        assert_eq!(y, 500.0);
    }

    #[test]
    fn test_integrate_zero_direction_is_stationary() {
        assert_eq!(
            PhysicsSystem::integrate(321.5, 654.25, (0.0, 0.0), 1.0 / 60.0),
            (321.5, 654.25)
        );
    }

    #[test]
    fn test_integrate_clamps_to_world() {
        let (x, y) = PhysicsSystem::integrate(20.0, WORLD_HEIGHT - 20.0, (-0.6, 0.8), 1.0);
        assert_eq!(x, PLAYER_RADIUS);
        assert_eq!(y, WORLD_HEIGHT - PLAYER_RADIUS);
    }

    #[test]
    fn test_spawn_points_stay_in_team_band() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..500 {
            let (x, y) = PhysicsSystem::spawn_point(Team::Green, &mut rng);
            assert!((SPAWN_MARGIN..=SPAWN_MARGIN + SPAWN_BAND_WIDTH).contains(&x));
            assert!((SPAWN_MARGIN..=WORLD_HEIGHT - SPAWN_MARGIN).contains(&y));

            let (x, y) = PhysicsSystem::spawn_point(Team::Orange, &mut rng);
            assert!((WORLD_WIDTH - SPAWN_MARGIN - SPAWN_BAND_WIDTH..=WORLD_WIDTH - SPAWN_MARGIN)
                .contains(&x));
            assert!(in_bounds(x, y));
        }
    }
}
