//! Enemy walking behaviour: pace back and forth, turning at walls and ledges,
//! pausing between walks. Fully deterministic so replays stay exact.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::body::Body;
use crate::tilemap::Tilemap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatrolConfig {
    pub speed: f32,
    /// Seconds spent walking before each pause.
    pub walk_time: f32,
    pub idle_time: f32,
    pub gravity: f32,
    pub max_fall_speed: f32,
}

impl Default for PatrolConfig {
    fn default() -> Self {
        Self {
            speed: 30.0,
            walk_time: 2.0,
            idle_time: 0.5,
            gravity: 480.0,
            max_fall_speed: 300.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatrolPhase {
    Walking,
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatrolState {
    /// -1.0 or 1.0.
    pub direction: f32,
    pub phase: PatrolPhase,
    pub phase_time_left: f32,
}

impl PatrolState {
    pub fn new(direction: f32, config: &PatrolConfig) -> Self {
        Self {
            direction: if direction < 0.0 { -1.0 } else { 1.0 },
            phase: PatrolPhase::Walking,
            phase_time_left: config.walk_time,
        }
    }

    pub fn step(&mut self, body: &mut Body, config: &PatrolConfig, dt: f32, tilemap: &Tilemap) {
        let walking = self.phase == PatrolPhase::Walking;

        if walking && body.grounded && !ground_ahead(body, self.direction, tilemap) {
            self.direction = -self.direction;
        }

        body.velocity.x = if walking {
            self.direction * config.speed
        } else {
            0.0
        };
        body.velocity.y = (body.velocity.y + config.gravity * dt).min(config.max_fall_speed);
        body.integrate(tilemap, dt);

        if walking && (body.contacts.left || body.contacts.right) {
            self.direction = -self.direction;
        }

        self.phase_time_left -= dt;
        if self.phase_time_left <= 0.0 {
            self.phase = match self.phase {
                PatrolPhase::Walking => PatrolPhase::Idle,
                PatrolPhase::Idle => PatrolPhase::Walking,
            };
            self.phase_time_left = match self.phase {
                PatrolPhase::Walking => config.walk_time,
                PatrolPhase::Idle => config.idle_time,
            };
        }
    }
}

/// Solid floor just past the leading bottom corner.
fn ground_ahead(body: &Body, direction: f32, tilemap: &Tilemap) -> bool {
    let x = if direction > 0.0 {
        body.aabb.right() + 1.0
    } else {
        body.aabb.left() - 1.0
    };
    tilemap.is_solid_at_point(Vec2::new(x, body.aabb.bottom() + 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tilemap::{GridPos, Tile, TileKind};

    const DT: f32 = 1.0 / 60.0;

    fn platform(x0: i32, x1: i32) -> Tilemap {
        let mut map = Tilemap::new(16);
        for x in x0..=x1 {
            map.set_tile(Tile::new(TileKind::Stone, 0, GridPos::new(x, 4)));
        }
        map
    }

    fn enemy_on_platform() -> Body {
        Body::at(Vec2::new(40.0, 64.0 - 15.0), Vec2::new(8.0, 15.0))
    }

    #[test]
    fn turns_at_ledge_and_stays_on_platform() {
        let map = platform(1, 5);
        let config = PatrolConfig {
            walk_time: 100.0,
            ..Default::default()
        };
        let mut body = enemy_on_platform();
        let mut patrol = PatrolState::new(1.0, &config);

        let mut turned = false;
        for _ in 0..600 {
            patrol.step(&mut body, &config, DT, &map);
            turned |= patrol.direction < 0.0;
            assert!(body.aabb.left() >= 16.0 - 1.0 && body.aabb.right() <= 96.0 + 1.0);
        }
        assert!(turned);
        assert!(body.grounded);
    }

    #[test]
    fn turns_at_wall() {
        let mut map = platform(0, 10);
        map.set_tile(Tile::new(TileKind::Stone, 0, GridPos::new(4, 3)));
        let config = PatrolConfig {
            walk_time: 100.0,
            ..Default::default()
        };
        let mut body = enemy_on_platform();
        let mut patrol = PatrolState::new(1.0, &config);
        for _ in 0..120 {
            patrol.step(&mut body, &config, DT, &map);
        }
        assert!(patrol.direction < 0.0);
        assert!(body.aabb.right() <= 64.0 + 1e-3);
    }

    #[test]
    fn alternates_walk_and_idle() {
        let map = platform(-10, 20);
        let config = PatrolConfig::default();
        let mut body = enemy_on_platform();
        let mut patrol = PatrolState::new(-1.0, &config);

        for _ in 0..130 {
            patrol.step(&mut body, &config, DT, &map);
        }
        assert_eq!(patrol.phase, PatrolPhase::Idle);
        assert_eq!(body.velocity.x, 0.0);

        for _ in 0..40 {
            patrol.step(&mut body, &config, DT, &map);
        }
        assert_eq!(patrol.phase, PatrolPhase::Walking);
    }
}
