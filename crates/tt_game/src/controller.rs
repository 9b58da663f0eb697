use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::body::Body;
use crate::tilemap::Tilemap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControllerInput {
    pub move_x: f32,
    pub jump_pressed: bool,
    #[serde(default)]
    pub dash_pressed: bool,
}

/// Player movement tuning. Speeds are pixels per second, y-down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub max_speed: f32,
    pub accel_ground: f32,
    pub accel_air: f32,
    pub friction_ground: f32,
    pub gravity: f32,
    pub max_fall_speed: f32,
    pub jump_speed: f32,
    pub dash_speed: f32,
    /// Seconds.
    pub dash_duration: f32,
    /// Fraction of dash speed kept when the dash ends.
    pub dash_exit_factor: f32,
    /// Airborne longer than this is a freefall death.
    pub max_air_time: f32,
    pub double_jump: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_speed: 60.0,
            accel_ground: 900.0,
            accel_air: 600.0,
            friction_ground: 900.0,
            gravity: 480.0,
            max_fall_speed: 300.0,
            jump_speed: 180.0,
            dash_speed: 480.0,
            dash_duration: 1.0 / 6.0,
            dash_exit_factor: 0.1,
            max_air_time: 2.0,
            double_jump: false,
        }
    }
}

impl ControllerConfig {
    pub fn max_jumps(&self) -> u32 {
        if self.double_jump {
            2
        } else {
            1
        }
    }
}

/// Things that happened during one player step, for the session and HUD.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerEvents {
    pub jumped: bool,
    pub dash_started: bool,
    pub dash_ended: bool,
    pub landed: bool,
    pub freefall: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerState {
    pub jumps_left: u32,
    pub dash_available: bool,
    pub dash_time_left: f32,
    /// -1.0 or 1.0 while dashing.
    pub dash_dir: f32,
    pub facing: f32,
    pub air_time: f32,
}

impl PlayerState {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            jumps_left: config.max_jumps(),
            dash_available: true,
            dash_time_left: 0.0,
            dash_dir: 0.0,
            facing: 1.0,
            air_time: 0.0,
        }
    }

    pub fn is_dashing(&self) -> bool {
        self.dash_time_left > 0.0
    }

    pub fn step(
        &mut self,
        body: &mut Body,
        input: ControllerInput,
        config: &ControllerConfig,
        dt: f32,
        tilemap: &Tilemap,
    ) -> PlayerEvents {
        let mut events = PlayerEvents::default();
        let was_grounded = body.grounded;

        if input.move_x != 0.0 {
            self.facing = input.move_x.signum();
        }

        if input.dash_pressed && self.dash_available && !self.is_dashing() {
            self.dash_available = false;
            self.dash_time_left = config.dash_duration;
            self.dash_dir = if input.move_x != 0.0 {
                input.move_x.signum()
            } else {
                self.facing
            };
            events.dash_started = true;
        }

        if self.is_dashing() {
            // Gravity is suspended and jumps are ignored for the whole dash.
            body.velocity = Vec2::new(self.dash_dir * config.dash_speed, 0.0);
        } else {
            self.apply_run(body, input.move_x, config, dt);
            if input.jump_pressed {
                events.jumped = self.try_jump(body, config);
            }
            body.velocity.y = (body.velocity.y + config.gravity * dt).min(config.max_fall_speed);
        }

        body.integrate(tilemap, dt);

        if self.is_dashing() {
            self.dash_time_left -= dt;
            if self.dash_time_left <= 1e-4 {
                self.dash_time_left = 0.0;
                body.velocity.x = self.dash_dir * config.dash_speed * config.dash_exit_factor;
                events.dash_ended = true;
            }
        }

        if body.grounded {
            events.landed = !was_grounded;
            self.air_time = 0.0;
            self.jumps_left = config.max_jumps();
            if !self.is_dashing() {
                self.dash_available = true;
            }
        } else {
            self.air_time += dt;
            events.freefall = self.air_time > config.max_air_time;
        }

        events
    }

    fn apply_run(&self, body: &mut Body, move_x: f32, config: &ControllerConfig, dt: f32) {
        let accel = if body.grounded {
            config.accel_ground
        } else {
            config.accel_air
        };

        if move_x != 0.0 {
            let target = move_x * config.max_speed;
            body.velocity.x = move_towards(body.velocity.x, target, accel * dt);
        } else if body.grounded {
            body.velocity.x = move_towards(body.velocity.x, 0.0, config.friction_ground * dt);
        }
    }

    fn try_jump(&mut self, body: &mut Body, config: &ControllerConfig) -> bool {
        if self.jumps_left == 0 {
            return false;
        }
        if !body.grounded {
            self.dash_available = true;
        }
        self.jumps_left -= 1;
        body.velocity.y = -config.jump_speed;
        body.grounded = false;
        true
    }
}

pub(crate) fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else if target > current {
        current + max_delta
    } else {
        current - max_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tilemap::{GridPos, Tile, TileKind};

    const DT: f32 = 1.0 / 60.0;
    const PLAYER_SIZE: Vec2 = Vec2::new(8.0, 15.0);

    fn floor_map() -> Tilemap {
        let mut map = Tilemap::new(16);
        for x in -20..=40 {
            map.set_tile(Tile::new(TileKind::Stone, 0, GridPos::new(x, 5)));
        }
        map
    }

    fn idle() -> ControllerInput {
        ControllerInput::default()
    }

    fn jump() -> ControllerInput {
        ControllerInput {
            jump_pressed: true,
            ..Default::default()
        }
    }

    /// A player standing on row 5 after settling.
    fn grounded_player(map: &Tilemap, config: &ControllerConfig) -> (Body, PlayerState) {
        let mut body = Body::at(Vec2::new(80.0, 60.0), PLAYER_SIZE);
        let mut state = PlayerState::new(config);
        for _ in 0..30 {
            state.step(&mut body, idle(), config, DT, map);
        }
        assert!(body.grounded);
        (body, state)
    }

    #[test]
    fn falls_onto_row_and_rests_at_tile_top() {
        let map = floor_map();
        let config = ControllerConfig::default();
        for start_vx in [-120.0, 0.0, 45.0, 300.0] {
            let mut body = Body::at(Vec2::new(80.0, 0.0), PLAYER_SIZE);
            body.velocity.x = start_vx;
            let mut state = PlayerState::new(&config);
            for _ in 0..120 {
                state.step(&mut body, idle(), &config, DT, &map);
            }
            assert!(body.grounded, "vx {start_vx}");
            assert_eq!(body.velocity.y, 0.0);
            assert!((body.aabb.bottom() - 80.0).abs() < 1e-3);
        }
    }

    #[test]
    fn single_jump_without_double_jump_ability() {
        let map = floor_map();
        let config = ControllerConfig::default();
        let (mut body, mut state) = grounded_player(&map, &config);

        assert!(state.step(&mut body, jump(), &config, DT, &map).jumped);
        assert!(body.velocity.y < 0.0);
        state.step(&mut body, idle(), &config, DT, &map);
        assert!(!state.step(&mut body, jump(), &config, DT, &map).jumped);
    }

    #[test]
    fn double_jump_allows_exactly_two() {
        let map = floor_map();
        let config = ControllerConfig {
            double_jump: true,
            ..Default::default()
        };
        let (mut body, mut state) = grounded_player(&map, &config);

        assert!(state.step(&mut body, jump(), &config, DT, &map).jumped);
        state.step(&mut body, idle(), &config, DT, &map);
        assert!(state.step(&mut body, jump(), &config, DT, &map).jumped);
        assert!((body.velocity.y + config.jump_speed - config.gravity * DT).abs() < 1e-3);
        state.step(&mut body, idle(), &config, DT, &map);
        assert!(!state.step(&mut body, jump(), &config, DT, &map).jumped);
        assert!(!body.grounded);
    }

    #[test]
    fn jumps_refill_on_landing() {
        let map = floor_map();
        let config = ControllerConfig::default();
        let (mut body, mut state) = grounded_player(&map, &config);

        state.step(&mut body, jump(), &config, DT, &map);
        assert_eq!(state.jumps_left, 0);
        let mut landed = false;
        for _ in 0..180 {
            landed |= state.step(&mut body, idle(), &config, DT, &map).landed;
        }
        assert!(landed);
        assert_eq!(state.jumps_left, 1);
    }

    #[test]
    fn dash_holds_speed_for_its_duration_then_gravity_resumes() {
        let map = Tilemap::new(16);
        let config = ControllerConfig::default();
        let mut body = Body::at(Vec2::ZERO, PLAYER_SIZE);
        let mut state = PlayerState::new(&config);

        let dash = ControllerInput {
            move_x: -1.0,
            dash_pressed: true,
            ..Default::default()
        };
        let mut events = state.step(&mut body, dash, &config, DT, &map);
        assert!(events.dash_started);

        let steps = (config.dash_duration / DT).round() as usize;
        for _ in 1..steps {
            assert_eq!(body.velocity, Vec2::new(-config.dash_speed, 0.0));
            assert!(!events.dash_ended);
            events = state.step(&mut body, idle(), &config, DT, &map);
        }
        assert!(events.dash_ended);
        assert!(!state.is_dashing());
        assert_eq!(body.velocity.x, -config.dash_speed * config.dash_exit_factor);

        let before = body.velocity.y;
        state.step(&mut body, idle(), &config, DT, &map);
        assert!(body.velocity.y > before);
    }

    #[test]
    fn dash_uses_facing_without_input_and_is_consumed_in_air() {
        let map = Tilemap::new(16);
        let config = ControllerConfig::default();
        let mut body = Body::at(Vec2::ZERO, PLAYER_SIZE);
        let mut state = PlayerState::new(&config);
        let dash = ControllerInput {
            dash_pressed: true,
            ..Default::default()
        };

        state.step(&mut body, dash, &config, DT, &map);
        assert_eq!(body.velocity.x, config.dash_speed);
        for _ in 0..20 {
            state.step(&mut body, idle(), &config, DT, &map);
        }
        assert!(!state.is_dashing());
        assert!(!state.step(&mut body, dash, &config, DT, &map).dash_started);
    }

    #[test]
    fn airborne_jump_refreshes_dash() {
        let map = Tilemap::new(16);
        let config = ControllerConfig {
            double_jump: true,
            ..Default::default()
        };
        let mut body = Body::at(Vec2::ZERO, PLAYER_SIZE);
        let mut state = PlayerState::new(&config);
        let dash = ControllerInput {
            dash_pressed: true,
            move_x: 1.0,
            ..Default::default()
        };

        assert!(state.step(&mut body, dash, &config, DT, &map).dash_started);
        for _ in 0..12 {
            state.step(&mut body, idle(), &config, DT, &map);
        }
        assert!(!state.dash_available);
        assert!(state.step(&mut body, jump(), &config, DT, &map).jumped);
        assert!(state.dash_available);
    }

    #[test]
    fn jump_is_ignored_while_dashing() {
        let map = floor_map();
        let config = ControllerConfig::default();
        let (mut body, mut state) = grounded_player(&map, &config);
        let dash = ControllerInput {
            dash_pressed: true,
            move_x: 1.0,
            ..Default::default()
        };
        state.step(&mut body, dash, &config, DT, &map);
        let events = state.step(&mut body, jump(), &config, DT, &map);
        assert!(!events.jumped);
        assert_eq!(body.velocity.y, 0.0);
    }

    #[test]
    fn long_fall_reports_freefall() {
        let map = Tilemap::new(16);
        let config = ControllerConfig::default();
        let mut body = Body::at(Vec2::ZERO, PLAYER_SIZE);
        let mut state = PlayerState::new(&config);
        let mut freefall_step = None;
        for i in 0..200 {
            if state.step(&mut body, idle(), &config, DT, &map).freefall {
                freefall_step = Some(i);
                break;
            }
        }
        // 2 s at 60 Hz, give or take float accumulation.
        assert!(matches!(freefall_step, Some(119..=121)));
    }

    #[test]
    fn deterministic_sequence_reaches_same_final_state() {
        let map = floor_map();
        let config = ControllerConfig {
            double_jump: true,
            ..Default::default()
        };
        let mut inputs = vec![
            ControllerInput {
                move_x: 1.0,
                ..Default::default()
            };
            60
        ];
        inputs.push(ControllerInput {
            move_x: 1.0,
            jump_pressed: true,
            dash_pressed: false,
        });
        inputs.extend(std::iter::repeat(idle()).take(10));
        inputs.push(ControllerInput {
            move_x: -1.0,
            jump_pressed: false,
            dash_pressed: true,
        });
        inputs.extend(std::iter::repeat(idle()).take(90));

        let run = || {
            let mut body = Body::at(Vec2::new(80.0, 40.0), PLAYER_SIZE);
            let mut state = PlayerState::new(&config);
            for input in &inputs {
                state.step(&mut body, *input, &config, DT, &map);
            }
            (body, state)
        };
        let (body_a, state_a) = run();
        let (body_b, state_b) = run();
        assert_eq!(body_a, body_b);
        assert_eq!(state_a, state_b);
    }
}
