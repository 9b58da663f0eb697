use glam::Vec2;

use crate::body::Body;
use crate::config::GameplayConfig;
use crate::controller::{ControllerInput, PlayerEvents, PlayerState};
use crate::patrol::PatrolState;
use crate::tilemap::Tilemap;

pub const PLAYER_SIZE: Vec2 = Vec2::new(8.0, 15.0);
pub const ENEMY_SIZE: Vec2 = Vec2::new(8.0, 15.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntityKind {
    Player(PlayerState),
    Enemy(PatrolState),
}

/// A physics body plus the behaviour data for its kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entity {
    pub body: Body,
    pub kind: EntityKind,
}

impl Entity {
    pub fn player(top_left: Vec2, config: &GameplayConfig) -> Self {
        Self {
            body: Body::at(top_left, PLAYER_SIZE),
            kind: EntityKind::Player(PlayerState::new(&config.player)),
        }
    }

    pub fn enemy(top_left: Vec2, config: &GameplayConfig) -> Self {
        Self {
            body: Body::at(top_left, ENEMY_SIZE),
            kind: EntityKind::Enemy(PatrolState::new(1.0, &config.enemy)),
        }
    }

    /// Advance one fixed step. Enemies ignore `input`.
    pub fn step(
        &mut self,
        input: ControllerInput,
        config: &GameplayConfig,
        dt: f32,
        tilemap: &Tilemap,
    ) -> PlayerEvents {
        match &mut self.kind {
            EntityKind::Player(state) => state.step(&mut self.body, input, &config.player, dt, tilemap),
            EntityKind::Enemy(patrol) => {
                patrol.step(&mut self.body, &config.enemy, dt, tilemap);
                PlayerEvents::default()
            }
        }
    }

    pub fn player_state(&self) -> Option<&PlayerState> {
        match &self.kind {
            EntityKind::Player(state) => Some(state),
            EntityKind::Enemy(_) => None,
        }
    }

    pub fn is_dashing(&self) -> bool {
        self.player_state().is_some_and(PlayerState::is_dashing)
    }

    /// Put the entity back at `top_left` with fresh per-kind state.
    pub fn respawn(&mut self, top_left: Vec2, config: &GameplayConfig) {
        self.body.reset_at(top_left);
        self.kind = match self.kind {
            EntityKind::Player(_) => EntityKind::Player(PlayerState::new(&config.player)),
            EntityKind::Enemy(patrol) => {
                EntityKind::Enemy(PatrolState::new(patrol.direction, &config.enemy))
            }
        };
    }
}
