use glam::Vec2;

use crate::collision::{move_and_collide, resting_on_floor, Aabb, MoveResult};
use crate::tilemap::Tilemap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactState {
    pub left: bool,
    pub right: bool,
    pub down: bool,
    pub up: bool,
}

/// The physics capability shared by every entity kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub aabb: Aabb,
    /// Pixels per second, y-down.
    pub velocity: Vec2,
    pub grounded: bool,
    pub contacts: ContactState,
}

impl Body {
    pub fn new(aabb: Aabb) -> Self {
        Self {
            aabb,
            velocity: Vec2::ZERO,
            grounded: false,
            contacts: ContactState::default(),
        }
    }

    /// A body whose top-left corner sits at `pos`.
    pub fn at(pos: Vec2, size: Vec2) -> Self {
        Self::new(Aabb::from_min_size(pos, size))
    }

    pub fn position(&self) -> Vec2 {
        self.aabb.min()
    }

    pub fn set_position(&mut self, top_left: Vec2) {
        self.aabb.center = top_left + self.aabb.half;
    }

    /// Teleport and drop all motion, as on respawn.
    pub fn reset_at(&mut self, top_left: Vec2) {
        self.set_position(top_left);
        self.velocity = Vec2::ZERO;
        self.grounded = false;
        self.contacts = ContactState::default();
    }

    /// Move by `velocity * dt` against the tilemap and fold the result into
    /// velocity, contacts and the grounded flag.
    pub fn integrate(&mut self, tilemap: &Tilemap, dt: f32) -> MoveResult {
        let result = move_and_collide(tilemap, self.aabb, self.velocity * dt);
        self.apply_move_result(result, tilemap);
        debug_assert!(
            self.aabb.center.is_finite() && self.velocity.is_finite(),
            "non-finite body state: {self:?}"
        );
        result
    }

    fn apply_move_result(&mut self, result: MoveResult, tilemap: &Tilemap) {
        self.aabb = result.aabb;
        self.contacts = ContactState {
            left: result.blocked_left,
            right: result.blocked_right,
            down: result.blocked_down,
            up: result.blocked_up,
        };

        if (result.blocked_left && self.velocity.x < 0.0)
            || (result.blocked_right && self.velocity.x > 0.0)
        {
            self.velocity.x = 0.0;
        }
        if result.blocked_up && self.velocity.y < 0.0 {
            self.velocity.y = 0.0;
        }

        // Grounded comes from contact, not from position heuristics. A body
        // with no vertical motion this step (a dash) keeps it by probing.
        if result.blocked_down && self.velocity.y >= 0.0 {
            self.velocity.y = 0.0;
            self.grounded = true;
        } else if self.velocity.y == 0.0 {
            self.grounded = self.floor_below(tilemap);
        } else {
            self.grounded = false;
        }
    }

    /// Whether a solid tile touches the underside of the box.
    pub fn floor_below(&self, tilemap: &Tilemap) -> bool {
        resting_on_floor(tilemap, self.aabb)
    }
}
