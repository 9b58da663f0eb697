//! Box-versus-tilemap collision.
//!
//! Only solid grid tiles block motion. Movement is axis-separable
//! move-and-slide: resolve X against the grid, then resolve Y from the
//! corrected X position. Long moves are split into sub-steps no longer than
//! half a tile so the leading-edge probe can never skip a whole cell.

use glam::Vec2;

use crate::tilemap::{GridPos, Tilemap};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center: Vec2,
    pub half: Vec2,
}

impl Aabb {
    pub fn new(center: Vec2, half: Vec2) -> Self {
        Self { center, half }
    }

    pub fn from_min_size(min: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            center: min + half,
            half,
        }
    }

    pub fn min(&self) -> Vec2 {
        self.center - self.half
    }

    pub fn max(&self) -> Vec2 {
        self.center + self.half
    }

    pub fn size(&self) -> Vec2 {
        self.half * 2.0
    }

    pub fn left(&self) -> f32 {
        self.center.x - self.half.x
    }

    pub fn right(&self) -> f32 {
        self.center.x + self.half.x
    }

    pub fn top(&self) -> f32 {
        self.center.y - self.half.y
    }

    /// Largest y covered; the feet of a body.
    pub fn bottom(&self) -> f32 {
        self.center.y + self.half.y
    }

    /// Half-open on the max side so adjacent cells never both contain a point.
    pub fn contains_point(&self, point: Vec2) -> bool {
        let (min, max) = (self.min(), self.max());
        point.x >= min.x && point.x < max.x && point.y >= min.y && point.y < max.y
    }

    /// Strict overlap: touching edges do not count.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let delta = (self.center - other.center).abs();
        let reach = self.half + other.half;
        delta.x < reach.x && delta.y < reach.y
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveResult {
    pub aabb: Aabb,
    pub blocked_left: bool,
    pub blocked_right: bool,
    /// Hit a floor while moving down.
    pub blocked_down: bool,
    pub blocked_up: bool,
}

impl MoveResult {
    pub fn blocked_x(&self) -> bool {
        self.blocked_left || self.blocked_right
    }

    pub fn blocked_y(&self) -> bool {
        self.blocked_down || self.blocked_up
    }
}

pub fn move_and_collide(tilemap: &Tilemap, aabb: Aabb, delta: Vec2) -> MoveResult {
    let max_step = tilemap.tile_size_f32() * 0.5;
    let longest = delta.x.abs().max(delta.y.abs());
    let steps = (longest / max_step).ceil().max(1.0) as u32;
    let step = delta / steps as f32;

    let mut result = MoveResult {
        aabb,
        blocked_left: false,
        blocked_right: false,
        blocked_down: false,
        blocked_up: false,
    };

    let mut remaining = step;
    for _ in 0..steps {
        let sub = move_and_collide_step(tilemap, result.aabb, remaining);
        result.aabb = sub.aabb;
        result.blocked_left |= sub.blocked_left;
        result.blocked_right |= sub.blocked_right;
        result.blocked_down |= sub.blocked_down;
        result.blocked_up |= sub.blocked_up;

        // Once an axis is blocked the remaining sub-steps slide along it.
        if sub.blocked_x() {
            remaining.x = 0.0;
        }
        if sub.blocked_y() {
            remaining.y = 0.0;
        }
        if remaining == Vec2::ZERO {
            break;
        }
    }
    // A landing in an early sub-step only counts if the body still stands on
    // something after sliding through the rest.
    if result.blocked_down && !resting_on_floor(tilemap, result.aabb) {
        result.blocked_down = false;
    }
    result
}

/// Whether a solid tile touches the underside of `aabb`.
pub fn resting_on_floor(tilemap: &Tilemap, aabb: Aabb) -> bool {
    const EPS: f32 = 0.01;
    let size = tilemap.tile_size_f32();
    let y = cell(aabb.bottom() + EPS, size);
    let x0 = cell(aabb.left() + EPS, size);
    let x1 = cell(aabb.right() - EPS, size);
    (x0..=x1).any(|x| tilemap.is_solid(GridPos::new(x, y)))
}

fn move_and_collide_step(tilemap: &Tilemap, aabb: Aabb, delta: Vec2) -> MoveResult {
    const EPS: f32 = 0.0001;

    let resolved_x = resolve_axis_x(tilemap, aabb, delta.x);
    let collided_x = (resolved_x - (aabb.center.x + delta.x)).abs() > EPS;

    let mut moved = aabb;
    moved.center.x = resolved_x;
    let resolved_y = resolve_axis_y(tilemap, moved, delta.y);
    let collided_y = (resolved_y - (aabb.center.y + delta.y)).abs() > EPS;
    moved.center.y = resolved_y;

    MoveResult {
        aabb: moved,
        blocked_left: collided_x && delta.x < 0.0,
        blocked_right: collided_x && delta.x > 0.0,
        blocked_down: collided_y && delta.y > 0.0,
        blocked_up: collided_y && delta.y < 0.0,
    }
}

fn resolve_axis_x(tilemap: &Tilemap, aabb: Aabb, dx: f32) -> f32 {
    if dx == 0.0 {
        return aabb.center.x;
    }

    const EPS: f32 = 0.001;
    let size = tilemap.tile_size_f32();
    let mut candidate_x = aabb.center.x + dx;
    let y0 = cell(aabb.top() + EPS, size);
    let y1 = cell(aabb.bottom() - EPS, size);

    if dx > 0.0 {
        let x_cell = cell(candidate_x + aabb.half.x - EPS, size);
        for y in y0..=y1 {
            if tilemap.is_solid(GridPos::new(x_cell, y)) {
                candidate_x = candidate_x.min(x_cell as f32 * size - aabb.half.x);
            }
        }
        // Never push opposite to the motion.
        candidate_x.max(aabb.center.x)
    } else {
        let x_cell = cell(candidate_x - aabb.half.x + EPS, size);
        for y in y0..=y1 {
            if tilemap.is_solid(GridPos::new(x_cell, y)) {
                candidate_x = candidate_x.max((x_cell + 1) as f32 * size + aabb.half.x);
            }
        }
        candidate_x.min(aabb.center.x)
    }
}

fn resolve_axis_y(tilemap: &Tilemap, aabb: Aabb, dy: f32) -> f32 {
    if dy == 0.0 {
        return aabb.center.y;
    }

    const EPS: f32 = 0.001;
    let size = tilemap.tile_size_f32();
    let mut candidate_y = aabb.center.y + dy;
    let x0 = cell(aabb.left() + EPS, size);
    let x1 = cell(aabb.right() - EPS, size);

    if dy > 0.0 {
        let y_cell = cell(candidate_y + aabb.half.y - EPS, size);
        for x in x0..=x1 {
            if tilemap.is_solid(GridPos::new(x, y_cell)) {
                candidate_y = candidate_y.min(y_cell as f32 * size - aabb.half.y);
            }
        }
        candidate_y.max(aabb.center.y)
    } else {
        let y_cell = cell(candidate_y - aabb.half.y + EPS, size);
        for x in x0..=x1 {
            if tilemap.is_solid(GridPos::new(x, y_cell)) {
                candidate_y = candidate_y.max((y_cell + 1) as f32 * size + aabb.half.y);
            }
        }
        candidate_y.min(aabb.center.y)
    }
}

fn cell(world: f32, size: f32) -> i32 {
    (world / size).floor() as i32
}
