//! Flat-colour rendering of levels and entities into a `QuadBatch`. Shared by
//! the game and the editor.

use glam::Vec2;
use tt_render::{Color, QuadBatch};

use crate::collision::Aabb;
use crate::entity::{Entity, EntityKind};
use crate::level::{SPAWNER_ENEMY, SPAWNER_PLAYER};
use crate::tilemap::{GridPos, TileKind, Tilemap};

pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.07,
    g: 0.08,
    b: 0.12,
    a: 1.0,
};

const PLAYER_COLOR: Color = [0.95, 0.85, 0.35, 1.0];
const PLAYER_DASH_COLOR: Color = [1.0, 1.0, 1.0, 1.0];
const ENEMY_COLOR: Color = [0.85, 0.25, 0.3, 1.0];
const HITBOX_COLOR: Color = [1.0, 0.2, 0.2, 0.8];

/// Base colour for a tile; variants shade it slightly so autotiling is visible.
pub fn tile_color(kind: TileKind, variant: u32) -> Color {
    let base: Color = match kind {
        TileKind::Stone => [0.45, 0.47, 0.52, 1.0],
        TileKind::Granite => [0.55, 0.42, 0.38, 1.0],
        TileKind::Decor => [0.25, 0.55, 0.3, 0.6],
        TileKind::LargeDecor => [0.2, 0.4, 0.25, 0.5],
        TileKind::Portal => [0.45, 0.3, 0.9, 1.0],
        TileKind::Spike => [0.85, 0.85, 0.9, 1.0],
        TileKind::Spawners => match variant {
            SPAWNER_PLAYER => PLAYER_COLOR,
            SPAWNER_ENEMY => ENEMY_COLOR,
            _ => [0.45, 0.3, 0.9, 1.0],
        },
    };
    if !kind.is_autotiled() {
        return base;
    }
    let shade = 1.0 - 0.04 * variant as f32;
    [base[0] * shade, base[1] * shade, base[2] * shade, base[3]]
}

/// Grid tiles inside `view` (top-left, bottom-right) plus every off-grid tile.
pub fn push_tilemap(batch: &mut QuadBatch, tilemap: &Tilemap, view: (Vec2, Vec2)) {
    let size = tilemap.tile_size_f32();
    let min = tilemap.world_to_grid(view.0);
    let max = tilemap.world_to_grid(view.1);

    for tile in tilemap.offgrid() {
        let inset = size * 0.125;
        batch.push_rect(
            tile.pos.x + inset,
            tile.pos.y + inset,
            size - 2.0 * inset,
            size - 2.0 * inset,
            tile_color(tile.kind, tile.variant),
        );
    }

    for y in min.y..=max.y {
        for x in min.x..=max.x {
            let pos = GridPos::new(x, y);
            let Some(tile) = tilemap.get_tile(pos) else {
                continue;
            };
            let corner = tilemap.grid_to_world(pos);
            batch.push_rect(
                corner.x,
                corner.y,
                size,
                size,
                tile_color(tile.kind, tile.variant),
            );
        }
    }
}

pub fn push_entity(batch: &mut QuadBatch, entity: &Entity) {
    let min = entity.body.aabb.min();
    let size = entity.body.aabb.size();
    let color = match &entity.kind {
        EntityKind::Player(state) if state.is_dashing() => PLAYER_DASH_COLOR,
        EntityKind::Player(_) => PLAYER_COLOR,
        EntityKind::Enemy(_) => ENEMY_COLOR,
    };
    batch.push_rect(min.x, min.y, size.x, size.y, color);
}

/// Outline hazard and goal hitboxes.
pub fn push_hitboxes(batch: &mut QuadBatch, boxes: &[Aabb]) {
    for aabb in boxes {
        let min = aabb.min();
        let size = aabb.size();
        batch.push_outline(min.x, min.y, size.x, size.y, 1.0, HITBOX_COLOR);
    }
}

/// Thin grid lines over the visible area, for the editor.
pub fn push_grid(batch: &mut QuadBatch, tile_size: f32, view: (Vec2, Vec2), color: Color) {
    let start_x = (view.0.x / tile_size).floor() as i32;
    let end_x = (view.1.x / tile_size).ceil() as i32;
    let start_y = (view.0.y / tile_size).floor() as i32;
    let end_y = (view.1.y / tile_size).ceil() as i32;
    let height = view.1.y - view.0.y;
    let width = view.1.x - view.0.x;
    for x in start_x..=end_x {
        batch.push_rect(x as f32 * tile_size, view.0.y, 0.5, height, color);
    }
    for y in start_y..=end_y {
        batch.push_rect(view.0.x, y as f32 * tile_size, width, 0.5, color);
    }
}
