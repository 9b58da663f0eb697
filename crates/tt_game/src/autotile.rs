//! Neighbour-aware variant selection for stone and granite.
//!
//! A tile's variant is a pure function of which of its eight neighbours hold
//! a tile of the same kind. Only the four cardinal bits feed the lookup; the
//! diagonal bits are kept in the mask for callers that want them.

use crate::tilemap::{GridPos, Tilemap, NEIGHBOR_OFFSETS};

pub const MASK_N: u8 = 1;
pub const MASK_E: u8 = 1 << 1;
pub const MASK_S: u8 = 1 << 2;
pub const MASK_W: u8 = 1 << 3;
pub const MASK_NE: u8 = 1 << 4;
pub const MASK_SE: u8 = 1 << 5;
pub const MASK_SW: u8 = 1 << 6;
pub const MASK_NW: u8 = 1 << 7;

const CARDINAL: u8 = MASK_N | MASK_E | MASK_S | MASK_W;

/// Indexed by the cardinal nibble. Variant layout on the sheet:
///
/// ```text
/// 0 1 2
/// 7 8 3
/// 6 5 4
/// ```
const VARIANT_TABLE: [Option<u32>; 16] = {
    let mut table = [None; 16];
    table[(MASK_E | MASK_S) as usize] = Some(0);
    table[(MASK_E | MASK_S | MASK_W) as usize] = Some(1);
    table[(MASK_W | MASK_S) as usize] = Some(2);
    table[(MASK_W | MASK_N | MASK_S) as usize] = Some(3);
    table[(MASK_W | MASK_N) as usize] = Some(4);
    table[(MASK_W | MASK_N | MASK_E) as usize] = Some(5);
    table[(MASK_E | MASK_N) as usize] = Some(6);
    table[(MASK_E | MASK_N | MASK_S) as usize] = Some(7);
    table[CARDINAL as usize] = Some(8);
    table
};

fn offset_bit(dx: i32, dy: i32) -> u8 {
    match (dx, dy) {
        (0, -1) => MASK_N,
        (1, 0) => MASK_E,
        (0, 1) => MASK_S,
        (-1, 0) => MASK_W,
        (1, -1) => MASK_NE,
        (1, 1) => MASK_SE,
        (-1, 1) => MASK_SW,
        (-1, -1) => MASK_NW,
        _ => 0,
    }
}

/// Occupancy of same-kind neighbours around `pos`. Empty cells give 0.
pub fn neighbor_mask(tilemap: &Tilemap, pos: GridPos) -> u8 {
    let Some(center) = tilemap.get_tile(pos) else {
        return 0;
    };
    NEIGHBOR_OFFSETS
        .iter()
        .filter(|&&(dx, dy)| {
            tilemap
                .get_tile(pos.offset(dx, dy))
                .is_some_and(|tile| tile.kind == center.kind)
        })
        .fold(0, |mask, &(dx, dy)| mask | offset_bit(dx, dy))
}

/// `None` for shapes with no dedicated art; the caller keeps the old variant.
pub fn variant_for_mask(mask: u8) -> Option<u32> {
    VARIANT_TABLE[(mask & CARDINAL) as usize]
}

/// Re-evaluate one tile. Returns true if its variant changed.
pub fn autotile_at(tilemap: &mut Tilemap, pos: GridPos) -> bool {
    let autotiled = tilemap
        .get_tile(pos)
        .is_some_and(|tile| tile.kind.is_autotiled());
    if !autotiled {
        return false;
    }
    let Some(variant) = variant_for_mask(neighbor_mask(tilemap, pos)) else {
        return false;
    };
    match tilemap.get_tile_mut(pos) {
        Some(tile) if tile.variant != variant => {
            tile.variant = variant;
            true
        }
        _ => false,
    }
}

/// Re-evaluate `pos` and its eight neighbours after an edit there.
pub fn autotile_around(tilemap: &mut Tilemap, pos: GridPos) -> usize {
    std::iter::once((0, 0))
        .chain(NEIGHBOR_OFFSETS)
        .filter(|&(dx, dy)| autotile_at(tilemap, pos.offset(dx, dy)))
        .count()
}

pub fn autotile_all(tilemap: &mut Tilemap) -> usize {
    let positions: Vec<GridPos> = tilemap
        .tiles()
        .filter(|tile| tile.kind.is_autotiled())
        .map(|tile| tile.pos)
        .collect();
    let changed = positions
        .into_iter()
        .filter(|&pos| autotile_at(tilemap, pos))
        .count();
    log::debug!("Autotiled map, {changed} variants changed");
    changed
}
