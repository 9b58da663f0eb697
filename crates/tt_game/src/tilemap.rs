//! Level geometry: a sparse grid of typed tiles plus free-floating decoration.
//!
//! Grid tiles are keyed by `GridPos` and are the only thing physics ever sees.
//! Off-grid tiles carry pixel positions and exist for looks and for spawner
//! markers placed between cells. Coordinates are y-down.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::collision::Aabb;

pub const DEFAULT_TILE_SIZE: u32 = 16;

/// Grid coordinates beyond this magnitude are treated as caller bugs.
pub const MAX_GRID_EXTENT: i32 = 4096;

/// The 3x3 block around a cell, minus the cell itself.
pub const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    Decor,
    Granite,
    LargeDecor,
    Portal,
    Spawners,
    Spike,
    Stone,
}

impl TileKind {
    pub const ALL: [TileKind; 7] = [
        TileKind::Decor,
        TileKind::Granite,
        TileKind::LargeDecor,
        TileKind::Portal,
        TileKind::Spawners,
        TileKind::Spike,
        TileKind::Stone,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Decor => "decor",
            Self::Granite => "granite",
            Self::LargeDecor => "large_decor",
            Self::Portal => "portal",
            Self::Spawners => "spawners",
            Self::Spike => "spike",
            Self::Stone => "stone",
        }
    }

    /// Participates in collision.
    pub fn is_solid(self) -> bool {
        matches!(self, Self::Stone | Self::Granite)
    }

    pub fn is_autotiled(self) -> bool {
        matches!(self, Self::Stone | Self::Granite)
    }

    /// Number of art variants the editor cycles through.
    pub fn variant_count(self) -> u32 {
        match self {
            Self::Decor => 4,
            Self::Granite | Self::Stone => 9,
            Self::LargeDecor | Self::Portal | Self::Spawners => 3,
            Self::Spike => 4,
        }
    }
}

impl fmt::Display for TileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TileKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TileKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown tile kind '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn in_extent(self) -> bool {
        self.x.abs() <= MAX_GRID_EXTENT && self.y.abs() <= MAX_GRID_EXTENT
    }

    /// `"x;y"`, the key format of level files.
    pub fn key(self) -> String {
        format!("{};{}", self.x, self.y)
    }

    pub fn parse_key(key: &str) -> Option<Self> {
        let (x, y) = key.split_once(';')?;
        Some(Self::new(x.trim().parse().ok()?, y.trim().parse().ok()?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tile {
    pub kind: TileKind,
    pub variant: u32,
    pub pos: GridPos,
}

impl Tile {
    pub fn new(kind: TileKind, variant: u32, pos: GridPos) -> Self {
        Self { kind, variant, pos }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffgridTile {
    pub kind: TileKind,
    pub variant: u32,
    /// Top-left corner in world pixels.
    pub pos: Vec2,
}

/// A tile pulled out of the map by `extract`, positioned in world pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedTile {
    pub kind: TileKind,
    pub variant: u32,
    pub pos: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tilemap {
    tile_size: u32,
    tiles: HashMap<GridPos, Tile>,
    offgrid: Vec<OffgridTile>,
}

impl Default for Tilemap {
    fn default() -> Self {
        Self::new(DEFAULT_TILE_SIZE)
    }
}

impl Tilemap {
    pub fn new(tile_size: u32) -> Self {
        assert!(tile_size > 0, "tile size must be positive");
        Self {
            tile_size,
            tiles: HashMap::new(),
            offgrid: Vec::new(),
        }
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn tile_size_f32(&self) -> f32 {
        self.tile_size as f32
    }

    pub fn get_tile(&self, pos: GridPos) -> Option<&Tile> {
        self.tiles.get(&pos)
    }

    pub(crate) fn get_tile_mut(&mut self, pos: GridPos) -> Option<&mut Tile> {
        self.tiles.get_mut(&pos)
    }

    /// Place `tile` at its own position, returning whatever it replaced.
    pub fn set_tile(&mut self, tile: Tile) -> Option<Tile> {
        assert!(
            tile.pos.in_extent(),
            "grid position ({}, {}) outside tilemap extent",
            tile.pos.x,
            tile.pos.y
        );
        assert!(
            tile.variant < tile.kind.variant_count(),
            "{} variant {} out of range",
            tile.kind,
            tile.variant
        );
        self.tiles.insert(tile.pos, tile)
    }

    pub fn remove_tile(&mut self, pos: GridPos) -> Option<Tile> {
        assert!(
            pos.in_extent(),
            "grid position ({}, {}) outside tilemap extent",
            pos.x,
            pos.y
        );
        self.tiles.remove(&pos)
    }

    /// Grid tiles in the eight cells around `pos`.
    pub fn neighbors(&self, pos: GridPos) -> impl Iterator<Item = &Tile> + '_ {
        NEIGHBOR_OFFSETS
            .iter()
            .filter_map(move |&(dx, dy)| self.tiles.get(&pos.offset(dx, dy)))
    }

    pub fn is_solid(&self, pos: GridPos) -> bool {
        self.tiles.get(&pos).is_some_and(|tile| tile.kind.is_solid())
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.tiles.values()
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty() && self.offgrid.is_empty()
    }

    pub fn tiles_of_kind(&self, kind: TileKind) -> impl Iterator<Item = &Tile> + '_ {
        self.tiles.values().filter(move |tile| tile.kind == kind)
    }

    pub fn offgrid(&self) -> &[OffgridTile] {
        &self.offgrid
    }

    pub fn add_offgrid(&mut self, tile: OffgridTile) {
        assert!(
            tile.variant < tile.kind.variant_count(),
            "{} variant {} out of range",
            tile.kind,
            tile.variant
        );
        assert!(tile.pos.is_finite(), "off-grid position {} is not finite", tile.pos);
        self.offgrid.push(tile);
    }

    /// Drop every off-grid tile whose one-cell footprint contains `point`.
    pub fn remove_offgrid_at(&mut self, point: Vec2) -> usize {
        let size = self.tile_size_f32();
        let before = self.offgrid.len();
        self.offgrid.retain(|tile| {
            !Aabb::from_min_size(tile.pos, Vec2::splat(size)).contains_point(point)
        });
        before - self.offgrid.len()
    }

    pub fn world_to_grid(&self, point: Vec2) -> GridPos {
        let size = self.tile_size_f32();
        GridPos::new(
            (point.x / size).floor() as i32,
            (point.y / size).floor() as i32,
        )
    }

    /// Top-left corner of a cell in world pixels.
    pub fn grid_to_world(&self, pos: GridPos) -> Vec2 {
        let size = self.tile_size_f32();
        Vec2::new(pos.x as f32 * size, pos.y as f32 * size)
    }

    pub fn cell_rect(&self, pos: GridPos) -> Aabb {
        Aabb::from_min_size(self.grid_to_world(pos), Vec2::splat(self.tile_size_f32()))
    }

    pub fn is_solid_at_point(&self, point: Vec2) -> bool {
        self.is_solid(self.world_to_grid(point))
    }

    /// Solid cell rectangles in the 3x3 block around a world point.
    pub fn solid_rects_around(&self, point: Vec2) -> Vec<Aabb> {
        let center = self.world_to_grid(point);
        std::iter::once((0, 0))
            .chain(NEIGHBOR_OFFSETS)
            .map(|(dx, dy)| center.offset(dx, dy))
            .filter(|pos| self.is_solid(*pos))
            .map(|pos| self.cell_rect(pos))
            .collect()
    }

    /// Inclusive grid bounds of all grid tiles.
    pub fn grid_bounds(&self) -> Option<(GridPos, GridPos)> {
        let mut iter = self.tiles.keys();
        let first = *iter.next()?;
        Some(iter.fold((first, first), |(min, max), pos| {
            (
                GridPos::new(min.x.min(pos.x), min.y.min(pos.y)),
                GridPos::new(max.x.max(pos.x), max.y.max(pos.y)),
            )
        }))
    }

    /// Collect every tile (grid and off-grid) of the given kinds in world
    /// pixels. Unless `keep`, the matches are removed from the map.
    pub fn extract(&mut self, kinds: &[TileKind], keep: bool) -> Vec<PlacedTile> {
        let mut matches: Vec<PlacedTile> = self
            .offgrid
            .iter()
            .filter(|tile| kinds.contains(&tile.kind))
            .map(|tile| PlacedTile {
                kind: tile.kind,
                variant: tile.variant,
                pos: tile.pos,
            })
            .collect();

        let mut grid: Vec<&Tile> = self
            .tiles
            .values()
            .filter(|tile| kinds.contains(&tile.kind))
            .collect();
        // Map iteration order is random; keep extraction stable.
        grid.sort_by_key(|tile| (tile.pos.y, tile.pos.x));
        matches.extend(grid.into_iter().map(|tile| PlacedTile {
            kind: tile.kind,
            variant: tile.variant,
            pos: self.grid_to_world(tile.pos),
        }));

        if !keep {
            self.offgrid.retain(|tile| !kinds.contains(&tile.kind));
            self.tiles.retain(|_, tile| !kinds.contains(&tile.kind));
        }
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stone(x: i32, y: i32) -> Tile {
        Tile::new(TileKind::Stone, 0, GridPos::new(x, y))
    }

    #[test]
    fn set_get_remove_roundtrip() {
        let mut map = Tilemap::default();
        assert!(map.set_tile(stone(2, 3)).is_none());
        assert_eq!(map.get_tile(GridPos::new(2, 3)), Some(&stone(2, 3)));

        let replaced = map.set_tile(Tile::new(TileKind::Granite, 4, GridPos::new(2, 3)));
        assert_eq!(replaced, Some(stone(2, 3)));
        assert_eq!(map.tile_count(), 1);

        assert!(map.remove_tile(GridPos::new(2, 3)).is_some());
        assert!(map.get_tile(GridPos::new(2, 3)).is_none());
    }

    #[test]
    fn neighbors_excludes_center_and_offgrid() {
        let mut map = Tilemap::default();
        map.set_tile(stone(0, 0));
        map.set_tile(stone(1, 0));
        map.set_tile(stone(-1, 1));
        map.set_tile(stone(3, 3));
        map.add_offgrid(OffgridTile {
            kind: TileKind::Decor,
            variant: 0,
            pos: Vec2::new(4.0, 4.0),
        });

        let mut found: Vec<GridPos> = map.neighbors(GridPos::new(0, 0)).map(|t| t.pos).collect();
        found.sort();
        assert_eq!(found, vec![GridPos::new(-1, 1), GridPos::new(1, 0)]);
    }

    #[test]
    fn full_neighborhood_has_eight_tiles() {
        let mut map = Tilemap::default();
        for y in -1..=1 {
            for x in -1..=1 {
                map.set_tile(stone(x, y));
            }
        }
        assert_eq!(map.neighbors(GridPos::new(0, 0)).count(), 8);
    }

    #[test]
    fn world_to_grid_floors_negative_coordinates() {
        let map = Tilemap::new(16);
        assert_eq!(map.world_to_grid(Vec2::new(-0.5, 15.9)), GridPos::new(-1, 0));
        assert_eq!(map.world_to_grid(Vec2::new(32.0, -16.0)), GridPos::new(2, -1));
    }

    #[test]
    fn decor_is_not_solid() {
        let mut map = Tilemap::default();
        map.set_tile(Tile::new(TileKind::Decor, 0, GridPos::new(0, 0)));
        map.set_tile(stone(1, 0));
        assert!(!map.is_solid(GridPos::new(0, 0)));
        assert!(map.is_solid(GridPos::new(1, 0)));
        assert_eq!(map.solid_rects_around(Vec2::new(8.0, 8.0)).len(), 1);
    }

    #[test]
    #[should_panic(expected = "outside tilemap extent")]
    fn set_tile_out_of_extent_panics() {
        let mut map = Tilemap::default();
        map.set_tile(stone(MAX_GRID_EXTENT + 1, 0));
    }

    #[test]
    fn extract_removes_matches_in_pixel_space() {
        let mut map = Tilemap::new(16);
        map.set_tile(Tile::new(TileKind::Spawners, 0, GridPos::new(2, 1)));
        map.set_tile(stone(0, 2));
        map.add_offgrid(OffgridTile {
            kind: TileKind::Spawners,
            variant: 1,
            pos: Vec2::new(7.5, 3.0),
        });

        let found = map.extract(&[TileKind::Spawners], false);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].pos, Vec2::new(7.5, 3.0));
        assert_eq!(found[1].pos, Vec2::new(32.0, 16.0));
        assert_eq!(map.tile_count(), 1);
        assert!(map.offgrid().is_empty());
    }

    #[test]
    fn extract_keep_leaves_map_untouched() {
        let mut map = Tilemap::new(16);
        map.set_tile(Tile::new(TileKind::Spike, 2, GridPos::new(0, 0)));
        let before = map.clone();
        assert_eq!(map.extract(&[TileKind::Spike], true).len(), 1);
        assert_eq!(map, before);
    }

    #[test]
    fn remove_offgrid_at_hits_footprint_only() {
        let mut map = Tilemap::new(16);
        map.add_offgrid(OffgridTile {
            kind: TileKind::Decor,
            variant: 1,
            pos: Vec2::new(10.0, 10.0),
        });
        assert_eq!(map.remove_offgrid_at(Vec2::new(40.0, 40.0)), 0);
        assert_eq!(map.remove_offgrid_at(Vec2::new(20.0, 12.0)), 1);
    }

    #[test]
    fn grid_bounds_cover_all_tiles() {
        let mut map = Tilemap::default();
        assert!(map.grid_bounds().is_none());
        map.set_tile(stone(-2, 5));
        map.set_tile(stone(7, -1));
        assert_eq!(
            map.grid_bounds(),
            Some((GridPos::new(-2, -1), GridPos::new(7, 5)))
        );
    }

    #[test]
    fn grid_key_roundtrip() {
        let pos = GridPos::new(-3, 12);
        assert_eq!(pos.key(), "-3;12");
        assert_eq!(GridPos::parse_key("-3;12"), Some(pos));
        assert_eq!(GridPos::parse_key("3,12"), None);
    }

    #[test]
    fn tile_kind_parses_known_names_only() {
        assert_eq!("large_decor".parse::<TileKind>(), Ok(TileKind::LargeDecor));
        assert!("lava".parse::<TileKind>().is_err());
    }
}
