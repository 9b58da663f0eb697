//! Level files on disk and the playable `Level` built from them.
//!
//! A level file is JSON:
//!
//! ```json
//! { "version": "0.1", "stage": 0, "tile_size": 16,
//!   "tilemap": { "3;5": { "kind": "stone", "variant": 1, "pos": [3, 5] } },
//!   "offgrid": [ { "kind": "spawners", "variant": 0, "pos": [40.0, 60.0] } ] }
//! ```
//!
//! Grid tile positions are in cells and must match their key; off-grid
//! positions are world pixels.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::collision::Aabb;
use crate::error::LevelError;
use crate::tilemap::{GridPos, OffgridTile, Tile, TileKind, Tilemap};

pub const LEVEL_FILE_VERSION: &str = "0.1";

pub const SPAWNER_PLAYER: u32 = 0;
pub const SPAWNER_ENEMY: u32 = 1;
pub const SPAWNER_PORTAL: u32 = 2;

#[derive(Debug, Serialize, Deserialize)]
struct LevelFile {
    #[serde(default = "default_version")]
    version: String,
    #[serde(default)]
    stage: u32,
    tile_size: u32,
    #[serde(default)]
    tilemap: BTreeMap<String, TileRecord>,
    #[serde(default)]
    offgrid: Vec<OffgridRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TileRecord {
    kind: String,
    variant: u32,
    pos: [i32; 2],
}

#[derive(Debug, Serialize, Deserialize)]
struct OffgridRecord {
    kind: String,
    variant: u32,
    pos: [f32; 2],
}

/// Everything a level file holds: the tilemap as authored plus metadata.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LevelDocument {
    pub stage: u32,
    pub tilemap: Tilemap,
}

pub fn read_level_file(path: &Path) -> Result<LevelDocument, LevelError> {
    let raw = fs::read_to_string(path).map_err(|e| LevelError::from_io(path, e))?;
    let file: LevelFile = serde_json::from_str(&raw).map_err(|source| LevelError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    document_from_file(path, file)
}

pub fn write_level_file(path: &Path, document: &LevelDocument) -> Result<(), LevelError> {
    let file = file_from_document(document);
    let raw = serde_json::to_string_pretty(&file).map_err(|source| LevelError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| LevelError::from_io(parent, e))?;
    }
    fs::write(path, raw).map_err(|e| LevelError::from_io(path, e))?;
    log::info!(
        "Saved {} ({} tiles, {} off-grid)",
        path.display(),
        document.tilemap.tile_count(),
        document.tilemap.offgrid().len()
    );
    Ok(())
}

fn file_from_document(document: &LevelDocument) -> LevelFile {
    let map = &document.tilemap;
    LevelFile {
        version: default_version(),
        stage: document.stage,
        tile_size: map.tile_size(),
        tilemap: map
            .tiles()
            .map(|tile| {
                (
                    tile.pos.key(),
                    TileRecord {
                        kind: tile.kind.as_str().to_string(),
                        variant: tile.variant,
                        pos: [tile.pos.x, tile.pos.y],
                    },
                )
            })
            .collect(),
        offgrid: map
            .offgrid()
            .iter()
            .map(|tile| OffgridRecord {
                kind: tile.kind.as_str().to_string(),
                variant: tile.variant,
                pos: tile.pos.to_array(),
            })
            .collect(),
    }
}

fn document_from_file(path: &Path, file: LevelFile) -> Result<LevelDocument, LevelError> {
    if file.version != LEVEL_FILE_VERSION {
        log::warn!(
            "{}: level version '{}' (expected '{LEVEL_FILE_VERSION}')",
            path.display(),
            file.version
        );
    }
    if file.tile_size == 0 {
        return Err(LevelError::malformed(path, "tile_size must be > 0"));
    }

    let mut tilemap = Tilemap::new(file.tile_size);
    for (key, record) in file.tilemap {
        let pos = GridPos::parse_key(&key)
            .ok_or_else(|| LevelError::malformed(path, format!("bad tile key '{key}'")))?;
        if pos != GridPos::new(record.pos[0], record.pos[1]) {
            return Err(LevelError::malformed(
                path,
                format!("tile key '{key}' does not match pos {:?}", record.pos),
            ));
        }
        if !pos.in_extent() {
            return Err(LevelError::malformed(
                path,
                format!("tile '{key}' is outside the grid extent"),
            ));
        }
        let kind = parse_kind(path, &record.kind, record.variant)?;
        tilemap.set_tile(Tile::new(kind, record.variant, pos));
    }

    for record in file.offgrid {
        let kind = parse_kind(path, &record.kind, record.variant)?;
        let pos = Vec2::from_array(record.pos);
        if !pos.is_finite() {
            return Err(LevelError::malformed(path, "off-grid position is not finite"));
        }
        tilemap.add_offgrid(OffgridTile {
            kind,
            variant: record.variant,
            pos,
        });
    }

    Ok(LevelDocument {
        stage: file.stage,
        tilemap,
    })
}

fn parse_kind(path: &Path, name: &str, variant: u32) -> Result<TileKind, LevelError> {
    let kind: TileKind = name
        .parse()
        .map_err(|reason: String| LevelError::malformed(path, reason))?;
    if variant >= kind.variant_count() {
        return Err(LevelError::malformed(
            path,
            format!("{kind} variant {variant} out of range"),
        ));
    }
    Ok(kind)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpawnerCounts {
    pub players: usize,
    pub enemies: usize,
    pub portals: usize,
}

pub fn count_spawners(tilemap: &Tilemap) -> SpawnerCounts {
    let grid = tilemap.tiles_of_kind(TileKind::Spawners).map(|tile| tile.variant);
    let offgrid = tilemap
        .offgrid()
        .iter()
        .filter(|tile| tile.kind == TileKind::Spawners)
        .map(|tile| tile.variant);
    grid.chain(offgrid)
        .fold(SpawnerCounts::default(), |mut counts, variant| {
            match variant {
                SPAWNER_PLAYER => counts.players += 1,
                SPAWNER_ENEMY => counts.enemies += 1,
                SPAWNER_PORTAL => counts.portals += 1,
                _ => {}
            }
            counts
        })
}

/// Authoring rule: exactly one player spawner and at most one portal.
pub fn validate_spawners(tilemap: &Tilemap) -> Result<SpawnerCounts, String> {
    let counts = count_spawners(tilemap);
    if counts.players != 1 {
        return Err(format!(
            "need exactly one player spawner, found {}",
            counts.players
        ));
    }
    if counts.portals > 1 {
        return Err(format!(
            "at most one portal spawner allowed, found {}",
            counts.portals
        ));
    }
    Ok(counts)
}

/// Damage rectangle for a spike tile. Variant picks the wall it sits on:
/// 0 floor, 1 ceiling, 2 left wall, 3 right wall. The hitbox is inset along
/// the wall so grazing the tips is safe.
pub fn spike_hitbox(top_left: Vec2, variant: u32, tile_size: f32) -> Aabb {
    let thick = tile_size * 0.375;
    let grace = tile_size * 0.5;
    let (offset, size) = match variant {
        0 => (
            Vec2::new(grace * 0.5, tile_size - thick),
            Vec2::new(tile_size - grace, thick),
        ),
        1 => (Vec2::new(grace * 0.5, 0.0), Vec2::new(tile_size - grace, thick)),
        2 => (Vec2::new(0.0, grace * 0.5), Vec2::new(thick, tile_size - grace)),
        _ => (
            Vec2::new(tile_size - thick, grace * 0.5),
            Vec2::new(thick, tile_size - grace),
        ),
    };
    Aabb::from_min_size(top_left + offset, size)
}

/// A level ready to play. Spawner tiles have been pulled out of the
/// tilemap and turned into positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    pub level_id: u32,
    pub stage: u32,
    pub tilemap: Tilemap,
    /// Top-left corner of the player at level start.
    pub spawn: Vec2,
    pub enemy_spawns: Vec<Vec2>,
    pub portals: Vec<Aabb>,
    pub spikes: Vec<Aabb>,
}

impl Level {
    pub fn from_document(
        level_id: u32,
        document: LevelDocument,
        path: &Path,
    ) -> Result<Self, LevelError> {
        let LevelDocument { stage, mut tilemap } = document;
        let counts = count_spawners(&tilemap);
        if counts.players != 1 {
            return Err(LevelError::malformed(
                path,
                format!("need exactly one player spawner, found {}", counts.players),
            ));
        }

        let size = tilemap.tile_size_f32();
        let mut spawn = Vec2::ZERO;
        let mut enemy_spawns = Vec::new();
        let mut portals = Vec::new();
        for spawner in tilemap.extract(&[TileKind::Spawners], false) {
            match spawner.variant {
                SPAWNER_PLAYER => spawn = spawner.pos,
                SPAWNER_ENEMY => enemy_spawns.push(spawner.pos),
                _ => portals.push(Aabb::from_min_size(spawner.pos, Vec2::splat(size))),
            }
        }

        let spikes = tilemap
            .extract(&[TileKind::Spike], true)
            .into_iter()
            .map(|spike| spike_hitbox(spike.pos, spike.variant, size))
            .collect();

        Ok(Self {
            level_id,
            stage,
            tilemap,
            spawn,
            enemy_spawns,
            portals,
            spikes,
        })
    }

    /// Bodies whose top passes below this y have fallen out of the world.
    pub fn kill_plane_y(&self, margin_tiles: i32) -> f32 {
        let size = self.tilemap.tile_size_f32();
        let lowest = self
            .tilemap
            .grid_bounds()
            .map_or(0, |(_, max)| max.y + 1)
            .max((self.spawn.y / size).ceil() as i32);
        (lowest + margin_tiles) as f32 * size
    }
}

pub fn load_level(path: &Path, level_id: u32) -> Result<Level, LevelError> {
    let document = read_level_file(path)?;
    Level::from_document(level_id, document, path)
}

/// Where numbered levels come from.
pub trait LevelSource {
    fn load(&self, level_id: u32) -> Result<Level, LevelError>;

    fn level_count(&self) -> u32;

    /// Backing file, if the source has one; used for hot reload.
    fn path_for(&self, level_id: u32) -> Option<PathBuf>;
}

/// Levels stored as `<dir>/<id>.json`, numbered from 0 without gaps.
#[derive(Debug, Clone)]
pub struct LevelCatalog {
    dir: PathBuf,
}

impl LevelCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn level_path(&self, level_id: u32) -> PathBuf {
        self.dir.join(format!("{level_id}.json"))
    }
}

impl LevelSource for LevelCatalog {
    fn load(&self, level_id: u32) -> Result<Level, LevelError> {
        let path = self.level_path(level_id);
        let level = load_level(&path, level_id)?;
        log::info!(
            "Loaded level {level_id} from {} ({} tiles, {} enemies)",
            path.display(),
            level.tilemap.tile_count(),
            level.enemy_spawns.len()
        );
        Ok(level)
    }

    fn level_count(&self) -> u32 {
        (0..).take_while(|id| self.level_path(*id).is_file()).count() as u32
    }

    fn path_for(&self, level_id: u32) -> Option<PathBuf> {
        Some(self.level_path(level_id))
    }
}

fn default_version() -> String {
    LEVEL_FILE_VERSION.to_string()
}
