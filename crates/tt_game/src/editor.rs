//! Level editing operations, independent of any window. The `tt_editor`
//! binary maps mouse and keys onto these.

use glam::Vec2;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::autotile::{autotile_all, autotile_around};
use crate::error::{EditorError, LevelError};
use crate::level::{read_level_file, validate_spawners, write_level_file, LevelDocument};
use crate::tilemap::{GridPos, OffgridTile, Tile, TileKind, Tilemap, DEFAULT_TILE_SIZE};

/// Minimum gap between two saves; holding the save key writes once.
pub const SAVE_DEBOUNCE: Duration = Duration::from_millis(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Brush {
    pub kind: TileKind,
    pub variant: u32,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            kind: TileKind::ALL[0],
            variant: 0,
        }
    }
}

#[derive(Debug)]
pub struct Editor {
    path: PathBuf,
    document: LevelDocument,
    pub brush: Brush,
    /// Place tiles snapped to the grid; otherwise at the exact cursor point.
    pub ongrid: bool,
    /// Re-pick stone and granite variants after every edit.
    pub auto_tile: bool,
    save_generation: u32,
    last_save: Option<Instant>,
    dirty: bool,
}

impl Editor {
    /// Open `path` for editing. A file that does not exist yet starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LevelError> {
        let path = path.into();
        let document = match read_level_file(&path) {
            Ok(document) => document,
            Err(LevelError::Missing { .. }) => {
                log::warn!("{} does not exist yet, starting empty", path.display());
                LevelDocument {
                    stage: 0,
                    tilemap: Tilemap::new(DEFAULT_TILE_SIZE),
                }
            }
            Err(e) => return Err(e),
        };
        Ok(Self {
            path,
            document,
            brush: Brush::default(),
            ongrid: true,
            auto_tile: false,
            save_generation: 0,
            last_save: None,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tilemap(&self) -> &Tilemap {
        &self.document.tilemap
    }

    pub fn document(&self) -> &LevelDocument {
        &self.document
    }

    pub fn save_generation(&self) -> u32 {
        self.save_generation
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Replace the edited level with the one at `path`. On failure the
    /// current edit is kept.
    pub fn load(&mut self, path: &Path) -> Result<(), EditorError> {
        let document = read_level_file(path)?;
        log::info!(
            "Editing {} ({} tiles)",
            path.display(),
            document.tilemap.tile_count()
        );
        self.document = document;
        self.path = path.to_path_buf();
        self.dirty = false;
        Ok(())
    }

    /// Write the level to `path` if its spawners are valid and the last save
    /// was long enough ago.
    pub fn save(&mut self, path: &Path) -> Result<(), EditorError> {
        self.save_at(path, Instant::now())
    }

    pub fn save_current(&mut self) -> Result<(), EditorError> {
        let path = self.path.clone();
        self.save(&path)
    }

    fn save_at(&mut self, path: &Path, now: Instant) -> Result<(), EditorError> {
        if let Some(last) = self.last_save {
            if now.saturating_duration_since(last) < SAVE_DEBOUNCE {
                return Err(EditorError::Debounced);
            }
        }
        validate_spawners(&self.document.tilemap).map_err(EditorError::Spawners)?;
        write_level_file(path, &self.document)?;
        self.last_save = Some(now);
        self.save_generation += 1;
        self.dirty = false;
        Ok(())
    }

    /// Place the brush at a grid cell.
    pub fn paint(&mut self, pos: GridPos) {
        if !pos.in_extent() {
            log::warn!("Ignoring paint outside the grid at ({}, {})", pos.x, pos.y);
            return;
        }
        let tile = Tile::new(self.brush.kind, self.brush.variant, pos);
        if self.document.tilemap.get_tile(pos) == Some(&tile) {
            return;
        }
        self.document.tilemap.set_tile(tile);
        self.after_grid_edit(pos);
    }

    /// Place the brush with its top-left corner at a world point.
    pub fn paint_offgrid(&mut self, point: Vec2) {
        self.document.tilemap.add_offgrid(OffgridTile {
            kind: self.brush.kind,
            variant: self.brush.variant,
            pos: point,
        });
        self.dirty = true;
    }

    /// Paint at the cursor, honouring the grid mode.
    pub fn paint_at(&mut self, point: Vec2) {
        if self.ongrid {
            let pos = self.document.tilemap.world_to_grid(point);
            self.paint(pos);
        } else {
            self.paint_offgrid(point);
        }
    }

    /// Remove the grid tile at `pos`.
    pub fn erase(&mut self, pos: GridPos) -> Option<Tile> {
        if !pos.in_extent() {
            return None;
        }
        let removed = self.document.tilemap.remove_tile(pos);
        if removed.is_some() {
            self.after_grid_edit(pos);
        }
        removed
    }

    /// Remove everything under the cursor: the grid tile and any off-grid
    /// tiles covering the point.
    pub fn erase_at(&mut self, point: Vec2) -> usize {
        let pos = self.document.tilemap.world_to_grid(point);
        let grid = usize::from(self.erase(pos).is_some());
        let offgrid = self.document.tilemap.remove_offgrid_at(point);
        if offgrid > 0 {
            self.dirty = true;
        }
        grid + offgrid
    }

    pub fn cycle_kind(&mut self, step: i32) {
        self.brush.kind = cycle(&TileKind::ALL, self.brush.kind, step);
        self.brush.variant = 0;
    }

    pub fn cycle_variant(&mut self, step: i32) {
        let count = self.brush.kind.variant_count() as i32;
        self.brush.variant = (self.brush.variant as i32 + step).rem_euclid(count) as u32;
    }

    pub fn toggle_ongrid(&mut self) {
        self.ongrid = !self.ongrid;
    }

    pub fn toggle_auto_tile(&mut self) {
        self.auto_tile = !self.auto_tile;
    }

    pub fn autotile_all(&mut self) -> usize {
        let changed = autotile_all(&mut self.document.tilemap);
        if changed > 0 {
            self.dirty = true;
        }
        changed
    }

    fn after_grid_edit(&mut self, pos: GridPos) {
        if self.auto_tile {
            autotile_around(&mut self.document.tilemap, pos);
        }
        self.dirty = true;
    }
}

fn cycle<T: Copy + PartialEq>(items: &[T], current: T, step: i32) -> T {
    let index = items.iter().position(|item| *item == current).unwrap_or(0) as i32;
    items[(index + step).rem_euclid(items.len() as i32) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{SPAWNER_PLAYER, SPAWNER_PORTAL};

    fn editor_in(dir: &tempfile::TempDir) -> Editor {
        Editor::open(dir.path().join("0.json")).expect("missing file opens empty")
    }

    fn place_player(editor: &mut Editor) {
        editor.brush = Brush {
            kind: TileKind::Spawners,
            variant: SPAWNER_PLAYER,
        };
        editor.paint(GridPos::new(1, 1));
    }

    #[test]
    fn missing_level_opens_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let editor = editor_in(&dir);
        assert!(editor.tilemap().is_empty());
        assert_eq!(editor.tilemap().tile_size(), DEFAULT_TILE_SIZE);
    }

    #[test]
    fn paint_save_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut editor = editor_in(&dir);
        editor.brush = Brush {
            kind: TileKind::Stone,
            variant: 4,
        };
        for x in 0..5 {
            editor.paint(GridPos::new(x, 3));
        }
        editor.brush = Brush {
            kind: TileKind::Decor,
            variant: 2,
        };
        editor.ongrid = false;
        editor.paint_at(Vec2::new(13.5, 7.25));
        editor.ongrid = true;
        place_player(&mut editor);

        let path = dir.path().join("0.json");
        editor.save(&path).expect("save");
        assert_eq!(editor.save_generation(), 1);
        assert!(!editor.is_dirty());

        let reopened = Editor::open(&path).expect("reopen");
        assert_eq!(reopened.tilemap(), editor.tilemap());
        assert_eq!(reopened.tilemap().tile_count(), 6);
    }

    #[test]
    fn save_refuses_invalid_spawners_and_writes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut editor = editor_in(&dir);
        let path = dir.path().join("0.json");
        assert!(matches!(editor.save(&path), Err(EditorError::Spawners(_))));
        assert!(!path.exists());

        place_player(&mut editor);
        editor.brush = Brush {
            kind: TileKind::Spawners,
            variant: SPAWNER_PORTAL,
        };
        editor.paint(GridPos::new(5, 1));
        editor.paint(GridPos::new(6, 1));
        assert!(matches!(editor.save(&path), Err(EditorError::Spawners(_))));
        editor.erase(GridPos::new(6, 1));
        editor.save(&path).expect("one portal is fine");
    }

    #[test]
    fn saves_are_debounced() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut editor = editor_in(&dir);
        place_player(&mut editor);
        let path = dir.path().join("0.json");

        let t0 = Instant::now();
        editor.save_at(&path, t0).expect("first save");
        assert!(matches!(
            editor.save_at(&path, t0 + Duration::from_millis(50)),
            Err(EditorError::Debounced)
        ));
        editor
            .save_at(&path, t0 + SAVE_DEBOUNCE)
            .expect("save after the debounce window");
        assert_eq!(editor.save_generation(), 2);
    }

    #[test]
    fn auto_tile_applies_after_each_edit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut editor = editor_in(&dir);
        editor.auto_tile = true;
        editor.brush = Brush {
            kind: TileKind::Granite,
            variant: 0,
        };
        for y in 0..3 {
            for x in 0..3 {
                editor.paint(GridPos::new(x, y));
            }
        }
        let center = editor.tilemap().get_tile(GridPos::new(1, 1)).unwrap();
        assert_eq!(center.variant, 8);
        let corner = editor.tilemap().get_tile(GridPos::new(2, 2)).unwrap();
        assert_eq!(corner.variant, 4);

        editor.erase(GridPos::new(2, 1));
        // Bottom right corner lost its north neighbour: W only, unchanged.
        assert_eq!(editor.tilemap().get_tile(GridPos::new(2, 2)).unwrap().variant, 4);
        // Top right lost its south neighbour: W only, unchanged as well.
        assert_eq!(editor.tilemap().get_tile(GridPos::new(2, 0)).unwrap().variant, 2);
        // Centre lost its east neighbour: W|N|S.
        assert_eq!(editor.tilemap().get_tile(GridPos::new(1, 1)).unwrap().variant, 3);
    }

    #[test]
    fn erase_at_removes_grid_and_offgrid_under_cursor() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut editor = editor_in(&dir);
        editor.paint(GridPos::new(0, 0));
        editor.paint_offgrid(Vec2::new(4.0, 4.0));
        editor.paint_offgrid(Vec2::new(100.0, 100.0));

        assert_eq!(editor.erase_at(Vec2::new(8.0, 8.0)), 2);
        assert_eq!(editor.tilemap().tile_count(), 0);
        assert_eq!(editor.tilemap().offgrid().len(), 1);
    }

    #[test]
    fn brush_cycling_wraps() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut editor = editor_in(&dir);
        editor.cycle_kind(-1);
        assert_eq!(editor.brush.kind, TileKind::Stone);
        editor.cycle_variant(-1);
        assert_eq!(editor.brush.variant, 8);
        editor.cycle_variant(1);
        assert_eq!(editor.brush.variant, 0);
        editor.cycle_variant(3);
        editor.cycle_kind(1);
        assert_eq!(editor.brush, Brush::default());
    }

    #[test]
    fn failed_load_keeps_current_edit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut editor = editor_in(&dir);
        editor.paint(GridPos::new(2, 2));
        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ \"tile_size\": 16, \"tilemap\": 3 }").expect("write");
        assert!(editor.load(&bad).is_err());
        assert_eq!(editor.tilemap().tile_count(), 1);
        assert_eq!(editor.path(), dir.path().join("0.json"));
    }
}
