//! Respawn points. `CheckpointStore` holds the single active checkpoint of a
//! play session; `CheckpointFile` is the optional on-disk record keyed by
//! level id, last write wins.

use glam::Vec2;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CheckpointError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Checkpoint {
    pub level_id: u32,
    pub position: Vec2,
}

#[derive(Debug, Clone, Default)]
pub struct CheckpointStore {
    active: Option<Checkpoint>,
}

impl CheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites whatever was saved before, for any level.
    pub fn save(&mut self, level_id: u32, position: Vec2) {
        if let Some(previous) = self.active {
            if previous.level_id != level_id {
                log::debug!(
                    "Checkpoint for level {} replaced by level {level_id}",
                    previous.level_id
                );
            }
        }
        self.active = Some(Checkpoint { level_id, position });
    }

    pub fn restore(&self, level_id: u32) -> Option<Vec2> {
        self.active
            .filter(|checkpoint| checkpoint.level_id == level_id)
            .map(|checkpoint| checkpoint.position)
    }

    /// Returns whether a checkpoint for `level_id` was removed.
    pub fn delete(&mut self, level_id: u32) -> bool {
        if self.restore(level_id).is_some() {
            self.active = None;
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.active = None;
    }

    pub fn active(&self) -> Option<Checkpoint> {
        self.active
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckpointFile {
    path: PathBuf,
    entries: BTreeMap<u32, [f32; 2]>,
}

impl CheckpointFile {
    /// A missing file is an empty record, not an error.
    pub fn load(path: &Path) -> Result<Self, CheckpointError> {
        let entries = match fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| CheckpointError::Parse {
                path: path.to_path_buf(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => {
                return Err(CheckpointError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn save(&self) -> Result<(), CheckpointError> {
        let io_err = |source| CheckpointError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let raw = serde_json::to_string_pretty(&self.entries).map_err(|source| {
            CheckpointError::Parse {
                path: self.path.clone(),
                source,
            }
        })?;
        fs::write(&self.path, raw).map_err(io_err)
    }

    pub fn put(&mut self, level_id: u32, position: Vec2) {
        self.entries.insert(level_id, position.to_array());
    }

    pub fn get(&self, level_id: u32) -> Option<Vec2> {
        self.entries.get(&level_id).copied().map(Vec2::from_array)
    }

    pub fn remove(&mut self, level_id: u32) -> Option<Vec2> {
        self.entries.remove(&level_id).map(Vec2::from_array)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
