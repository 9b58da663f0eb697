use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use tt_platform::window::PlatformConfig;

use crate::controller::ControllerConfig;
use crate::error::ConfigError;
use crate::patrol::PatrolConfig;

pub const DEFAULT_CONFIG_PATH: &str = "assets/config/game.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_resizable")]
    pub resizable: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            width: default_width(),
            height: default_height(),
            resizable: default_resizable(),
        }
    }
}

impl WindowConfig {
    pub fn to_platform(&self) -> PlatformConfig {
        PlatformConfig {
            title: self.title.clone(),
            width: self.width,
            height: self.height,
            resizable: self.resizable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplayConfig {
    pub player: ControllerConfig,
    pub enemy: PatrolConfig,
    /// Fixed steps spent in a level or respawn transition.
    pub transition_steps: u32,
    /// How far below the lowest tile a body may fall before it dies.
    pub kill_margin_tiles: i32,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            player: ControllerConfig::default(),
            enemy: PatrolConfig::default(),
            transition_steps: 30,
            kill_margin_tiles: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub window: WindowConfig,
    /// Screen pixels per world pixel.
    pub zoom: f32,
    pub camera_follow_rate: f32,
    pub gameplay: GameplayConfig,
    pub maps_dir: PathBuf,
    pub start_level: u32,
    /// When set, checkpoints also persist across runs.
    pub checkpoint_file: Option<PathBuf>,
    pub hot_reload: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            zoom: 2.0,
            camera_follow_rate: 8.0,
            gameplay: GameplayConfig::default(),
            maps_dir: PathBuf::from("assets/maps"),
            start_level: 0,
            checkpoint_file: None,
            hot_reload: true,
        }
    }
}

pub fn load_config(path: &Path) -> Result<GameConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: GameConfig = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Missing or broken config falls back to defaults; the game still starts.
pub fn load_or_default(path: &Path) -> GameConfig {
    match load_config(path) {
        Ok(config) => {
            log::info!("Loaded config {}", path.display());
            config
        }
        Err(ConfigError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            log::warn!("No config at {}, using defaults", path.display());
            GameConfig::default()
        }
        Err(e) => {
            log::warn!("{e}; using defaults");
            GameConfig::default()
        }
    }
}

fn validate_config(config: &GameConfig) -> Result<(), ConfigError> {
    if !(config.zoom > 0.0) {
        return Err(ConfigError::Invalid(format!(
            "zoom must be > 0, got {}",
            config.zoom
        )));
    }
    if config.window.width == 0 || config.window.height == 0 {
        return Err(ConfigError::Invalid(
            "window width and height must be > 0".to_string(),
        ));
    }
    let player = &config.gameplay.player;
    if !(player.dash_duration > 0.0) || !(player.max_fall_speed > 0.0) {
        return Err(ConfigError::Invalid(
            "player dash_duration and max_fall_speed must be > 0".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&player.dash_exit_factor) {
        return Err(ConfigError::Invalid(format!(
            "dash_exit_factor must be within 0..=1, got {}",
            player.dash_exit_factor
        )));
    }
    Ok(())
}

fn default_title() -> String {
    "tiptoe".to_string()
}

const fn default_width() -> u32 {
    960
}

const fn default_height() -> u32 {
    630
}

const fn default_resizable() -> bool {
    true
}
