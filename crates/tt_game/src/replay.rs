//! Recorded input sequences, played back through a session without a window.

use glam::Vec2;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::controller::ControllerInput;
use crate::error::ReplayError;
use crate::level::LevelSource;
use crate::session::{FrameIntent, GameSession, GameState};

#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySequence {
    #[serde(default = "default_dt")]
    pub fixed_dt: f32,
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplayFrame {
    #[serde(default)]
    pub move_x: f32,
    #[serde(default)]
    pub jump_pressed: bool,
    #[serde(default)]
    pub dash_pressed: bool,
    #[serde(default)]
    pub save_checkpoint: bool,
    #[serde(default)]
    pub restore_checkpoint: bool,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

impl ReplaySequence {
    pub fn expanded_intents(&self) -> Vec<FrameIntent> {
        let mut out = Vec::new();
        for frame in &self.frames {
            for _ in 0..frame.repeat.max(1) {
                out.push(FrameIntent {
                    movement: ControllerInput {
                        move_x: frame.move_x.clamp(-1.0, 1.0),
                        jump_pressed: frame.jump_pressed,
                        dash_pressed: frame.dash_pressed,
                    },
                    save_checkpoint: frame.save_checkpoint,
                    restore_checkpoint: frame.restore_checkpoint,
                    delete_checkpoint: false,
                });
            }
        }
        out
    }
}

pub fn load_replay_from_path(path: &Path) -> Result<ReplaySequence, ReplayError> {
    let raw = fs::read_to_string(path).map_err(|source| ReplayError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let replay: ReplaySequence =
        serde_json::from_str(&raw).map_err(|source| ReplayError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    validate_replay(&replay)?;
    Ok(replay)
}

fn validate_replay(replay: &ReplaySequence) -> Result<(), ReplayError> {
    if replay.fixed_dt <= 0.0 {
        return Err(ReplayError::Invalid("fixed_dt must be > 0".to_string()));
    }
    if replay.frames.is_empty() {
        return Err(ReplayError::Invalid("frames list is empty".to_string()));
    }
    Ok(())
}

/// Where a headless run ended up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayOutcome {
    pub state: GameState,
    pub level_id: u32,
    pub player_position: Vec2,
    pub deaths: u32,
    pub elapsed: f64,
    pub steps: usize,
}

/// Start a run and feed it every frame of `replay`.
pub fn run_replay<S: LevelSource>(
    session: &mut GameSession<S>,
    replay: &ReplaySequence,
) -> ReplayOutcome {
    session.confirm();
    let intents = replay.expanded_intents();
    for intent in &intents {
        session.step(*intent, replay.fixed_dt);
    }
    ReplayOutcome {
        state: session.state(),
        level_id: session.level().level_id,
        player_position: session.player().body.position(),
        deaths: session.deaths(),
        elapsed: session.timer().elapsed(),
        steps: intents.len(),
    }
}

const fn default_dt() -> f32 {
    1.0 / 60.0
}

const fn default_repeat() -> u32 {
    1
}
