//! The play session: which level is active, where the player and enemies are,
//! the checkpoint, the run timer, and the menu/play/pause/transition state
//! machine that ties them together. One fixed step at a time.

use glam::Vec2;

use tt_core::timer::SpeedrunTimer;

use crate::checkpoint::{Checkpoint, CheckpointFile, CheckpointStore};
use crate::config::GameplayConfig;
use crate::controller::ControllerInput;
use crate::entity::Entity;
use crate::error::LevelError;
use crate::level::{Level, LevelSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathCause {
    Spikes,
    Enemy,
    FellOut,
    Freefall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionReason {
    LevelComplete,
    Death(DeathCause),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Menu,
    Playing,
    Paused,
    Transition(TransitionReason),
}

/// What the player asked for this step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameIntent {
    pub movement: ControllerInput,
    pub save_checkpoint: bool,
    pub restore_checkpoint: bool,
    pub delete_checkpoint: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEvent {
    Started { level_id: u32 },
    Paused,
    Resumed,
    ExitedToMenu,
    CheckpointSaved(Vec2),
    CheckpointRestored(Vec2),
    CheckpointDeleted,
    EnemyDefeated,
    Died(DeathCause),
    Respawned(Vec2),
    LevelComplete { level_id: u32, time: f64 },
    LevelLoaded { level_id: u32 },
    LevelLoadFailed { level_id: u32 },
    RunFinished { time: f64 },
}

pub struct GameSession<S: LevelSource> {
    source: S,
    config: GameplayConfig,
    start_level: u32,
    state: GameState,
    level: Level,
    /// Catalog size as of the last level load.
    level_count: u32,
    player: Entity,
    enemies: Vec<Entity>,
    level_had_enemies: bool,
    checkpoints: CheckpointStore,
    checkpoint_file: Option<CheckpointFile>,
    timer: SpeedrunTimer,
    transition_left: u32,
    deaths: u32,
    events: Vec<SessionEvent>,
}

impl<S: LevelSource> GameSession<S> {
    /// Loads `start_level` and waits in the menu.
    pub fn new(source: S, config: GameplayConfig, start_level: u32) -> Result<Self, LevelError> {
        let level = source.load(start_level)?;
        let player = Entity::player(level.spawn, &config);
        let level_count = source.level_count();
        let mut session = Self {
            source,
            config,
            start_level,
            state: GameState::Menu,
            level,
            level_count,
            player,
            enemies: Vec::new(),
            level_had_enemies: false,
            checkpoints: CheckpointStore::new(),
            checkpoint_file: None,
            timer: SpeedrunTimer::new(),
            transition_left: 0,
            deaths: 0,
            events: Vec::new(),
        };
        session.spawn_enemies();
        Ok(session)
    }

    /// Mirror checkpoints into `file` so they survive restarts.
    pub fn with_checkpoint_file(mut self, file: CheckpointFile) -> Self {
        self.checkpoint_file = Some(file);
        self
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn level_count(&self) -> u32 {
        self.level_count
    }

    pub fn player(&self) -> &Entity {
        &self.player
    }

    pub fn enemies(&self) -> &[Entity] {
        &self.enemies
    }

    pub fn timer(&self) -> &SpeedrunTimer {
        &self.timer
    }

    pub fn deaths(&self) -> u32 {
        self.deaths
    }

    pub fn checkpoint(&self) -> Option<Checkpoint> {
        self.checkpoints.active()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &GameplayConfig {
        &self.config
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Menu → Playing. Always starts a fresh run from the start level.
    pub fn confirm(&mut self) {
        if self.state != GameState::Menu {
            return;
        }
        if self.level.level_id != self.start_level {
            match self.source.load(self.start_level) {
                Ok(level) => self.install_level(level),
                Err(e) => {
                    log::error!("Cannot start run: {e}");
                    self.events.push(SessionEvent::LevelLoadFailed {
                        level_id: self.start_level,
                    });
                    return;
                }
            }
        } else {
            self.reset_level_entities();
        }
        self.checkpoints.clear();
        self.load_persisted_checkpoint();
        self.deaths = 0;
        self.timer.start();
        self.state = GameState::Playing;
        log::info!("Run started at level {}", self.level.level_id);
        self.events.push(SessionEvent::Started {
            level_id: self.level.level_id,
        });
    }

    pub fn pause(&mut self) {
        if self.state == GameState::Playing {
            self.state = GameState::Paused;
            self.timer.pause();
            self.events.push(SessionEvent::Paused);
        }
    }

    pub fn resume(&mut self) {
        if self.state == GameState::Paused {
            self.state = GameState::Playing;
            self.timer.resume();
            self.events.push(SessionEvent::Resumed);
        }
    }

    /// Paused → Menu. The run is abandoned.
    pub fn exit_to_menu(&mut self) {
        if self.state == GameState::Paused {
            self.state = GameState::Menu;
            self.timer.pause();
            self.checkpoints.clear();
            self.events.push(SessionEvent::ExitedToMenu);
        }
    }

    pub fn step(&mut self, intent: FrameIntent, dt: f32) {
        match self.state {
            GameState::Menu | GameState::Paused => {}
            GameState::Playing => {
                self.play_step(intent, dt);
                self.timer.tick(f64::from(dt));
            }
            GameState::Transition(reason) => {
                self.transition_left = self.transition_left.saturating_sub(1);
                if self.transition_left == 0 {
                    self.finish_transition(reason);
                }
                self.timer.tick(f64::from(dt));
            }
        }
    }

    /// Re-read the active level from its source. The player keeps its state;
    /// enemies respawn. On failure nothing changes.
    pub fn reload_current(&mut self) -> Result<(), LevelError> {
        let level_id = self.level.level_id;
        match self.source.load(level_id) {
            Ok(level) => {
                log::info!("Reloaded level {level_id}");
                self.level = level;
                self.level_count = self.source.level_count();
                self.spawn_enemies();
                self.events.push(SessionEvent::LevelLoaded { level_id });
                Ok(())
            }
            Err(e) => {
                log::error!("Reload of level {level_id} failed, keeping current: {e}");
                self.events.push(SessionEvent::LevelLoadFailed { level_id });
                Err(e)
            }
        }
    }

    fn play_step(&mut self, intent: FrameIntent, dt: f32) {
        self.handle_checkpoint_intent(intent);

        let player_events = self
            .player
            .step(intent.movement, &self.config, dt, &self.level.tilemap);
        let kill_y = self.level.kill_plane_y(self.config.kill_margin_tiles);
        for enemy in &mut self.enemies {
            enemy.step(ControllerInput::default(), &self.config, dt, &self.level.tilemap);
        }
        self.enemies.retain(|enemy| enemy.body.aabb.top() <= kill_y);

        let player_box = self.player.body.aabb;
        let dashing = self.player.is_dashing();
        let mut killed_by_enemy = false;
        let before = self.enemies.len();
        self.enemies.retain(|enemy| {
            if !enemy.body.aabb.overlaps(&player_box) {
                return true;
            }
            if dashing {
                return false;
            }
            killed_by_enemy = true;
            true
        });
        for _ in self.enemies.len()..before {
            self.events.push(SessionEvent::EnemyDefeated);
        }

        let cause = if killed_by_enemy {
            Some(DeathCause::Enemy)
        } else if self.level.spikes.iter().any(|spike| spike.overlaps(&player_box)) {
            Some(DeathCause::Spikes)
        } else if player_box.top() > kill_y {
            Some(DeathCause::FellOut)
        } else if player_events.freefall {
            Some(DeathCause::Freefall)
        } else {
            None
        };

        if let Some(cause) = cause {
            self.begin_transition(TransitionReason::Death(cause));
            return;
        }

        let touched_portal = self
            .level
            .portals
            .iter()
            .any(|portal| portal.overlaps(&player_box));
        let cleared = self.level_had_enemies && self.enemies.is_empty();
        if touched_portal || cleared {
            self.begin_transition(TransitionReason::LevelComplete);
        }
    }

    fn handle_checkpoint_intent(&mut self, intent: FrameIntent) {
        let level_id = self.level.level_id;
        if intent.delete_checkpoint && self.checkpoints.delete(level_id) {
            if let Some(file) = &mut self.checkpoint_file {
                file.remove(level_id);
            }
            self.persist_checkpoints();
            self.events.push(SessionEvent::CheckpointDeleted);
        }
        if intent.save_checkpoint {
            if self.player.body.grounded {
                let position = self.player.body.position();
                self.checkpoints.save(level_id, position);
                if let Some(file) = &mut self.checkpoint_file {
                    file.put(level_id, position);
                }
                self.persist_checkpoints();
                log::debug!("Checkpoint saved at {position}");
                self.events.push(SessionEvent::CheckpointSaved(position));
            } else {
                log::debug!("Checkpoint save ignored while airborne");
            }
        }
        if intent.restore_checkpoint {
            if let Some(position) = self.checkpoints.restore(level_id) {
                self.player.respawn(position, &self.config);
                self.events.push(SessionEvent::CheckpointRestored(position));
            }
        }
    }

    fn begin_transition(&mut self, reason: TransitionReason) {
        match reason {
            TransitionReason::LevelComplete => {
                let segment = self.timer.current_segment();
                self.timer.split();
                log::info!("Level {} complete in {segment:.3}s", self.level.level_id);
                self.events.push(SessionEvent::LevelComplete {
                    level_id: self.level.level_id,
                    time: self.timer.elapsed(),
                });
            }
            TransitionReason::Death(cause) => {
                self.deaths += 1;
                log::info!("Player died ({cause:?}), deaths: {}", self.deaths);
                self.events.push(SessionEvent::Died(cause));
            }
        }
        self.state = GameState::Transition(reason);
        self.transition_left = self.config.transition_steps;
        if self.transition_left == 0 {
            self.finish_transition(reason);
        }
    }

    fn finish_transition(&mut self, reason: TransitionReason) {
        match reason {
            TransitionReason::LevelComplete => self.advance_level(),
            TransitionReason::Death(_) => {
                let position = self
                    .checkpoints
                    .restore(self.level.level_id)
                    .unwrap_or(self.level.spawn);
                self.player.respawn(position, &self.config);
                self.spawn_enemies();
                self.state = GameState::Playing;
                self.events.push(SessionEvent::Respawned(position));
            }
        }
    }

    fn advance_level(&mut self) {
        let next = self.level.level_id + 1;
        self.level_count = self.source.level_count();
        if next >= self.level_count {
            self.timer.pause();
            self.checkpoints.clear();
            self.state = GameState::Menu;
            log::info!("Run finished in {:.3}s", self.timer.elapsed());
            self.events.push(SessionEvent::RunFinished {
                time: self.timer.elapsed(),
            });
            return;
        }

        match self.source.load(next) {
            Ok(level) => {
                self.install_level(level);
                self.load_persisted_checkpoint();
                self.events.push(SessionEvent::LevelLoaded { level_id: next });
            }
            Err(e) => {
                log::error!("Failed to load level {next}, staying on current: {e}");
                self.reset_level_entities();
                self.events.push(SessionEvent::LevelLoadFailed { level_id: next });
            }
        }
        self.state = GameState::Playing;
    }

    fn install_level(&mut self, level: Level) {
        self.level = level;
        self.level_count = self.source.level_count();
        self.checkpoints.clear();
        self.reset_level_entities();
    }

    fn reset_level_entities(&mut self) {
        self.player = Entity::player(self.level.spawn, &self.config);
        self.spawn_enemies();
    }

    fn spawn_enemies(&mut self) {
        self.enemies = self
            .level
            .enemy_spawns
            .iter()
            .map(|&pos| Entity::enemy(pos, &self.config))
            .collect();
        self.level_had_enemies = !self.enemies.is_empty();
    }

    fn load_persisted_checkpoint(&mut self) {
        let level_id = self.level.level_id;
        if let Some(position) = self.checkpoint_file.as_ref().and_then(|f| f.get(level_id)) {
            self.checkpoints.save(level_id, position);
        }
    }

    fn persist_checkpoints(&self) {
        if let Some(file) = &self.checkpoint_file {
            if let Err(e) = file.save() {
                log::error!("{e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{LevelDocument, SPAWNER_ENEMY, SPAWNER_PLAYER, SPAWNER_PORTAL};
    use crate::tilemap::{GridPos, OffgridTile, Tile, TileKind, Tilemap};
    use std::path::PathBuf;

    const DT: f32 = 1.0 / 60.0;

    /// Levels kept in memory. `count` may exceed the stored levels to
    /// simulate a catalog entry whose file is broken.
    struct MemoryLevels {
        documents: Vec<LevelDocument>,
        count: u32,
    }

    impl MemoryLevels {
        fn new(documents: Vec<LevelDocument>) -> Self {
            let count = documents.len() as u32;
            Self { documents, count }
        }
    }

    impl LevelSource for MemoryLevels {
        fn load(&self, level_id: u32) -> Result<Level, LevelError> {
            let path = PathBuf::from(format!("{level_id}.json"));
            let document = self
                .documents
                .get(level_id as usize)
                .cloned()
                .ok_or_else(|| LevelError::Missing { path: path.clone() })?;
            Level::from_document(level_id, document, &path)
        }

        fn level_count(&self) -> u32 {
            self.count
        }

        fn path_for(&self, _level_id: u32) -> Option<PathBuf> {
            None
        }
    }

    fn spawner(variant: u32, x: f32, y: f32) -> OffgridTile {
        OffgridTile {
            kind: TileKind::Spawners,
            variant,
            pos: Vec2::new(x, y),
        }
    }

    /// Floor on row 5 from x=0..20, player spawning on it at x=16.
    fn floor_level() -> Tilemap {
        let mut map = Tilemap::new(16);
        for x in 0..=20 {
            map.set_tile(Tile::new(TileKind::Stone, 1, GridPos::new(x, 5)));
        }
        map.add_offgrid(spawner(SPAWNER_PLAYER, 16.0, 65.0));
        map
    }

    fn with_portal_at(mut map: Tilemap, x: f32) -> LevelDocument {
        map.add_offgrid(spawner(SPAWNER_PORTAL, x, 64.0));
        LevelDocument {
            stage: 0,
            tilemap: map,
        }
    }

    fn run_right() -> FrameIntent {
        FrameIntent {
            movement: ControllerInput {
                move_x: 1.0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn config() -> GameplayConfig {
        GameplayConfig {
            transition_steps: 5,
            ..Default::default()
        }
    }

    fn playing(documents: Vec<LevelDocument>) -> GameSession<MemoryLevels> {
        let mut session =
            GameSession::new(MemoryLevels::new(documents), config(), 0).expect("level 0");
        session.confirm();
        assert_eq!(session.state(), GameState::Playing);
        session
    }

    fn step_until(
        session: &mut GameSession<MemoryLevels>,
        intent: FrameIntent,
        max_steps: usize,
        done: impl Fn(&GameSession<MemoryLevels>) -> bool,
    ) -> bool {
        for _ in 0..max_steps {
            session.step(intent, DT);
            if done(session) {
                return true;
            }
        }
        false
    }

    #[test]
    fn menu_pause_resume_exit() {
        let source = MemoryLevels::new(vec![with_portal_at(floor_level(), 300.0)]);
        let mut session = GameSession::new(source, config(), 0).expect("level 0");
        assert_eq!(session.state(), GameState::Menu);
        session.step(run_right(), DT);
        assert_eq!(session.timer().elapsed(), 0.0);

        session.confirm();
        assert_eq!(session.state(), GameState::Playing);
        session.step(run_right(), DT);
        assert!(session.timer().elapsed() > 0.0);

        session.pause();
        assert_eq!(session.state(), GameState::Paused);
        let frozen = *session.player();
        let time = session.timer().elapsed();
        session.step(run_right(), DT);
        assert_eq!(*session.player(), frozen);
        assert_eq!(session.timer().elapsed(), time);

        session.resume();
        assert_eq!(session.state(), GameState::Playing);
        session.pause();
        session.exit_to_menu();
        assert_eq!(session.state(), GameState::Menu);
        assert!(session.drain_events().ends_with(&[
            SessionEvent::Paused,
            SessionEvent::Resumed,
            SessionEvent::Paused,
            SessionEvent::ExitedToMenu,
        ]));
    }

    #[test]
    fn portal_completes_level_and_loads_next() {
        let mut session = playing(vec![
            with_portal_at(floor_level(), 48.0),
            with_portal_at(floor_level(), 300.0),
        ]);

        assert!(step_until(&mut session, run_right(), 200, |s| {
            s.state() == GameState::Transition(TransitionReason::LevelComplete)
        }));
        assert_eq!(session.timer().splits().len(), 1);

        assert!(step_until(&mut session, FrameIntent::default(), 10, |s| {
            s.state() == GameState::Playing
        }));
        assert_eq!(session.level().level_id, 1);
        assert_eq!(session.player().body.position(), session.level().spawn);
        assert!(session
            .drain_events()
            .contains(&SessionEvent::LevelLoaded { level_id: 1 }));
    }

    #[test]
    fn finishing_last_level_returns_to_menu() {
        let mut session = playing(vec![with_portal_at(floor_level(), 48.0)]);
        assert!(step_until(&mut session, run_right(), 300, |s| {
            s.state() == GameState::Menu
        }));
        assert!(!session.timer().is_running());
        assert!(session
            .drain_events()
            .iter()
            .any(|event| matches!(event, SessionEvent::RunFinished { .. })));
    }

    #[test]
    fn failed_next_level_keeps_current() {
        let mut source = MemoryLevels::new(vec![with_portal_at(floor_level(), 48.0)]);
        source.count = 2;
        let mut session = GameSession::new(source, config(), 0).expect("level 0");
        session.confirm();

        assert!(step_until(&mut session, run_right(), 300, |s| {
            s.events
                .contains(&SessionEvent::LevelLoadFailed { level_id: 1 })
        }));
        assert_eq!(session.state(), GameState::Playing);
        assert_eq!(session.level().level_id, 0);
        assert_eq!(session.player().body.position(), session.level().spawn);
    }

    #[test]
    fn spikes_kill_and_respawn_at_spawn() {
        let mut map = floor_level();
        map.set_tile(Tile::new(TileKind::Spike, 0, GridPos::new(3, 4)));
        let mut session = playing(vec![with_portal_at(map, 300.0)]);

        assert!(step_until(&mut session, run_right(), 200, |s| {
            s.state() == GameState::Transition(TransitionReason::Death(DeathCause::Spikes))
        }));
        assert_eq!(session.deaths(), 1);
        assert!(step_until(&mut session, FrameIntent::default(), 10, |s| {
            s.state() == GameState::Playing
        }));
        assert_eq!(session.player().body.position(), session.level().spawn);
    }

    #[test]
    fn death_respawns_at_saved_checkpoint() {
        let mut map = floor_level();
        map.set_tile(Tile::new(TileKind::Spike, 0, GridPos::new(6, 4)));
        let mut session = playing(vec![with_portal_at(map, 300.0)]);

        // Settle, walk a little, save.
        for _ in 0..40 {
            session.step(run_right(), DT);
        }
        let save = FrameIntent {
            save_checkpoint: true,
            ..Default::default()
        };
        session.step(save, DT);
        let saved = session.checkpoint().expect("checkpoint saved").position;
        assert!(saved.x > session.level().spawn.x);

        assert!(step_until(&mut session, run_right(), 200, |s| {
            matches!(s.state(), GameState::Transition(TransitionReason::Death(_)))
        }));
        assert!(step_until(&mut session, FrameIntent::default(), 10, |s| {
            s.state() == GameState::Playing
        }));
        assert!(session.player().body.position().abs_diff_eq(saved, 1e-3));
    }

    #[test]
    fn checkpoint_restore_and_delete_intents() {
        let mut session = playing(vec![with_portal_at(floor_level(), 300.0)]);
        for _ in 0..10 {
            session.step(FrameIntent::default(), DT);
        }
        session.step(
            FrameIntent {
                save_checkpoint: true,
                ..Default::default()
            },
            DT,
        );
        let saved = session.checkpoint().expect("saved").position;

        for _ in 0..30 {
            session.step(run_right(), DT);
        }
        assert_ne!(session.player().body.position(), saved);
        session.step(
            FrameIntent {
                restore_checkpoint: true,
                ..Default::default()
            },
            0.0,
        );
        assert!(session.player().body.position().abs_diff_eq(saved, 1e-3));

        session.step(
            FrameIntent {
                delete_checkpoint: true,
                ..Default::default()
            },
            DT,
        );
        assert!(session.checkpoint().is_none());
    }

    #[test]
    fn falling_out_of_the_world_kills() {
        let mut map = Tilemap::new(16);
        map.set_tile(Tile::new(TileKind::Stone, 0, GridPos::new(10, 2)));
        map.add_offgrid(spawner(SPAWNER_PLAYER, 0.0, 0.0));
        let mut session = playing(vec![with_portal_at(map, 300.0)]);
        assert!(step_until(&mut session, FrameIntent::default(), 300, |s| {
            s.state() == GameState::Transition(TransitionReason::Death(DeathCause::FellOut))
        }));
    }

    #[test]
    fn long_freefall_kills_before_kill_plane() {
        let mut map = Tilemap::new(16);
        map.add_offgrid(spawner(SPAWNER_PLAYER, 0.0, 0.0));
        let source = MemoryLevels::new(vec![with_portal_at(map, 300.0)]);
        let config = GameplayConfig {
            kill_margin_tiles: 10_000,
            ..config()
        };
        let mut session = GameSession::new(source, config, 0).expect("level 0");
        session.confirm();
        assert!(step_until(&mut session, FrameIntent::default(), 200, |s| {
            s.state() == GameState::Transition(TransitionReason::Death(DeathCause::Freefall))
        }));
    }

    #[test]
    fn enemy_contact_kills_unless_dashing() {
        let mut map = floor_level();
        map.add_offgrid(spawner(SPAWNER_ENEMY, 40.0, 65.0));
        let document = with_portal_at(map, 300.0);

        let mut session = playing(vec![document.clone()]);
        assert!(step_until(&mut session, run_right(), 200, |s| {
            s.state() == GameState::Transition(TransitionReason::Death(DeathCause::Enemy))
        }));

        let mut session = playing(vec![document]);
        for _ in 0..10 {
            session.step(FrameIntent::default(), DT);
        }
        let dash = FrameIntent {
            movement: ControllerInput {
                move_x: 1.0,
                dash_pressed: true,
                ..Default::default()
            },
            ..Default::default()
        };
        session.step(dash, DT);
        assert!(step_until(&mut session, run_right(), 10, |s| s.enemies().is_empty()));
        assert!(session.drain_events().contains(&SessionEvent::EnemyDefeated));
        // Clearing every enemy also ends the level.
        assert_eq!(
            session.state(),
            GameState::Transition(TransitionReason::LevelComplete)
        );
    }

    #[test]
    fn reload_failure_keeps_level() {
        let source = MemoryLevels::new(vec![with_portal_at(floor_level(), 300.0)]);
        let mut session = GameSession::new(source, config(), 0).expect("level 0");
        let before = session.level().clone();

        session.source.documents.clear();
        assert!(session.reload_current().is_err());
        assert_eq!(*session.level(), before);
    }

    #[test]
    fn reload_swaps_tilemap_keeps_player_and_respawns_enemies() {
        let mut map = floor_level();
        map.add_offgrid(spawner(SPAWNER_ENEMY, 200.0, 65.0));
        let mut session = playing(vec![with_portal_at(map, 300.0)]);
        for _ in 0..60 {
            session.step(run_right(), DT);
        }
        let spawn = session.level().enemy_spawns[0];
        assert!(!session.enemies()[0].body.position().abs_diff_eq(spawn, 1e-3));
        let player = *session.player();

        let edited = GridPos::new(12, 2);
        session.source.documents[0]
            .tilemap
            .set_tile(Tile::new(TileKind::Granite, 0, edited));
        session.reload_current().expect("reload");

        assert_eq!(*session.player(), player);
        assert_eq!(
            session.level().tilemap.get_tile(edited).map(|tile| tile.kind),
            Some(TileKind::Granite)
        );
        assert_eq!(session.enemies().len(), 1);
        assert!(session.enemies()[0].body.position().abs_diff_eq(spawn, 1e-3));
        assert_eq!(session.state(), GameState::Playing);
        assert!(session
            .drain_events()
            .contains(&SessionEvent::LevelLoaded { level_id: 0 }));
    }

    #[test]
    fn level_without_enemies_needs_the_portal() {
        let mut session = playing(vec![with_portal_at(floor_level(), 300.0)]);
        for _ in 0..120 {
            session.step(FrameIntent::default(), DT);
        }
        assert_eq!(session.state(), GameState::Playing);
    }

    #[test]
    fn level_count_is_refreshed_only_on_load() {
        let mut session = playing(vec![with_portal_at(floor_level(), 300.0)]);
        assert_eq!(session.level_count(), 1);

        session.source.count = 3;
        for _ in 0..5 {
            session.step(FrameIntent::default(), DT);
        }
        assert_eq!(session.level_count(), 1);

        session.reload_current().expect("reload");
        assert_eq!(session.level_count(), 3);
    }

    #[test]
    fn missing_start_level_is_an_error() {
        let source = MemoryLevels::new(Vec::new());
        assert!(matches!(
            GameSession::new(source, config(), 0),
            Err(LevelError::Missing { .. })
        ));
    }
}
