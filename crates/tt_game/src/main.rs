//! tiptoe: main loop and application entry point.
//!
//! winit drives the event loop via `ApplicationHandler`. Simulation runs inside
//! `RedrawRequested` on a fixed timestep:
//!
//!   1. `begin_frame()` measures wall-clock delta and feeds the accumulator
//!   2. `while should_step()` advances the session one fixed step at a time
//!   3. the quad batch is rebuilt from the level and entities
//!   4. the scene is drawn, then the egui overlay on top
//!
//! The active level file is watched by mtime and reloaded between frames.
//! `--replay` skips the window entirely and plays a recorded input file.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use glam::Vec2;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

use tt_core::input::{InputState, Key};
use tt_core::time::TimeState;
use tt_devtools::overlay::{DebugStats, HudInfo, Overlay, OverlayView, Screen};
use tt_game::checkpoint::CheckpointFile;
use tt_game::config::{load_or_default, GameConfig, DEFAULT_CONFIG_PATH};
use tt_game::controller::ControllerInput;
use tt_game::draw::{push_entity, push_hitboxes, push_tilemap, CLEAR_COLOR};
use tt_game::level::{LevelCatalog, LevelSource};
use tt_game::replay::{load_replay_from_path, run_replay};
use tt_game::session::{
    DeathCause, FrameIntent, GameSession, GameState, SessionEvent, TransitionReason,
};
use tt_game::watch::FileWatcher;
use tt_platform::keymap::apply_key;
use tt_render::{Camera2D, GpuContext, QuadBatch, QuadRenderer};

const JUMP_KEYS: &[Key] = &[Key::Space, Key::C, Key::Up, Key::W];
const DASH_KEYS: &[Key] = &[Key::X, Key::V];
const LEFT_KEYS: &[Key] = &[Key::Left, Key::A];
const RIGHT_KEYS: &[Key] = &[Key::Right, Key::D];

#[derive(Parser, Debug)]
#[command(name = "tt_game", about = "tiptoe, a small precision platformer")]
struct Args {
    /// Level to start from, overriding the config.
    #[arg(long)]
    level: Option<u32>,
    /// Game config file.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Play a recorded input file without opening a window.
    #[arg(long)]
    replay: Option<PathBuf>,
}

struct EngineState {
    window: Arc<Window>,
    gpu: GpuContext,
    time: TimeState,
    input: InputState,
    camera: Camera2D,
    quad_renderer: QuadRenderer,
    batch: QuadBatch,
    overlay: Overlay,

    session: GameSession<LevelCatalog>,
    level_watcher: Option<FileWatcher>,
    watched_level: u32,
    follow_rate: f32,
    last_run: Option<f64>,
}

impl EngineState {
    fn new(window: Arc<Window>, session: GameSession<LevelCatalog>, config: &GameConfig) -> Self {
        let gpu = GpuContext::new(window.clone());
        let mut camera = Camera2D::new(gpu.size.0, gpu.size.1);
        camera.zoom = config.zoom;
        camera.position = session.player().body.aabb.center;
        let quad_renderer = QuadRenderer::new(&gpu.device, gpu.surface_format, &camera);
        let overlay = Overlay::new(&gpu.device, gpu.surface_format, &window);

        let watched_level = session.level().level_id;
        let level_watcher = if config.hot_reload {
            session.source().path_for(watched_level).map(FileWatcher::new)
        } else {
            None
        };

        Self {
            window,
            gpu,
            time: TimeState::new(),
            input: InputState::new(),
            camera,
            quad_renderer,
            batch: QuadBatch::new(),
            overlay,
            session,
            level_watcher,
            watched_level,
            follow_rate: config.camera_follow_rate,
            last_run: None,
        }
    }

    /// Menu and pause keys. Only the first step of a frame sees edges.
    fn handle_state_keys(&mut self, event_loop: &ActiveEventLoop) {
        if self.input.is_just_pressed(Key::F3) {
            self.overlay.toggle_debug();
        }
        match self.session.state() {
            GameState::Menu => {
                if self.input.is_just_pressed(Key::Enter) {
                    self.session.confirm();
                } else if self.input.is_just_pressed(Key::Escape) {
                    log::info!("Quit from menu");
                    event_loop.exit();
                }
            }
            GameState::Playing => {
                if self.input.is_just_pressed(Key::Escape) {
                    self.session.pause();
                }
            }
            GameState::Paused => {
                if self.input.is_just_pressed(Key::Escape) {
                    self.session.resume();
                } else if self.input.is_just_pressed(Key::Q) {
                    self.session.exit_to_menu();
                }
            }
            GameState::Transition(_) => {}
        }
    }

    fn frame_intent(&self, edges: bool) -> FrameIntent {
        let pressed = |keys: &[Key]| edges && self.input.any_just_pressed(keys);
        FrameIntent {
            movement: ControllerInput {
                move_x: self.input.axis(LEFT_KEYS, RIGHT_KEYS),
                jump_pressed: pressed(JUMP_KEYS),
                dash_pressed: pressed(DASH_KEYS),
            },
            save_checkpoint: pressed(&[Key::S]),
            restore_checkpoint: pressed(&[Key::Z]),
            delete_checkpoint: pressed(&[Key::Backspace]),
        }
    }

    fn handle_session_events(&mut self) {
        for event in self.session.drain_events() {
            match event {
                SessionEvent::Started { .. }
                | SessionEvent::LevelLoaded { .. }
                | SessionEvent::Respawned(_)
                | SessionEvent::CheckpointRestored(_) => {
                    self.camera.position = self.session.player().body.aabb.center;
                }
                SessionEvent::RunFinished { time } => {
                    self.last_run = Some(time);
                }
                SessionEvent::LevelLoadFailed { level_id } => {
                    log::warn!("Level {level_id} could not be loaded");
                }
                _ => {}
            }
        }

        let level_id = self.session.level().level_id;
        if level_id != self.watched_level {
            self.watched_level = level_id;
            if self.level_watcher.is_some() {
                self.level_watcher = self.session.source().path_for(level_id).map(FileWatcher::new);
            }
        }
    }

    fn check_hot_reload(&mut self) {
        let Some(watcher) = self.level_watcher.as_mut() else {
            return;
        };
        if watcher.should_reload() {
            log::info!("{} changed on disk", watcher.path().display());
            // Failure is logged by the session; the old level stays active.
            let _ = self.session.reload_current();
        }
    }

    fn rebuild_batch(&mut self) {
        self.batch.clear();
        let level = self.session.level();
        push_tilemap(&mut self.batch, &level.tilemap, self.camera.visible_bounds());
        for enemy in self.session.enemies() {
            push_entity(&mut self.batch, enemy);
        }
        push_entity(&mut self.batch, self.session.player());
        if self.overlay.debug_visible {
            push_hitboxes(&mut self.batch, &level.spikes);
            push_hitboxes(&mut self.batch, &level.portals);
        }
    }

    fn overlay_view(&self) -> OverlayView {
        let state = self.session.state();
        let screen = match state {
            GameState::Menu => Screen::Menu {
                last_run: self.last_run,
            },
            GameState::Playing => Screen::None,
            GameState::Paused => Screen::Paused,
            GameState::Transition(reason) => Screen::Transition {
                label: transition_label(reason).to_string(),
            },
        };
        let hud = (state != GameState::Menu).then(|| HudInfo {
            level_id: self.session.level().level_id,
            level_count: self.session.level_count(),
            stage: self.session.level().stage,
            run_time: self.session.timer().elapsed(),
            segment_time: self.session.timer().current_segment(),
            deaths: self.session.deaths(),
            checkpoint: self
                .session
                .checkpoint()
                .map(|c| (c.position.x, c.position.y)),
        });
        let body = &self.session.player().body;
        let debug = DebugStats {
            quad_count: self.batch.quad_count() as u32,
            entity_count: self.session.enemies().len() as u32 + 1,
            player_position: (body.position().x, body.position().y),
            player_velocity: (body.velocity.x, body.velocity.y),
            grounded: body.grounded,
            dashing: self.session.player().is_dashing(),
        };
        OverlayView {
            screen,
            hud,
            editor: None,
            debug: Some(debug),
        }
    }
}

fn transition_label(reason: TransitionReason) -> &'static str {
    match reason {
        TransitionReason::LevelComplete => "Level complete",
        TransitionReason::Death(DeathCause::Spikes) => "Spiked",
        TransitionReason::Death(DeathCause::Enemy) => "Caught",
        TransitionReason::Death(DeathCause::FellOut) => "Fell out",
        TransitionReason::Death(DeathCause::Freefall) => "Too long in the air",
    }
}

struct App {
    config: GameConfig,
    pending_session: Option<GameSession<LevelCatalog>>,
    state: Option<EngineState>,
}

impl App {
    fn new(config: GameConfig, session: GameSession<LevelCatalog>) -> Self {
        Self {
            config,
            pending_session: Some(session),
            state: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let Some(session) = self.pending_session.take() else {
            return;
        };
        let window = tt_platform::window::create_window(event_loop, &self.config.window.to_platform());
        self.state = Some(EngineState::new(window, session, &self.config));
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        let egui_consumed = state.overlay.handle_window_event(&state.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    state.gpu.resize(w, h);
                    state.camera.viewport = (w, h);
                    log::info!("Resized to {}x{}", w, h);
                }
            }

            WindowEvent::Focused(false) => state.session.pause(),

            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    apply_key(&mut state.input, key_code, event.state);
                }
            }

            WindowEvent::RedrawRequested => {
                if state.gpu.is_minimized() {
                    return;
                }

                state.time.begin_frame();
                state.check_hot_reload();

                let dt = state.time.fixed_dt as f32;
                while state.time.should_step() {
                    let edges = state.time.steps_this_frame == 1;
                    if edges {
                        state.handle_state_keys(event_loop);
                    }
                    let intent = state.frame_intent(edges);
                    state.session.step(intent, dt);
                    state.handle_session_events();

                    let target = state.session.player().body.aabb.center;
                    state.camera.follow(target, state.follow_rate, dt);
                }

                state.rebuild_batch();

                let Some((output, view)) = state.gpu.begin_frame() else {
                    return;
                };

                let overlay_view = state.overlay_view();
                let (egui_primitives, egui_textures_delta, actions) =
                    state
                        .overlay
                        .prepare(&state.window, &state.time, &overlay_view);

                if actions.start {
                    state.session.confirm();
                }
                if actions.resume {
                    state.session.resume();
                }
                if actions.exit_to_menu {
                    state.session.exit_to_menu();
                }
                if actions.quit {
                    event_loop.exit();
                }
                state.handle_session_events();

                state.quad_renderer.upload(
                    &state.gpu.device,
                    &state.gpu.queue,
                    &state.camera,
                    &state.batch,
                );

                let screen_descriptor = egui_wgpu::ScreenDescriptor {
                    size_in_pixels: [state.gpu.size.0, state.gpu.size.1],
                    pixels_per_point: state.window.scale_factor() as f32,
                };

                let mut encoder =
                    state
                        .gpu
                        .device
                        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                            label: Some("Render Encoder"),
                        });

                {
                    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("Scene Render Pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: None,
                        ..Default::default()
                    });
                    state.quad_renderer.draw(&mut render_pass);
                }

                state.overlay.upload(
                    &state.gpu.device,
                    &state.gpu.queue,
                    &mut encoder,
                    &egui_primitives,
                    &egui_textures_delta,
                    &screen_descriptor,
                );

                {
                    let mut egui_pass = encoder
                        .begin_render_pass(&wgpu::RenderPassDescriptor {
                            label: Some("egui Render Pass"),
                            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                                view: &view,
                                resolve_target: None,
                                ops: wgpu::Operations {
                                    load: wgpu::LoadOp::Load,
                                    store: wgpu::StoreOp::Store,
                                },
                            })],
                            depth_stencil_attachment: None,
                            ..Default::default()
                        })
                        .forget_lifetime();

                    state
                        .overlay
                        .paint(&mut egui_pass, &egui_primitives, &screen_descriptor);
                }

                state.overlay.cleanup(&egui_textures_delta);

                state.gpu.queue.submit(std::iter::once(encoder.finish()));
                output.present();

                // A press that lands on a frame with no fixed step must
                // survive until one runs.
                if state.time.steps_this_frame > 0 {
                    state.input.end_frame();
                }
            }

            _ => {}
        }
    }
}

fn build_session(config: &GameConfig, start_level: u32) -> Option<GameSession<LevelCatalog>> {
    let catalog = LevelCatalog::new(config.maps_dir.clone());
    let mut session = match GameSession::new(catalog, config.gameplay, start_level) {
        Ok(session) => session,
        Err(e) => {
            log::error!("Cannot load level {start_level}: {e}");
            return None;
        }
    };
    if let Some(path) = &config.checkpoint_file {
        match CheckpointFile::load(path) {
            Ok(file) => session = session.with_checkpoint_file(file),
            Err(e) => log::warn!("Ignoring checkpoint file: {e}"),
        }
    }
    Some(session)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load_or_default(&args.config);
    let start_level = args.level.unwrap_or(config.start_level);

    log::info!("tiptoe starting...");

    let Some(mut session) = build_session(&config, start_level) else {
        std::process::exit(1);
    };

    if let Some(replay_path) = &args.replay {
        let replay = match load_replay_from_path(replay_path) {
            Ok(replay) => replay,
            Err(e) => {
                log::error!("{e}");
                std::process::exit(1);
            }
        };
        let outcome = run_replay(&mut session, &replay);
        let position: Vec2 = outcome.player_position;
        println!(
            "state={:?} level={} position=({:.2}, {:.2}) deaths={} time={:.3}s steps={}",
            outcome.state,
            outcome.level_id,
            position.x,
            position.y,
            outcome.deaths,
            outcome.elapsed,
            outcome.steps
        );
        return;
    }

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config, session);
    event_loop.run_app(&mut app).expect("Event loop error");
}
