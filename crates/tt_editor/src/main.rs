//! tiptoe level editor.
//!
//! Left mouse paints the brush, right mouse erases, the wheel cycles the brush
//! kind (or the variant while Shift is held). WASD scrolls, G toggles grid
//! snapping, T toggles auto-tiling and O saves.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use glam::Vec2;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

use tt_core::input::{InputState, Key, MouseBtn};
use tt_core::time::TimeState;
use tt_devtools::overlay::{EditorInfo, Overlay, OverlayActions, OverlayView};
use tt_game::draw::{push_grid, push_tilemap, tile_color, CLEAR_COLOR};
use tt_game::editor::Editor;
use tt_game::error::EditorError;
use tt_game::level::LevelCatalog;
use tt_platform::keymap::{apply_key, apply_mouse_button, wheel_notches};
use tt_platform::window::PlatformConfig;
use tt_render::{Camera2D, GpuContext, QuadBatch, QuadRenderer};

const SCROLL_SPEED: f32 = 240.0;
const EDITOR_ZOOM: f32 = 2.0;
const GRID_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 0.08];

#[derive(Parser, Debug)]
#[command(name = "tt_editor", about = "Level editor for tiptoe")]
struct Args {
    /// Level number to edit; created on first save if missing.
    level: u32,
    /// Directory holding the numbered level files.
    #[arg(long, default_value = "assets/maps")]
    maps: PathBuf,
}

struct EditorState {
    window: Arc<Window>,
    gpu: GpuContext,
    time: TimeState,
    input: InputState,
    camera: Camera2D,
    quad_renderer: QuadRenderer,
    batch: QuadBatch,
    overlay: Overlay,
    editor: Editor,
    status: Option<String>,
}

impl EditorState {
    fn new(window: Arc<Window>, editor: Editor) -> Self {
        let gpu = GpuContext::new(window.clone());
        let mut camera = Camera2D::new(gpu.size.0, gpu.size.1);
        camera.zoom = EDITOR_ZOOM;
        if let Some((min, max)) = editor.tilemap().grid_bounds() {
            let a = editor.tilemap().grid_to_world(min);
            let b = editor.tilemap().grid_to_world(max);
            camera.position = (a + b) * 0.5;
        }
        let quad_renderer = QuadRenderer::new(&gpu.device, gpu.surface_format, &camera);
        let overlay = Overlay::new(&gpu.device, gpu.surface_format, &window);
        Self {
            window,
            gpu,
            time: TimeState::new(),
            input: InputState::new(),
            camera,
            quad_renderer,
            batch: QuadBatch::new(),
            overlay,
            editor,
            status: None,
        }
    }

    fn cursor_world(&self) -> Vec2 {
        let (x, y) = self.input.mouse_position;
        self.camera.screen_to_world(x as f32, y as f32)
    }

    fn update(&mut self, dt: f32) {
        let scroll = Vec2::new(
            self.input.axis(&[Key::A, Key::Left], &[Key::D, Key::Right]),
            self.input.axis(&[Key::W, Key::Up], &[Key::S, Key::Down]),
        );
        self.camera.position += scroll * SCROLL_SPEED * dt / self.camera.zoom.max(0.1);

        let notches = self.input.wheel_steps();
        if notches != 0 {
            if self.input.is_held(Key::Shift) {
                self.editor.cycle_variant(-notches);
            } else {
                self.editor.cycle_kind(-notches);
            }
        }

        if self.input.is_just_pressed(Key::G) {
            self.editor.toggle_ongrid();
        }
        if self.input.is_just_pressed(Key::T) {
            self.editor.toggle_auto_tile();
        }
        if self.input.is_just_pressed(Key::F3) {
            self.overlay.toggle_debug();
        }
        if self.input.is_just_pressed(Key::O) {
            self.save();
        }

        let cursor = self.cursor_world();
        let paint = if self.editor.ongrid {
            self.input.is_mouse_held(MouseBtn::Left)
        } else {
            self.input.is_mouse_just_pressed(MouseBtn::Left)
        };
        if paint {
            self.editor.paint_at(cursor);
        }
        if self.input.is_mouse_held(MouseBtn::Right) {
            self.editor.erase_at(cursor);
        }
    }

    fn apply_actions(&mut self, actions: &OverlayActions) {
        if actions.editor_toggle_grid {
            self.editor.toggle_ongrid();
        }
        if actions.editor_toggle_auto_tile {
            self.editor.toggle_auto_tile();
        }
        if actions.editor_autotile {
            let changed = self.editor.autotile_all();
            self.status = Some(format!("Auto-tiled {changed} tiles"));
        }
        if actions.editor_save {
            self.save();
        }
    }

    fn save(&mut self) {
        match self.editor.save_current() {
            Ok(()) => {
                log::info!("Saved {}", self.editor.path().display());
                self.status = Some(format!("Saved {}", self.editor.path().display()));
            }
            Err(EditorError::Debounced) => {}
            Err(e) => {
                log::warn!("Save failed: {e}");
                self.status = Some(format!("Not saved: {e}"));
            }
        }
    }

    fn rebuild_batch(&mut self) {
        self.batch.clear();
        let view = self.camera.visible_bounds();
        let tilemap = self.editor.tilemap();
        push_tilemap(&mut self.batch, tilemap, view);
        if self.editor.ongrid {
            push_grid(&mut self.batch, tilemap.tile_size_f32(), view, GRID_COLOR);
        }

        let size = tilemap.tile_size_f32();
        let cursor = self.cursor_world();
        let corner = if self.editor.ongrid {
            tilemap.grid_to_world(tilemap.world_to_grid(cursor))
        } else {
            cursor
        };
        let mut ghost = tile_color(self.editor.brush.kind, self.editor.brush.variant);
        ghost[3] *= 0.5;
        self.batch.push_rect(corner.x, corner.y, size, size, ghost);
    }

    fn overlay_view(&self) -> OverlayView {
        let tilemap = self.editor.tilemap();
        let cell = tilemap.world_to_grid(self.cursor_world());
        let brush = self.editor.brush;
        OverlayView {
            editor: Some(EditorInfo {
                path: self.editor.path().display().to_string(),
                brush_kind: brush.kind.to_string(),
                brush_variant: brush.variant,
                variant_count: brush.kind.variant_count(),
                ongrid: self.editor.ongrid,
                auto_tile: self.editor.auto_tile,
                dirty: self.editor.is_dirty(),
                save_generation: self.editor.save_generation(),
                tile_count: tilemap.tile_count(),
                offgrid_count: tilemap.offgrid().len(),
                cursor_cell: (cell.x, cell.y),
                status: self.status.clone(),
            }),
            ..OverlayView::default()
        }
    }
}

struct App {
    config: PlatformConfig,
    pending_editor: Option<Editor>,
    state: Option<EditorState>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let Some(editor) = self.pending_editor.take() else {
            return;
        };
        let window = tt_platform::window::create_window(event_loop, &self.config);
        self.state = Some(EditorState::new(window, editor));
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
                if state.editor.is_dirty() {
                    log::warn!("Closing with unsaved changes");
                }
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    state.gpu.resize(w, h);
                    state.camera.viewport = (w, h);
                }
            }

            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    apply_key(&mut state.input, key_code, event.state);
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                state.input.mouse_position = (position.x, position.y);
            }

            WindowEvent::MouseInput {
                button,
                state: button_state,
                ..
            } => {
                // Releases always land so a drag ending over a panel does not stick.
                if !egui_consumed || button_state == ElementState::Released {
                    apply_mouse_button(&mut state.input, button, button_state);
                }
            }

            WindowEvent::MouseWheel { delta, .. } if !egui_consumed => {
                state.input.wheel(wheel_notches(delta));
            }

            WindowEvent::RedrawRequested => {
                if state.gpu.is_minimized() {
                    return;
                }

                state.time.begin_frame();
                state.update(state.time.real_dt as f32);
                state.input.end_frame();
                state.rebuild_batch();

                let Some((output, view)) = state.gpu.begin_frame() else {
                    return;
                };

                let overlay_view = state.overlay_view();
                let (egui_primitives, egui_textures_delta, actions) =
                    state
                        .overlay
                        .prepare(&state.window, &state.time, &overlay_view);
                state.apply_actions(&actions);

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
                            label: Some("Editor Encoder"),
                        });

                {
                    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("Editor Render Pass"),
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
            }

            _ => {}
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let path = LevelCatalog::new(args.maps).level_path(args.level);
    let editor = match Editor::open(path.clone()) {
        Ok(editor) => editor,
        Err(e) => {
            log::error!("Cannot open {}: {e}", path.display());
            std::process::exit(1);
        }
    };

    let config = PlatformConfig {
        title: format!("tiptoe editor: level {}", args.level),
        ..PlatformConfig::default()
    };

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App {
        config,
        pending_editor: Some(editor),
        state: None,
    };
    event_loop.run_app(&mut app).expect("Event loop error");
}
