//! egui overlay drawn on top of the tile scene: HUD, menu and pause panels,
//! the editor panel and the F3 debug window.
//!
//! egui needs a split render because `egui_wgpu::Renderer::render()` wants a
//! `RenderPass<'static>` while `begin_render_pass` borrows the encoder:
//!
//!   1. `prepare()` runs the UI and tessellates
//!   2. `upload()`  updates textures and buffers (borrows the encoder)
//!   3. `paint()`   renders into a pass made with `forget_lifetime()`
//!   4. `cleanup()` frees textures egui dropped

use tt_core::time::TimeState;
use tt_core::timer::format_run_time;
use winit::window::Window;

#[derive(Debug, Clone, Default)]
pub struct HudInfo {
    pub level_id: u32,
    pub level_count: u32,
    pub stage: u32,
    pub run_time: f64,
    pub segment_time: f64,
    pub deaths: u32,
    pub checkpoint: Option<(f32, f32)>,
}

#[derive(Debug, Clone, Default)]
pub struct EditorInfo {
    pub path: String,
    pub brush_kind: String,
    pub brush_variant: u32,
    pub variant_count: u32,
    pub ongrid: bool,
    pub auto_tile: bool,
    pub dirty: bool,
    pub save_generation: u32,
    pub tile_count: usize,
    pub offgrid_count: usize,
    pub cursor_cell: (i32, i32),
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DebugStats {
    pub quad_count: u32,
    pub entity_count: u32,
    pub player_position: (f32, f32),
    pub player_velocity: (f32, f32),
    pub grounded: bool,
    pub dashing: bool,
}

/// Which full-screen panel, if any, is on top of the scene.
#[derive(Debug, Clone, Default)]
pub enum Screen {
    #[default]
    None,
    Menu {
        last_run: Option<f64>,
    },
    Paused,
    Transition {
        label: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct OverlayView {
    pub screen: Screen,
    pub hud: Option<HudInfo>,
    pub editor: Option<EditorInfo>,
    pub debug: Option<DebugStats>,
}

/// Buttons clicked this frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlayActions {
    pub start: bool,
    pub resume: bool,
    pub exit_to_menu: bool,
    pub quit: bool,
    pub editor_save: bool,
    pub editor_autotile: bool,
    pub editor_toggle_grid: bool,
    pub editor_toggle_auto_tile: bool,
}

pub struct Overlay {
    pub egui_ctx: egui::Context,
    pub egui_winit_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,
    pub debug_visible: bool,
}

impl Overlay {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat, window: &Window) -> Self {
        let egui_ctx = egui::Context::default();
        let egui_winit_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(device, surface_format, None, 1, false);

        Self {
            egui_ctx,
            egui_winit_state,
            egui_renderer,
            debug_visible: false,
        }
    }

    /// Returns true when egui consumed the event (a click on a panel).
    pub fn handle_window_event(&mut self, window: &Window, event: &winit::event::WindowEvent) -> bool {
        self.egui_winit_state.on_window_event(window, event).consumed
    }

    pub fn toggle_debug(&mut self) {
        self.debug_visible = !self.debug_visible;
        log::info!(
            "Debug overlay: {}",
            if self.debug_visible { "ON" } else { "OFF" }
        );
    }

    pub fn prepare(
        &mut self,
        window: &Window,
        time: &TimeState,
        view: &OverlayView,
    ) -> (
        Vec<egui::ClippedPrimitive>,
        egui::TexturesDelta,
        OverlayActions,
    ) {
        let mut actions = OverlayActions::default();
        let debug_visible = self.debug_visible;
        let raw_input = self.egui_winit_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            if let Some(hud) = &view.hud {
                hud_panel(ctx, hud);
            }
            match &view.screen {
                Screen::None => {}
                Screen::Menu { last_run } => menu_panel(ctx, *last_run, &mut actions),
                Screen::Paused => pause_panel(ctx, &mut actions),
                Screen::Transition { label } => transition_panel(ctx, label),
            }
            if let Some(editor) = &view.editor {
                editor_panel(ctx, editor, &mut actions);
            }
            if debug_visible {
                debug_window(ctx, time, view.debug.as_ref());
            }
        });

        self.egui_winit_state
            .handle_platform_output(window, full_output.platform_output);

        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        (primitives, full_output.textures_delta, actions)
    }

    /// Upload textures and update buffers. Call before creating the egui render pass.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }
        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor);
    }

    pub fn paint(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    pub fn cleanup(&mut self, textures_delta: &egui::TexturesDelta) {
        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

fn hud_panel(ctx: &egui::Context, hud: &HudInfo) {
    egui::Area::new(egui::Id::new("hud"))
        .anchor(egui::Align2::RIGHT_TOP, [-12.0, 8.0])
        .interactable(false)
        .show(ctx, |ui| {
            ui.label(
                egui::RichText::new(format_run_time(hud.run_time))
                    .monospace()
                    .size(20.0)
                    .strong(),
            );
            ui.label(
                egui::RichText::new(format!("level {}", format_run_time(hud.segment_time)))
                    .monospace(),
            );
            ui.label(format!(
                "Level {}/{}  Stage {}",
                hud.level_id + 1,
                hud.level_count.max(hud.level_id + 1),
                hud.stage
            ));
            ui.label(format!("Deaths {}", hud.deaths));
            if let Some((x, y)) = hud.checkpoint {
                ui.label(format!("Checkpoint ({x:.0}, {y:.0})"));
            }
        });
}

fn menu_panel(ctx: &egui::Context, last_run: Option<f64>, actions: &mut OverlayActions) {
    egui::Window::new("tiptoe")
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            if let Some(time) = last_run {
                ui.label(format!("Last run: {}", format_run_time(time)));
                ui.separator();
            }
            if ui.button("Start  [Enter]").clicked() {
                actions.start = true;
            }
            if ui.button("Quit  [Esc]").clicked() {
                actions.quit = true;
            }
        });
}

fn pause_panel(ctx: &egui::Context, actions: &mut OverlayActions) {
    egui::Window::new("Paused")
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            if ui.button("Resume  [Esc]").clicked() {
                actions.resume = true;
            }
            if ui.button("Exit to menu  [Q]").clicked() {
                actions.exit_to_menu = true;
            }
        });
}

fn transition_panel(ctx: &egui::Context, label: &str) {
    egui::Area::new(egui::Id::new("transition"))
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .interactable(false)
        .show(ctx, |ui| {
            ui.label(egui::RichText::new(label).size(28.0).strong());
        });
}

fn editor_panel(ctx: &egui::Context, editor: &EditorInfo, actions: &mut OverlayActions) {
    egui::Window::new("Editor")
        .default_pos([10.0, 10.0])
        .resizable(false)
        .show(ctx, |ui| {
            ui.label(&editor.path);
            ui.label(format!(
                "Brush: {} {}/{}",
                editor.brush_kind,
                editor.brush_variant,
                editor.variant_count.saturating_sub(1)
            ));
            ui.label(format!(
                "Cursor: ({}, {})",
                editor.cursor_cell.0, editor.cursor_cell.1
            ));
            ui.label(format!(
                "Tiles: {}  Off-grid: {}",
                editor.tile_count, editor.offgrid_count
            ));
            ui.separator();
            let mut ongrid = editor.ongrid;
            if ui.checkbox(&mut ongrid, "On grid  [G]").changed() {
                actions.editor_toggle_grid = true;
            }
            let mut auto_tile = editor.auto_tile;
            if ui.checkbox(&mut auto_tile, "Auto-tile  [T]").changed() {
                actions.editor_toggle_auto_tile = true;
            }
            ui.horizontal(|ui| {
                if ui.button("Autotile all").clicked() {
                    actions.editor_autotile = true;
                }
                let save_label = if editor.dirty { "Save*  [O]" } else { "Save  [O]" };
                if ui.button(save_label).clicked() {
                    actions.editor_save = true;
                }
            });
            ui.label(format!("Saves: {:02}", editor.save_generation));
            if let Some(status) = &editor.status {
                ui.separator();
                ui.label(status);
            }
        });
}

fn debug_window(ctx: &egui::Context, time: &TimeState, stats: Option<&DebugStats>) {
    egui::Window::new("Debug")
        .default_pos([10.0, 300.0])
        .show(ctx, |ui| {
            ui.label(format!("FPS: {:.1}", time.smoothed_fps));
            ui.label(format!("Frame time: {:.2} ms", time.real_dt * 1000.0));
            ui.label(format!("Steps this frame: {}", time.steps_this_frame));
            ui.label(format!("Total steps: {}", time.fixed_step_count));
            ui.label(format!("Frame: {}", time.frame_count));
            if let Some(stats) = stats {
                ui.separator();
                ui.label(format!("Quads: {}", stats.quad_count));
                ui.label(format!("Entities: {}", stats.entity_count));
                ui.label(format!(
                    "Player: ({:.1}, {:.1})",
                    stats.player_position.0, stats.player_position.1
                ));
                ui.label(format!(
                    "Velocity: ({:.1}, {:.1})",
                    stats.player_velocity.0, stats.player_velocity.1
                ));
                ui.label(format!(
                    "Grounded: {}  Dashing: {}",
                    stats.grounded, stats.dashing
                ));
            }
        });
}
