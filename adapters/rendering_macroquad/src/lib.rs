#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Torus Life.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.
//!
//! The adapter uses Macroquad's immediate-mode UI module for the control
//! panel. All UI-specific calls live inside the local `ui` module to avoid
//! leaking Macroquad UI types throughout the renderer.

mod ui;

use self::ui::{draw_control_panel_ui, ControlPanelUiContext, ControlPanelUiResult};
use anyhow::Result;
use glam::Vec2;
use macroquad::{
    input::{
        is_key_pressed, is_mouse_button_down, is_mouse_button_pressed, is_mouse_button_released,
        mouse_position, KeyCode, MouseButton,
    },
    math::Vec2 as MacroquadVec2,
};
use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};
use torus_life_core::PlaybackState;
use torus_life_rendering::{
    Color, ControlAction, FrameInput, GridPresentation, Presentation, RenderingBackend, Scene,
};
use tracing::info;

/// Tracks UI-sourced interactions so they can be merged with physical input on the next frame.
#[doc(hidden)]
#[derive(Clone, Debug, Default)]
pub struct ControlPanelInputState {
    actions: Vec<ControlAction>,
    requested_rate: Option<f32>,
}

impl ControlPanelInputState {
    /// Returns every latched control action in press order and clears the latch
    /// so each action fires only once.
    pub fn take_actions(&mut self) -> Vec<ControlAction> {
        std::mem::take(&mut self.actions)
    }

    /// Records that a control-panel button or shortcut requested an action this frame.
    pub fn register_action(&mut self, action: ControlAction) {
        self.actions.push(action);
    }

    /// Returns the latched rate request, clearing it so the change applies once.
    pub fn take_requested_rate(&mut self) -> Option<f32> {
        self.requested_rate.take()
    }

    /// Records the slider value chosen this frame. Later requests replace earlier ones.
    pub fn register_requested_rate(&mut self, rate: f32) {
        self.requested_rate = Some(rate);
    }
}

/// Snapshot of edge-triggered keyboard shortcuts observed during a single frame.
#[derive(Clone, Copy, Debug, Default)]
struct KeyboardShortcuts {
    /// `Q` or `Escape` to quit the render loop.
    quit_requested: bool,
    /// `Space` toggles playback.
    toggle_playback: bool,
    /// `S` advances a single generation.
    step: bool,
    /// `C` clears the grid.
    clear: bool,
    /// `R` randomizes the grid.
    randomize: bool,
}

impl KeyboardShortcuts {
    fn poll() -> Self {
        Self {
            quit_requested: is_key_pressed(KeyCode::Escape) || is_key_pressed(KeyCode::Q),
            toggle_playback: is_key_pressed(KeyCode::Space),
            step: is_key_pressed(KeyCode::S),
            clear: is_key_pressed(KeyCode::C),
            randomize: is_key_pressed(KeyCode::R),
        }
    }

    fn register(self, playback: PlaybackState, state: &mut ControlPanelInputState) {
        if self.toggle_playback {
            state.register_action(match playback {
                PlaybackState::Running => ControlAction::Stop,
                PlaybackState::Stopped => ControlAction::Start,
            });
        }
        if self.step {
            state.register_action(ControlAction::Step);
        }
        if self.clear {
            state.register_action(ControlAction::Clear);
        }
        if self.randomize {
            state.register_action(ControlAction::Randomize);
        }
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug, Default)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend logs frame timing metrics once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }
}

#[derive(Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
    frame_times: VecDeque<Duration>,
    window_duration: Duration,
    render_accum: Duration,
}

#[derive(Clone, Copy, Debug)]
struct FpsMetrics {
    per_second: f32,
    trailing_ten_seconds: f32,
    avg_render: Duration,
}

impl FpsCounter {
    /// Records a rendered frame and returns the per-second and trailing ten-second averages once
    /// one second has elapsed.
    fn record_frame(&mut self, frame: Duration, render: Duration) -> Option<FpsMetrics> {
        self.elapsed += frame;
        self.frames = self.frames.saturating_add(1);
        self.render_accum += render;

        self.frame_times.push_back(frame);
        self.window_duration += frame;

        let trailing_window = Duration::from_secs(10);
        while self.window_duration > trailing_window {
            if let Some(removed) = self.frame_times.pop_front() {
                self.window_duration = self.window_duration.saturating_sub(removed);
            } else {
                break;
            }
        }

        if self.elapsed < Duration::from_secs(1) {
            return None;
        }

        let seconds = self.elapsed.as_secs_f32();
        let frames = self.frames;
        let per_second = frames as f32 / seconds;
        let window_seconds = self.window_duration.as_secs_f32();
        let trailing_ten_seconds = if window_seconds <= f32::EPSILON {
            per_second
        } else {
            self.frame_times.len() as f32 / window_seconds
        };
        let avg_render = self.render_accum / frames.max(1);

        self.elapsed = Duration::ZERO;
        self.frames = 0;
        self.render_accum = Duration::ZERO;
        Some(FpsMetrics {
            per_second,
            trailing_ten_seconds,
            avg_render,
        })
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: scene.grid.width().ceil() as i32,
            window_height: scene.total_height().ceil() as i32,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let background = to_macroquad_color(clear_color);
            let mut fps_counter = FpsCounter::default();
            let mut control_panel_input = ControlPanelInputState::default();
            let started = Instant::now();

            loop {
                let keyboard = KeyboardShortcuts::poll();
                if keyboard.quit_requested {
                    break;
                }
                keyboard.register(scene.statistics.playback, &mut control_panel_input);

                macroquad::window::clear_background(background);

                let screen_width = macroquad::window::screen_width();
                let screen_height = macroquad::window::screen_height();
                let frame_dt =
                    Duration::from_secs_f32(macroquad::time::get_frame_time().max(0.0));

                let metrics_before = SceneMetrics::from_scene(&scene, screen_width, screen_height);
                let frame_input = gather_frame_input(
                    &scene,
                    &metrics_before,
                    control_panel_input.take_actions(),
                    control_panel_input.take_requested_rate(),
                );

                update_scene(started.elapsed(), frame_input, &mut scene);

                let render_start = Instant::now();
                let metrics = SceneMetrics::from_scene(&scene, screen_width, screen_height);
                draw_cells(&scene, &metrics);
                draw_grid_lines(&scene.grid, &metrics);

                if let Some(panel_context) =
                    control_panel_context(&scene, &metrics, screen_width, screen_height)
                {
                    let slider_rate = slider_position(&scene);
                    let mut control_panel_ui = macroquad::ui::root_ui();
                    let ControlPanelUiResult { actions, rate } =
                        draw_control_panel_ui(&mut control_panel_ui, panel_context, slider_rate);
                    for action in actions {
                        control_panel_input.register_action(action);
                    }
                    if let Some(rate) = slider_request(slider_rate, rate) {
                        control_panel_input.register_requested_rate(rate);
                    }
                }

                let render_duration = render_start.elapsed();
                let fps_metrics = fps_counter.record_frame(frame_dt, render_duration);
                if show_fps {
                    if let Some(FpsMetrics {
                        per_second,
                        trailing_ten_seconds,
                        avg_render,
                    }) = fps_metrics
                    {
                        info!(
                            fps = format_args!("{per_second:.2}"),
                            trailing_fps = format_args!("{trailing_ten_seconds:.2}"),
                            render_ms = format_args!("{:.2}", avg_render.as_secs_f64() * 1_000.0),
                            "frame timing"
                        );
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

/// Screen-space placement of the grid and control panel for the current window size.
#[derive(Clone, Copy, Debug)]
struct SceneMetrics {
    scale: f32,
    grid_offset: Vec2,
    grid_size: Vec2,
    cell_step: f32,
}

impl SceneMetrics {
    fn from_scene(scene: &Scene, screen_width: f32, screen_height: f32) -> Self {
        let grid = scene.grid;
        let grid_width = grid.width();
        let grid_height = grid.height();
        let panel_height = scene.control_panel.height.max(0.0).min(screen_height);
        let available_height = (screen_height - panel_height).max(0.0);

        let scale = if grid_width <= f32::EPSILON || grid_height <= f32::EPSILON {
            1.0
        } else {
            (screen_width / grid_width).min(available_height / grid_height)
        };

        let grid_size = Vec2::new(grid_width * scale, grid_height * scale);
        let grid_offset = Vec2::new(
            ((screen_width - grid_size.x) * 0.5).max(0.0),
            ((available_height - grid_size.y) * 0.5).max(0.0),
        );

        Self {
            scale,
            grid_offset,
            grid_size,
            cell_step: grid.cell_length * scale,
        }
    }

    fn to_grid_space(&self, screen: Vec2) -> Option<Vec2> {
        if self.scale <= f32::EPSILON {
            return None;
        }
        Some((screen - self.grid_offset) / self.scale)
    }
}

fn gather_frame_input(
    scene: &Scene,
    metrics: &SceneMetrics,
    actions: Vec<ControlAction>,
    requested_rate: Option<f32>,
) -> FrameInput {
    let (cursor_x, cursor_y) = mouse_position();
    gather_frame_input_from_observations(
        scene,
        metrics,
        Vec2::new(cursor_x, cursor_y),
        PointerButtons {
            pressed: is_mouse_button_pressed(MouseButton::Left),
            held: is_mouse_button_down(MouseButton::Left),
            released: is_mouse_button_released(MouseButton::Left),
        },
        actions,
        requested_rate,
    )
}

#[derive(Clone, Copy, Debug, Default)]
struct PointerButtons {
    pressed: bool,
    held: bool,
    released: bool,
}

fn gather_frame_input_from_observations(
    scene: &Scene,
    metrics: &SceneMetrics,
    cursor_position: Vec2,
    buttons: PointerButtons,
    actions: Vec<ControlAction>,
    requested_rate: Option<f32>,
) -> FrameInput {
    let cursor_cell = metrics
        .to_grid_space(cursor_position)
        .and_then(|position| scene.grid.cell_at(position));

    FrameInput {
        cursor_cell,
        pointer_pressed: buttons.pressed && cursor_cell.is_some(),
        pointer_held: buttons.held,
        pointer_released: buttons.released,
        actions,
        requested_rate: requested_rate.map(|rate| scene.control_panel.clamp_rate(rate)),
    }
}

fn draw_cells(scene: &Scene, metrics: &SceneMetrics) {
    let color = to_macroquad_color(scene.grid.cell_color);
    let side = (metrics.cell_step - metrics.scale).max(0.0);
    for cell in scene.cells.view().alive_cells() {
        let origin = metrics.grid_offset + scene.grid.cell_origin(cell) * metrics.scale;
        macroquad::shapes::draw_rectangle(origin.x, origin.y, side, side, color);
    }
}

fn draw_grid_lines(grid: &GridPresentation, metrics: &SceneMetrics) {
    let color = to_macroquad_color(grid.line_color);
    let left = metrics.grid_offset.x;
    let top = metrics.grid_offset.y;
    let right = left + metrics.grid_size.x;
    let bottom = top + metrics.grid_size.y;

    for row in 0..=grid.rows {
        let y = top + row as f32 * metrics.cell_step;
        macroquad::shapes::draw_line(left, y, right, y, 1.0, color);
    }
    for column in 0..=grid.columns {
        let x = left + column as f32 * metrics.cell_step;
        macroquad::shapes::draw_line(x, top, x, bottom, 1.0, color);
    }
}

fn control_panel_context(
    scene: &Scene,
    metrics: &SceneMetrics,
    screen_width: f32,
    screen_height: f32,
) -> Option<ControlPanelUiContext> {
    let top = metrics.grid_offset.y * 2.0 + metrics.grid_size.y;
    let height = (screen_height - top).max(0.0);
    if height <= f32::EPSILON {
        return None;
    }

    let background = Color::from_rgb_u8(0x66, 0x7e, 0xea).lighten(0.85);
    macroquad::shapes::draw_rectangle(
        0.0,
        top,
        screen_width,
        height,
        to_macroquad_color(background),
    );

    Some(ControlPanelUiContext {
        origin: MacroquadVec2::new(0.0, top),
        size: MacroquadVec2::new(screen_width, height),
        background: to_macroquad_color(background),
        statistics: scene.statistics,
        rate_range: scene.control_panel.rate_range.clone(),
    })
}

/// Slider value for the current playback rate, held within the slider range.
fn slider_position(scene: &Scene) -> f32 {
    scene
        .control_panel
        .clamp_rate(scene.statistics.rate.get() as f32)
}

/// Whole-number rate to request once the slider moved away from `position`.
fn slider_request(position: f32, slider: f32) -> Option<f32> {
    ((slider - position).abs() >= 0.5).then(|| slider.round())
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}
