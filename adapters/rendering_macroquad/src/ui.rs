//! Immediate-mode UI helpers for the Macroquad rendering backend.
//!
//! This module hosts all uses of `macroquad::ui` so the rest of the adapter can
//! remain agnostic of Macroquad's UI types.

use std::ops::RangeInclusive;

use macroquad::{
    color::{Color, BLACK, WHITE},
    math::{RectOffset, Vec2},
    ui::{hash, Ui},
};
use torus_life_core::PlaybackState;
use torus_life_rendering::{ControlAction, Statistics};

/// Outcome of rendering the control panel UI during the current frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ControlPanelUiResult {
    /// Buttons pressed during this frame, in panel order.
    pub actions: Vec<ControlAction>,
    /// Value held by the speed slider after this frame.
    pub rate: f32,
}

/// Snapshot of the control panel's UI layout and data for the current frame.
#[derive(Clone, Debug)]
pub(crate) struct ControlPanelUiContext {
    /// Top-left corner of the panel in screen coordinates.
    pub origin: Vec2,
    /// Panel dimensions in screen space.
    pub size: Vec2,
    /// Background colour applied to the window skin so the UI matches the
    /// adapter's solid rectangle.
    pub background: Color,
    /// Counters displayed as labels.
    pub statistics: Statistics,
    /// Range offered by the speed slider.
    pub rate_range: RangeInclusive<f32>,
}

const BUTTONS: [(&str, ControlAction); 5] = [
    ("Start", ControlAction::Start),
    ("Stop", ControlAction::Stop),
    ("Clear", ControlAction::Clear),
    ("Random", ControlAction::Randomize),
    ("Step", ControlAction::Step),
];

/// Renders the control panel's buttons, speed slider, and counters.
pub(crate) fn draw_control_panel_ui(
    ui: &mut Ui,
    context: ControlPanelUiContext,
    slider_rate: f32,
) -> ControlPanelUiResult {
    let mut skin = ui.default_skin();
    skin.margin = 0.0;

    let window_style = ui
        .style_builder()
        .color(context.background)
        .color_hovered(context.background)
        .color_clicked(context.background)
        .color_selected(context.background)
        .color_selected_hovered(context.background)
        .color_inactive(context.background)
        .text_color(BLACK)
        .margin(RectOffset::new(12.0, 12.0, 8.0, 8.0))
        .build();
    skin.window_style = window_style;

    let label_style = ui
        .style_builder()
        .text_color(BLACK)
        .text_color_hovered(BLACK)
        .text_color_clicked(BLACK)
        .margin(RectOffset::new(0.0, 0.0, 2.0, 2.0))
        .build();
    skin.label_style = label_style;

    let button_style = ui
        .style_builder()
        .text_color(WHITE)
        .text_color_hovered(WHITE)
        .text_color_clicked(WHITE)
        .color(Color::from_rgba(0x66, 0x7e, 0xea, 255))
        .color_hovered(Color::from_rgba(0x5a, 0x67, 0xd8, 255))
        .color_clicked(Color::from_rgba(0x4c, 0x51, 0xbf, 255))
        .color_selected(Color::from_rgba(0x66, 0x7e, 0xea, 255))
        .color_selected_hovered(Color::from_rgba(0x5a, 0x67, 0xd8, 255))
        .color_inactive(Color::from_rgba(0x66, 0x7e, 0xea, 160))
        .margin(RectOffset::new(10.0, 10.0, 4.0, 4.0))
        .build();
    skin.button_style = button_style;

    ui.push_skin(&skin);

    let mut actions = Vec::new();
    let mut rate = slider_rate;
    let start = *context.rate_range.start();
    let end = *context.rate_range.end();
    let statistics = context.statistics;

    let _ = ui.window(hash!("control_panel"), context.origin, context.size, |ui| {
        for (index, (label, action)) in BUTTONS.iter().enumerate() {
            if index > 0 {
                ui.same_line(0.0);
            }
            if ui.button(None, *label) {
                actions.push(*action);
            }
        }

        ui.slider(hash!("speed"), "Speed", start..end, &mut rate);
        ui.label(None, &format!("Speed: {} gen/s", rate.round()));

        let playback = match statistics.playback {
            PlaybackState::Running => "Running",
            PlaybackState::Stopped => "Stopped",
        };
        ui.label(
            None,
            &format!(
                "Generation: {}   Population: {}   {playback}",
                statistics.generation.get(),
                statistics.population,
            ),
        );
    });

    ui.pop_skin();

    ControlPanelUiResult { actions, rate }
}
