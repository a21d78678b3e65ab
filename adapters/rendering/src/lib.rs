#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Torus Life adapters.

use anyhow::Result as AnyResult;
use glam::Vec2;
use std::{ops::RangeInclusive, time::Duration};
use thiserror::Error;
use torus_life_core::{CellCoord, Generation, GridDimensions, GridSnapshot, PlaybackState, TickRate};

pub mod raster;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }

    /// Quantizes the color into byte RGBA channels.
    #[must_use]
    pub fn to_rgba_u8(self) -> [u8; 4] {
        [
            quantize_channel(self.red),
            quantize_channel(self.green),
            quantize_channel(self.blue),
            quantize_channel(self.alpha),
        ]
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

fn quantize_channel(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Discrete control requests raised by the control panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControlAction {
    /// Begin automatic playback.
    Start,
    /// Halt automatic playback.
    Stop,
    /// Kill every cell.
    Clear,
    /// Fill the grid with random cells.
    Randomize,
    /// Advance exactly one generation and halt playback.
    Step,
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Grid cell under the cursor, or `None` when the cursor is off the grid.
    pub cursor_cell: Option<CellCoord>,
    /// Whether the primary button went down on this frame.
    pub pointer_pressed: bool,
    /// Whether the primary button is held on this frame.
    pub pointer_held: bool,
    /// Whether the primary button was released on this frame.
    pub pointer_released: bool,
    /// Control panel actions raised since the previous frame, in press order.
    pub actions: Vec<ControlAction>,
    /// Playback rate requested through the speed slider, if it moved.
    pub requested_rate: Option<f32>,
}

/// Describes the cell grid drawn by adapters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridPresentation {
    /// Number of rows contained in the grid.
    pub rows: u32,
    /// Number of columns contained in the grid.
    pub columns: u32,
    /// Side length of a single cell expressed in pixels.
    pub cell_length: f32,
    /// Fill color of alive cells.
    pub cell_color: Color,
    /// Color used when drawing grid lines.
    pub line_color: Color,
}

impl GridPresentation {
    /// Default side length of a cell in pixels.
    pub const DEFAULT_CELL_LENGTH: f32 = 10.0;

    /// Default fill color of alive cells.
    pub const DEFAULT_CELL_COLOR: Color = Color::from_rgb_u8(0x66, 0x7e, 0xea);

    /// Default grid line color.
    pub const DEFAULT_LINE_COLOR: Color = Color::from_rgb_u8(0xdd, 0xdd, 0xdd);

    /// Creates a new grid descriptor.
    ///
    /// Returns an error when `cell_length` is not a positive finite number.
    pub fn new(
        rows: u32,
        columns: u32,
        cell_length: f32,
        cell_color: Color,
        line_color: Color,
    ) -> Result<Self, RenderingError> {
        if !cell_length.is_finite() || cell_length <= 0.0 {
            return Err(RenderingError::InvalidCellLength { cell_length });
        }

        Ok(Self {
            rows,
            columns,
            cell_length,
            cell_color,
            line_color,
        })
    }

    /// Creates a descriptor for the provided dimensions using the default palette.
    pub fn from_dimensions(
        dimensions: GridDimensions,
        cell_length: f32,
    ) -> Result<Self, RenderingError> {
        Self::new(
            dimensions.rows(),
            dimensions.columns(),
            cell_length,
            Self::DEFAULT_CELL_COLOR,
            Self::DEFAULT_LINE_COLOR,
        )
    }

    /// Calculates the total width of the grid.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.cell_length
    }

    /// Calculates the total height of the grid.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.rows as f32 * self.cell_length
    }

    /// Top-left corner of the provided cell in surface coordinates.
    #[must_use]
    pub fn cell_origin(&self, cell: CellCoord) -> Vec2 {
        Vec2::new(
            cell.column() as f32 * self.cell_length,
            cell.row() as f32 * self.cell_length,
        )
    }

    /// Maps a surface position to the cell beneath it.
    ///
    /// Returns `None` when the position lies outside the grid.
    #[must_use]
    pub fn cell_at(&self, position: Vec2) -> Option<CellCoord> {
        if self.rows == 0 || self.columns == 0 {
            return None;
        }
        if position.x < 0.0
            || position.y < 0.0
            || position.x >= self.width()
            || position.y >= self.height()
        {
            return None;
        }

        let column = ((position.x / self.cell_length).floor() as u32).min(self.columns - 1);
        let row = ((position.y / self.cell_length).floor() as u32).min(self.rows - 1);
        Some(CellCoord::new(row, column))
    }
}

/// Counters displayed next to the grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Statistics {
    /// Generations computed since the last clear or randomize.
    pub generation: Generation,
    /// Number of alive cells.
    pub population: usize,
    /// Whether automatic playback is active.
    pub playback: PlaybackState,
    /// Current playback rate.
    pub rate: TickRate,
}

impl Default for Statistics {
    fn default() -> Self {
        Self {
            generation: Generation::ZERO,
            population: 0,
            playback: PlaybackState::Stopped,
            rate: TickRate::DEFAULT,
        }
    }
}

/// Layout of the control panel drawn beneath the grid.
#[derive(Clone, Debug, PartialEq)]
pub struct ControlPanelPresentation {
    /// Height reserved for the panel in pixels.
    pub height: f32,
    /// Range offered by the speed slider in ticks per second.
    pub rate_range: RangeInclusive<f32>,
}

impl ControlPanelPresentation {
    /// Default height reserved for the panel.
    pub const DEFAULT_HEIGHT: f32 = 96.0;

    /// Slowest rate offered by the speed slider.
    pub const MIN_RATE: f32 = 1.0;

    /// Fastest rate offered by the speed slider.
    pub const MAX_RATE: f32 = 60.0;

    /// Creates a panel descriptor with the default speed range.
    #[must_use]
    pub fn new(height: f32) -> Self {
        Self {
            height,
            rate_range: Self::MIN_RATE..=Self::MAX_RATE,
        }
    }

    /// Clamps a requested rate into the slider range.
    #[must_use]
    pub fn clamp_rate(&self, rate: f32) -> f32 {
        rate.clamp(*self.rate_range.start(), *self.rate_range.end())
    }
}

impl Default for ControlPanelPresentation {
    fn default() -> Self {
        Self::new(Self::DEFAULT_HEIGHT)
    }
}

/// Scene description combining the grid, its cells, and the control panel.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Grid layout and palette.
    pub grid: GridPresentation,
    /// Cell states captured after the latest mutation.
    pub cells: GridSnapshot,
    /// Counters displayed by the control panel.
    pub statistics: Statistics,
    /// Control panel layout.
    pub control_panel: ControlPanelPresentation,
}

impl Scene {
    /// Creates a new scene descriptor.
    #[must_use]
    pub fn new(
        grid: GridPresentation,
        cells: GridSnapshot,
        statistics: Statistics,
        control_panel: ControlPanelPresentation,
    ) -> Self {
        Self {
            grid,
            cells,
            statistics,
            control_panel,
        }
    }

    /// Replaces the displayed cells and counters.
    pub fn refresh(&mut self, cells: GridSnapshot, statistics: Statistics) {
        self.cells = cells;
        self.statistics = statistics;
    }

    /// Height of the entire scene including the control panel.
    #[must_use]
    pub fn total_height(&self) -> f32 {
        self.grid.height() + self.control_panel.height
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Torus Life scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the monotonic time elapsed
    /// since the backend started, per-frame input captured by the adapter,
    /// and may mutate the scene before it is rendered.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum RenderingError {
    /// Cells must have a positive finite side length.
    #[error("cell_length must be positive and finite (received {cell_length})")]
    InvalidCellLength {
        /// Provided length that failed validation.
        cell_length: f32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: u32, columns: u32, cell_length: f32) -> GridPresentation {
        GridPresentation::new(
            rows,
            columns,
            cell_length,
            GridPresentation::DEFAULT_CELL_COLOR,
            GridPresentation::DEFAULT_LINE_COLOR,
        )
        .expect("positive cell length")
    }

    #[test]
    fn grid_creation_rejects_non_positive_cell_length_without_panicking() {
        for cell_length in [0.0, -4.0, f32::NAN, f32::INFINITY] {
            let error = GridPresentation::new(
                4,
                4,
                cell_length,
                Color::WHITE,
                GridPresentation::DEFAULT_LINE_COLOR,
            )
            .expect_err("invalid cell length must be rejected");

            assert!(matches!(error, RenderingError::InvalidCellLength { .. }));
        }
    }

    #[test]
    fn grid_size_follows_cell_length() {
        let presentation = grid(40, 60, 10.0);

        assert_eq!(presentation.width(), 600.0);
        assert_eq!(presentation.height(), 400.0);
    }

    #[test]
    fn cell_at_maps_positions_to_cells() {
        let presentation = grid(40, 60, 10.0);

        assert_eq!(
            presentation.cell_at(Vec2::new(0.0, 0.0)),
            Some(CellCoord::new(0, 0))
        );
        assert_eq!(
            presentation.cell_at(Vec2::new(25.5, 19.9)),
            Some(CellCoord::new(1, 2))
        );
        assert_eq!(
            presentation.cell_at(Vec2::new(599.9, 399.9)),
            Some(CellCoord::new(39, 59))
        );
    }

    #[test]
    fn cell_at_rejects_positions_outside_the_grid() {
        let presentation = grid(40, 60, 10.0);

        assert_eq!(presentation.cell_at(Vec2::new(-0.1, 5.0)), None);
        assert_eq!(presentation.cell_at(Vec2::new(600.0, 5.0)), None);
        assert_eq!(presentation.cell_at(Vec2::new(5.0, 400.0)), None);
    }

    #[test]
    fn cell_origin_is_inverse_of_cell_at() {
        let presentation = grid(7, 9, 12.0);
        let cell = CellCoord::new(6, 4);

        let origin = presentation.cell_origin(cell);

        assert_eq!(origin, Vec2::new(48.0, 72.0));
        assert_eq!(presentation.cell_at(origin), Some(cell));
    }

    #[test]
    fn default_palette_matches_page_colors() {
        assert_eq!(
            GridPresentation::DEFAULT_CELL_COLOR.to_rgba_u8(),
            [0x66, 0x7e, 0xea, 0xff]
        );
        assert_eq!(
            GridPresentation::DEFAULT_LINE_COLOR.to_rgba_u8(),
            [0xdd, 0xdd, 0xdd, 0xff]
        );
    }

    #[test]
    fn panel_clamps_rates_into_slider_range() {
        let panel = ControlPanelPresentation::default();

        assert_eq!(panel.clamp_rate(0.2), 1.0);
        assert_eq!(panel.clamp_rate(30.0), 30.0);
        assert_eq!(panel.clamp_rate(240.0), 60.0);
    }

    #[test]
    fn scene_height_includes_control_panel() {
        let dimensions = GridDimensions::new(4, 5).expect("valid dimensions");
        let scene = Scene::new(
            grid(4, 5, 10.0),
            GridSnapshot::empty(dimensions),
            Statistics::default(),
            ControlPanelPresentation::new(50.0),
        );

        assert_eq!(scene.total_height(), 90.0);
    }

    #[test]
    fn lighten_moves_towards_white() {
        let color = Color::from_rgb_u8(0, 0, 0).lighten(0.5);

        assert_eq!(color.to_rgba_u8(), [128, 128, 128, 255]);
    }
}
