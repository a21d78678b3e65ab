//! Software rasterizer that draws the grid portion of a [`Scene`] into memory.
//!
//! Each cell occupies `cell_length` whole pixels along both axes. Alive cells
//! are filled one pixel short of the cell size and a grid line runs along the
//! trailing edge of every cell, so neighbouring live cells remain visually
//! separated.

use std::io::{self, Write};

use crate::{Color, Scene};

/// RGBA raster produced from a scene.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Framebuffer {
    width: usize,
    height: usize,
    pixels: Vec<[u8; 4]>,
}

impl Framebuffer {
    /// Creates a framebuffer filled with a single color.
    #[must_use]
    pub fn filled(width: usize, height: usize, color: Color) -> Self {
        Self {
            width,
            height,
            pixels: vec![color.to_rgba_u8(); width * height],
        }
    }

    /// Rasterizes the grid of the provided scene on a white background.
    #[must_use]
    pub fn render(scene: &Scene) -> Self {
        let grid = &scene.grid;
        let cell = cell_pixels(grid.cell_length);
        let columns = grid.columns as usize;
        let rows = grid.rows as usize;
        let mut frame = Self::filled(columns * cell, rows * cell, Color::WHITE);

        let fill = grid.cell_color.to_rgba_u8();
        for alive in scene.cells.view().alive_cells() {
            let x = alive.column() as usize * cell;
            let y = alive.row() as usize * cell;
            frame.fill_rect(x, y, cell - 1, cell - 1, fill);
        }

        let line = grid.line_color.to_rgba_u8();
        for column in 0..columns {
            frame.fill_rect(column * cell + cell - 1, 0, 1, frame.height, line);
        }
        for row in 0..rows {
            frame.fill_rect(0, row * cell + cell - 1, frame.width, 1, line);
        }

        frame
    }

    /// Width of the raster in pixels.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Height of the raster in pixels.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Color of the pixel at the provided position, or `None` outside the raster.
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }

    /// Encodes the raster as a binary PPM (P6) image, discarding alpha.
    pub fn write_ppm<W: Write>(&self, mut writer: W) -> io::Result<()> {
        write!(writer, "P6\n{} {}\n255\n", self.width, self.height)?;
        let mut payload = Vec::with_capacity(self.pixels.len() * 3);
        for [red, green, blue, _] in &self.pixels {
            payload.extend_from_slice(&[*red, *green, *blue]);
        }
        writer.write_all(&payload)?;
        writer.flush()
    }

    fn fill_rect(&mut self, x: usize, y: usize, width: usize, height: usize, rgba: [u8; 4]) {
        if x >= self.width {
            return;
        }
        let x_end = (x + width).min(self.width);
        let y_end = (y + height).min(self.height);
        for row in y..y_end {
            let start = row * self.width;
            for pixel in &mut self.pixels[start + x..start + x_end] {
                *pixel = rgba;
            }
        }
    }
}

fn cell_pixels(cell_length: f32) -> usize {
    (cell_length.round() as usize).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ControlPanelPresentation, GridPresentation, Statistics};
    use torus_life_core::{CellState, GridDimensions, GridSnapshot};

    fn scene(rows: u32, columns: u32, alive: &[(u32, u32)]) -> Scene {
        let dimensions = GridDimensions::new(rows, columns).expect("valid dimensions");
        let mut cells = vec![CellState::Dead; dimensions.cell_count()];
        for &(row, column) in alive {
            cells[(row * columns + column) as usize] = CellState::Alive;
        }
        Scene::new(
            GridPresentation::from_dimensions(dimensions, 4.0).expect("valid cell length"),
            GridSnapshot::from_cells(dimensions, cells).expect("matching cell count"),
            Statistics::default(),
            ControlPanelPresentation::default(),
        )
    }

    #[test]
    fn render_sizes_raster_from_grid() {
        let frame = Framebuffer::render(&scene(3, 5, &[]));

        assert_eq!(frame.width(), 20);
        assert_eq!(frame.height(), 12);
        assert_eq!(frame.pixels.len(), 240);
    }

    #[test]
    fn alive_cells_fill_all_but_trailing_edge() {
        let frame = Framebuffer::render(&scene(2, 2, &[(1, 0)]));
        let fill = GridPresentation::DEFAULT_CELL_COLOR.to_rgba_u8();
        let line = GridPresentation::DEFAULT_LINE_COLOR.to_rgba_u8();
        let white = Color::WHITE.to_rgba_u8();

        for offset in 0..3 {
            assert_eq!(frame.pixel(offset, 4 + offset), Some(fill));
        }
        assert_eq!(frame.pixel(3, 5), Some(line));
        assert_eq!(frame.pixel(1, 7), Some(line));
        assert_eq!(frame.pixel(5, 5), Some(white));
        assert_eq!(frame.pixel(1, 1), Some(white));
    }

    #[test]
    fn pixel_outside_raster_is_none() {
        let frame = Framebuffer::render(&scene(1, 1, &[]));

        assert_eq!(frame.pixel(4, 0), None);
        assert_eq!(frame.pixel(0, 4), None);
    }

    #[test]
    fn ppm_header_and_payload_match_raster() {
        let frame = Framebuffer::render(&scene(1, 2, &[(0, 1)]));
        let mut encoded = Vec::new();

        frame.write_ppm(&mut encoded).expect("writing to memory");

        let header = b"P6\n8 4\n255\n";
        assert!(encoded.starts_with(header));
        assert_eq!(encoded.len(), header.len() + 8 * 4 * 3);
        let first_fill = header.len() + 4 * 3;
        assert_eq!(&encoded[first_fill..first_fill + 3], &[0x66, 0x7e, 0xea]);
    }
}
