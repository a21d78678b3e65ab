//! Layered configuration: built-in defaults, then an optional TOML file, then flags.

use std::{fs, path::Path};

use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use torus_life_core::{AliveProbability, GridDimensions, TickRate, DEFAULT_COLUMNS, DEFAULT_ROWS};
use torus_life_rendering::GridPresentation;

/// Settings read from a TOML file. Every key is optional.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileConfig {
    pub(crate) rows: Option<u32>,
    pub(crate) columns: Option<u32>,
    pub(crate) rate: Option<f64>,
    pub(crate) alive_probability: Option<f64>,
    pub(crate) cell_size: Option<f32>,
    pub(crate) seed: Option<u64>,
    pub(crate) vsync: Option<bool>,
    pub(crate) show_fps: Option<bool>,
}

impl FileConfig {
    /// Reads and parses the file at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read configuration file {}", path.display()))?;
        Self::parse(&text)
            .with_context(|| format!("failed to parse configuration file {}", path.display()))
    }

    pub(crate) fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Layers `overrides` on top of the file values and validates the result.
    pub(crate) fn resolve(self, overrides: FileConfig) -> Result<SessionConfig> {
        let rows = overrides.rows.or(self.rows).unwrap_or(DEFAULT_ROWS);
        let columns = overrides.columns.or(self.columns).unwrap_or(DEFAULT_COLUMNS);
        let dimensions =
            GridDimensions::new(rows, columns).context("invalid grid dimensions")?;

        let rate = match overrides.rate.or(self.rate) {
            Some(rate) => TickRate::new(rate).context("invalid tick rate")?,
            None => TickRate::DEFAULT,
        };

        let probability = match overrides.alive_probability.or(self.alive_probability) {
            Some(probability) => {
                AliveProbability::new(probability).context("invalid alive probability")?
            }
            None => AliveProbability::DEFAULT,
        };

        let cell_size = overrides
            .cell_size
            .or(self.cell_size)
            .unwrap_or(GridPresentation::DEFAULT_CELL_LENGTH);
        ensure!(
            cell_size.is_finite() && cell_size >= 1.0,
            "cell size must be at least one pixel (received {cell_size})"
        );

        Ok(SessionConfig {
            dimensions,
            rate,
            probability,
            cell_size,
            seed: overrides.seed.or(self.seed),
            vsync: overrides.vsync.or(self.vsync),
            show_fps: overrides.show_fps.or(self.show_fps).unwrap_or(false),
        })
    }
}

/// Validated settings every run mode starts from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct SessionConfig {
    pub(crate) dimensions: GridDimensions,
    pub(crate) rate: TickRate,
    pub(crate) probability: AliveProbability,
    pub(crate) cell_size: f32,
    pub(crate) seed: Option<u64>,
    pub(crate) vsync: Option<bool>,
    pub(crate) show_fps: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dimensions: GridDimensions::DEFAULT,
            rate: TickRate::DEFAULT,
            probability: AliveProbability::DEFAULT,
            cell_size: GridPresentation::DEFAULT_CELL_LENGTH,
            seed: None,
            vsync: None,
            show_fps: false,
        }
    }
}
