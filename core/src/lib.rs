#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Torus Life simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative grid engine, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the engine executes them
//! through its `apply` entry point, and then broadcasts [`Event`] values so
//! systems can react. Presentation layers only ever observe the grid through
//! the read-only [`GridView`] and [`GridSnapshot`] projections.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of rows in the grid when no configuration overrides it.
pub const DEFAULT_ROWS: u32 = 40;

/// Number of columns in the grid when no configuration overrides it.
pub const DEFAULT_COLUMNS: u32 = 60;

/// Largest number of cells a grid may hold.
pub const MAX_CELLS: u64 = 1 << 26;

/// Binary state of a single grid cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellState {
    /// The cell is empty.
    #[default]
    Dead,
    /// The cell is populated.
    Alive,
}

impl CellState {
    /// Converts a boolean liveness flag into a cell state.
    #[must_use]
    pub const fn from_alive(alive: bool) -> Self {
        if alive {
            Self::Alive
        } else {
            Self::Dead
        }
    }

    /// Reports whether the cell is populated.
    #[must_use]
    pub const fn is_alive(self) -> bool {
        matches!(self, Self::Alive)
    }

    /// Returns the opposite state.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Dead => Self::Alive,
            Self::Alive => Self::Dead,
        }
    }

    /// Numeric representation of the state, `1` for alive and `0` for dead.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Dead => 0,
            Self::Alive => 1,
        }
    }
}

/// Location of a single grid cell expressed as row and column indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    row: u32,
    column: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }
}

/// Fixed dimensions of a toroidal grid.
///
/// Both axes are guaranteed to be positive; the only way to obtain a value is
/// through [`GridDimensions::new`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "DimensionsRepr", into = "DimensionsRepr")]
pub struct GridDimensions {
    rows: u32,
    columns: u32,
}

impl GridDimensions {
    /// Dimensions used when no configuration overrides them.
    pub const DEFAULT: Self = Self {
        rows: DEFAULT_ROWS,
        columns: DEFAULT_COLUMNS,
    };

    /// Validates and creates grid dimensions.
    ///
    /// Returns [`ConfigurationError::EmptyGrid`] when either axis is zero and
    /// [`ConfigurationError::TooManyCells`] when the grid exceeds [`MAX_CELLS`].
    pub fn new(rows: u32, columns: u32) -> Result<Self, ConfigurationError> {
        if rows == 0 || columns == 0 {
            return Err(ConfigurationError::EmptyGrid { rows, columns });
        }
        if u64::from(rows) * u64::from(columns) > MAX_CELLS {
            return Err(ConfigurationError::TooManyCells { rows, columns });
        }

        Ok(Self { rows, columns })
    }

    /// Number of rows, the grid height.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns, the grid width.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Total number of cells contained in the grid.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let rows = usize::try_from(self.rows).unwrap_or(usize::MAX);
        let columns = usize::try_from(self.columns).unwrap_or(usize::MAX);
        rows.saturating_mul(columns)
    }

    /// Reports whether the coordinate lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.row() < self.rows && cell.column() < self.columns
    }

    /// Row-major index of the cell, or `None` when it lies outside the grid.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }

        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        Some(row * width + column)
    }

    /// Maps an arbitrary signed coordinate onto the torus.
    ///
    /// Uses Euclidean remainders so `-1` lands on the last row or column.
    #[must_use]
    pub fn wrap(&self, row: i64, column: i64) -> CellCoord {
        let wrapped_row = row.rem_euclid(i64::from(self.rows));
        let wrapped_column = column.rem_euclid(i64::from(self.columns));
        CellCoord::new(
            u32::try_from(wrapped_row).unwrap_or(0),
            u32::try_from(wrapped_column).unwrap_or(0),
        )
    }

    /// Iterator over every coordinate in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> {
        let columns = self.columns;
        (0..self.rows).flat_map(move |row| (0..columns).map(move |column| CellCoord::new(row, column)))
    }
}

impl Default for GridDimensions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Clone, Copy, Serialize, Deserialize)]
struct DimensionsRepr {
    rows: u32,
    columns: u32,
}

impl TryFrom<DimensionsRepr> for GridDimensions {
    type Error = ConfigurationError;

    fn try_from(value: DimensionsRepr) -> Result<Self, Self::Error> {
        Self::new(value.rows, value.columns)
    }
}

impl From<GridDimensions> for DimensionsRepr {
    fn from(value: GridDimensions) -> Self {
        Self {
            rows: value.rows,
            columns: value.columns,
        }
    }
}

/// Number of update-rule applications since the grid was last reset.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Generation(u64);

impl Generation {
    /// Generation of a freshly created, cleared, or randomized grid.
    pub const ZERO: Self = Self(0);

    /// Creates a generation counter with the provided value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric counter value.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Returns the generation that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Target simulation rate measured in generations per second.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct TickRate(f64);

impl TickRate {
    /// Rate used when no configuration overrides it.
    pub const DEFAULT: Self = Self(10.0);

    /// Validates and creates a tick rate.
    ///
    /// Returns [`ConfigurationError::NonPositiveRate`] unless the rate is a
    /// positive finite number.
    pub fn new(ticks_per_second: f64) -> Result<Self, ConfigurationError> {
        if ticks_per_second.is_finite() && ticks_per_second > 0.0 {
            Ok(Self(ticks_per_second))
        } else {
            Err(ConfigurationError::NonPositiveRate(ticks_per_second))
        }
    }

    /// Generations per second.
    #[must_use]
    pub const fn get(&self) -> f64 {
        self.0
    }

    /// Duration of a single tick, never shorter than one nanosecond.
    #[must_use]
    pub fn period(&self) -> Duration {
        Duration::try_from_secs_f64(self.0.recip())
            .unwrap_or(Duration::MAX)
            .max(Duration::from_nanos(1))
    }
}

impl Default for TickRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<f64> for TickRate {
    type Error = ConfigurationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TickRate> for f64 {
    fn from(value: TickRate) -> Self {
        value.0
    }
}

/// Probability that a cell is alive after randomization.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct AliveProbability(f64);

impl AliveProbability {
    /// Probability used when no configuration overrides it.
    pub const DEFAULT: Self = Self(0.3);

    /// Validates and creates an alive probability.
    ///
    /// Returns [`ConfigurationError::ProbabilityOutOfRange`] unless the value
    /// lies within `0.0..=1.0`.
    pub fn new(probability: f64) -> Result<Self, ConfigurationError> {
        if (0.0..=1.0).contains(&probability) {
            Ok(Self(probability))
        } else {
            Err(ConfigurationError::ProbabilityOutOfRange(probability))
        }
    }

    /// Probability as a fraction in `0.0..=1.0`.
    #[must_use]
    pub const fn get(&self) -> f64 {
        self.0
    }
}

impl Default for AliveProbability {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<f64> for AliveProbability {
    type Error = ConfigurationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AliveProbability> for f64 {
    fn from(value: AliveProbability) -> Self {
        value.0
    }
}

/// Playback state of the simulation clock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PlaybackState {
    /// Generations only advance through manual steps.
    #[default]
    Stopped,
    /// Generations advance automatically at the configured rate.
    Running,
}

/// Commands that express all permissible grid mutations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    /// Writes an explicit state into one cell.
    SetCell {
        /// Cell to overwrite.
        cell: CellCoord,
        /// State written into the cell.
        state: CellState,
    },
    /// Flips the state of one cell.
    ToggleCell {
        /// Cell to flip.
        cell: CellCoord,
    },
    /// Applies the update rule once to every cell.
    Step,
    /// Kills every cell and resets the generation counter.
    Clear,
    /// Replaces the grid with independently random cells and resets the generation counter.
    Randomize {
        /// Chance that any individual cell ends up alive.
        probability: AliveProbability,
        /// Seed feeding the deterministic generator used for this randomization.
        seed: u64,
    },
}

/// Events broadcast by the engine after processing commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// Confirms that a single cell changed state through an edit.
    CellChanged {
        /// Cell that changed.
        cell: CellCoord,
        /// State the cell holds after the edit.
        state: CellState,
    },
    /// Announces that a full generation was computed.
    GenerationAdvanced {
        /// Generation counter after the step.
        generation: Generation,
        /// Number of alive cells after the step.
        population: usize,
    },
    /// Confirms that every cell was killed.
    Cleared,
    /// Confirms that the grid was randomized.
    Randomized {
        /// Number of alive cells after randomization.
        population: usize,
    },
}

/// Read-only view into the live cell buffer.
#[derive(Clone, Copy, Debug)]
pub struct GridView<'a> {
    dimensions: GridDimensions,
    cells: &'a [CellState],
}

impl<'a> GridView<'a> {
    /// Captures a new view backed by the provided row-major cell slice.
    #[must_use]
    pub fn new(dimensions: GridDimensions, cells: &'a [CellState]) -> Self {
        debug_assert_eq!(cells.len(), dimensions.cell_count());
        Self { dimensions, cells }
    }

    /// Dimensions of the underlying grid.
    #[must_use]
    pub const fn dimensions(&self) -> GridDimensions {
        self.dimensions
    }

    /// State of the provided cell, or `None` when it lies outside the grid.
    #[must_use]
    pub fn state(&self, cell: CellCoord) -> Option<CellState> {
        self.dimensions
            .index(cell)
            .and_then(|index| self.cells.get(index).copied())
    }

    /// Row-major slice of every cell.
    #[must_use]
    pub fn cells(&self) -> &'a [CellState] {
        self.cells
    }

    /// Iterator over the coordinates of every alive cell in row-major order.
    pub fn alive_cells(&self) -> impl Iterator<Item = CellCoord> + 'a {
        let cells = self.cells;
        self.dimensions
            .cells()
            .zip(cells.iter())
            .filter(|(_, state)| state.is_alive())
            .map(|(cell, _)| cell)
    }

    /// Number of alive cells, recomputed on every call.
    #[must_use]
    pub fn population(&self) -> usize {
        self.cells.iter().filter(|state| state.is_alive()).count()
    }

    /// Copies the view into an owned snapshot.
    #[must_use]
    pub fn to_snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            dimensions: self.dimensions,
            cells: self.cells.to_vec(),
        }
    }
}

/// Owned copy of the grid that presentation layers may keep across frames.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "SnapshotRepr")]
pub struct GridSnapshot {
    dimensions: GridDimensions,
    cells: Vec<CellState>,
}

impl GridSnapshot {
    /// Creates an all-dead snapshot with the provided dimensions.
    #[must_use]
    pub fn empty(dimensions: GridDimensions) -> Self {
        Self {
            dimensions,
            cells: vec![CellState::Dead; dimensions.cell_count()],
        }
    }

    /// Creates a snapshot from row-major cells.
    ///
    /// Returns [`ConfigurationError::CellCountMismatch`] when the number of
    /// cells does not match the dimensions.
    pub fn from_cells(
        dimensions: GridDimensions,
        cells: Vec<CellState>,
    ) -> Result<Self, ConfigurationError> {
        let expected = dimensions.cell_count();
        if cells.len() != expected {
            return Err(ConfigurationError::CellCountMismatch {
                expected,
                actual: cells.len(),
            });
        }

        Ok(Self { dimensions, cells })
    }

    /// Borrows the snapshot as a [`GridView`].
    #[must_use]
    pub fn view(&self) -> GridView<'_> {
        GridView {
            dimensions: self.dimensions,
            cells: &self.cells,
        }
    }

    /// Dimensions of the captured grid.
    #[must_use]
    pub const fn dimensions(&self) -> GridDimensions {
        self.dimensions
    }
}

#[derive(Deserialize)]
struct SnapshotRepr {
    dimensions: GridDimensions,
    cells: Vec<CellState>,
}

impl TryFrom<SnapshotRepr> for GridSnapshot {
    type Error = ConfigurationError;

    fn try_from(value: SnapshotRepr) -> Result<Self, Self::Error> {
        Self::from_cells(value.dimensions, value.cells)
    }
}

/// Invalid configuration values rejected before a simulation is built.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum ConfigurationError {
    /// Grid dimensions must be positive along both axes.
    #[error("grid dimensions must be positive (received {rows}x{columns})")]
    EmptyGrid {
        /// Requested number of rows.
        rows: u32,
        /// Requested number of columns.
        columns: u32,
    },
    /// Grids may hold at most [`MAX_CELLS`] cells.
    #[error("a {rows}x{columns} grid exceeds the limit of {max} cells", max = MAX_CELLS)]
    TooManyCells {
        /// Requested number of rows.
        rows: u32,
        /// Requested number of columns.
        columns: u32,
    },
    /// Tick rates must be positive finite numbers.
    #[error("tick rate must be a positive number of generations per second (received {0})")]
    NonPositiveRate(f64),
    /// Alive probabilities must lie between zero and one.
    #[error("alive probability must lie within 0.0..=1.0 (received {0})")]
    ProbabilityOutOfRange(f64),
    /// A cell buffer did not match the grid dimensions.
    #[error("expected {expected} cells but received {actual}")]
    CellCountMismatch {
        /// Cell count implied by the dimensions.
        expected: usize,
        /// Cell count actually provided.
        actual: usize,
    },
}

/// Errors reported by grid operations.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum GridError {
    /// The requested cell lies outside the grid bounds.
    #[error("cell ({row}, {column}) lies outside the {rows}x{columns} grid")]
    OutOfRange {
        /// Requested row index.
        row: u32,
        /// Requested column index.
        column: u32,
        /// Number of rows in the grid.
        rows: u32,
        /// Number of columns in the grid.
        columns: u32,
    },
    /// The grid could not be configured with the provided values.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigurationError),
}

impl GridError {
    /// Builds an [`GridError::OutOfRange`] for the provided cell and grid.
    #[must_use]
    pub const fn out_of_range(cell: CellCoord, dimensions: GridDimensions) -> Self {
        Self::OutOfRange {
            row: cell.row(),
            column: cell.column(),
            rows: dimensions.rows(),
            columns: dimensions.columns(),
        }
    }
}
