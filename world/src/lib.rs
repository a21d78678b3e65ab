#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative grid state management for Torus Life.
//!
//! [`GridEngine`] owns the cell matrix of a fixed-size toroidal grid. The next
//! generation is always computed into a separate scratch buffer from an
//! untouched snapshot of the current one, then swapped in wholesale, so
//! neighbor counts never observe cells updated during the same step.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use torus_life_core::{
    AliveProbability, CellCoord, CellState, Command, Event, Generation, GridDimensions, GridError,
    GridView,
};
use tracing::{debug, trace};

/// Relative offsets of the eight Moore neighbors.
const NEIGHBOR_OFFSETS: [(i64, i64); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Owns the cell matrix and applies Conway's update rule to it.
#[derive(Clone, Debug)]
pub struct GridEngine {
    dimensions: GridDimensions,
    cells: Vec<CellState>,
    scratch: Vec<CellState>,
    generation: Generation,
}

impl GridEngine {
    /// Creates an all-dead grid with the provided dimensions.
    #[must_use]
    pub fn new(dimensions: GridDimensions) -> Self {
        let cell_count = dimensions.cell_count();
        Self {
            dimensions,
            cells: vec![CellState::Dead; cell_count],
            scratch: vec![CellState::Dead; cell_count],
            generation: Generation::ZERO,
        }
    }

    /// Creates an all-dead grid with `rows` by `columns` cells.
    ///
    /// Fails with [`GridError::InvalidConfiguration`] when either axis is zero.
    pub fn with_size(rows: u32, columns: u32) -> Result<Self, GridError> {
        let dimensions = GridDimensions::new(rows, columns)?;
        Ok(Self::new(dimensions))
    }

    /// Fixed dimensions chosen at construction.
    #[must_use]
    pub const fn dimensions(&self) -> GridDimensions {
        self.dimensions
    }

    /// Reads the state of a cell.
    pub fn get(&self, cell: CellCoord) -> Result<CellState, GridError> {
        let index = self.checked_index(cell)?;
        Ok(self.cells[index])
    }

    /// Writes the state of a cell without touching the generation counter.
    pub fn set_alive(&mut self, cell: CellCoord, state: CellState) -> Result<(), GridError> {
        let index = self.checked_index(cell)?;
        self.cells[index] = state;
        Ok(())
    }

    /// Flips the state of a cell and returns the state it holds afterwards.
    pub fn toggle(&mut self, cell: CellCoord) -> Result<CellState, GridError> {
        let index = self.checked_index(cell)?;
        let toggled = self.cells[index].toggled();
        self.cells[index] = toggled;
        Ok(toggled)
    }

    /// Counts the alive cells in the Moore neighborhood of `cell`, wrapping
    /// around every edge of the grid.
    pub fn count_neighbors(&self, cell: CellCoord) -> Result<u8, GridError> {
        let _ = self.checked_index(cell)?;
        Ok(count_wrapped_neighbors(&self.cells, self.dimensions, cell))
    }

    /// Computes the next generation and advances the generation counter.
    ///
    /// Every cell is evaluated against the pre-step grid: alive cells with two
    /// or three alive neighbors survive, dead cells with exactly three are
    /// born, and everything else is dead afterwards.
    pub fn step(&mut self) {
        let dimensions = self.dimensions;
        let current = &self.cells;
        let cells = dimensions.cells().zip(current.iter());
        for ((cell, &state), next) in cells.zip(self.scratch.iter_mut()) {
            let neighbors = count_wrapped_neighbors(current, dimensions, cell);
            *next = next_state(state, neighbors);
        }

        std::mem::swap(&mut self.cells, &mut self.scratch);
        self.generation = self.generation.next();
        trace!(generation = self.generation.get(), "generation advanced");
    }

    /// Kills every cell and resets the generation counter.
    pub fn clear(&mut self) {
        self.cells.fill(CellState::Dead);
        self.generation = Generation::ZERO;
        debug!("grid cleared");
    }

    /// Replaces every cell with an independent draw from `rng` and resets the
    /// generation counter.
    pub fn randomize<R>(&mut self, probability: AliveProbability, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        for cell in &mut self.cells {
            *cell = CellState::from_alive(rng.gen_bool(probability.get()));
        }
        self.generation = Generation::ZERO;
        debug!(
            probability = probability.get(),
            population = self.population(),
            "grid randomized"
        );
    }

    /// Number of alive cells, recomputed from the grid on every call.
    #[must_use]
    pub fn population(&self) -> usize {
        self.view().population()
    }

    /// Number of generations computed since the last reset.
    #[must_use]
    pub const fn generation(&self) -> Generation {
        self.generation
    }

    /// Read-only view of the current generation.
    #[must_use]
    pub fn view(&self) -> GridView<'_> {
        GridView::new(self.dimensions, &self.cells)
    }

    /// Builds an engine whose only alive cells are the provided ones.
    pub fn from_alive_cells<I>(dimensions: GridDimensions, alive: I) -> Result<Self, GridError>
    where
        I: IntoIterator<Item = CellCoord>,
    {
        let mut engine = Self::new(dimensions);
        for cell in alive {
            engine.set_alive(cell, CellState::Alive)?;
        }
        Ok(engine)
    }

    fn checked_index(&self, cell: CellCoord) -> Result<usize, GridError> {
        self.dimensions
            .index(cell)
            .ok_or_else(|| GridError::out_of_range(cell, self.dimensions))
    }
}

impl Default for GridEngine {
    fn default() -> Self {
        Self::new(GridDimensions::DEFAULT)
    }
}

/// Applies the provided command to the engine, broadcasting the resulting events.
///
/// Commands are validated before any mutation occurs: a rejected command leaves
/// the grid untouched and pushes no events.
pub fn apply(
    engine: &mut GridEngine,
    command: Command,
    out_events: &mut Vec<Event>,
) -> Result<(), GridError> {
    match command {
        Command::SetCell { cell, state } => {
            if engine.get(cell)? != state {
                engine.set_alive(cell, state)?;
                out_events.push(Event::CellChanged { cell, state });
            }
        }
        Command::ToggleCell { cell } => {
            let state = engine.toggle(cell)?;
            out_events.push(Event::CellChanged { cell, state });
        }
        Command::Step => {
            engine.step();
            out_events.push(Event::GenerationAdvanced {
                generation: engine.generation(),
                population: engine.population(),
            });
        }
        Command::Clear => {
            engine.clear();
            out_events.push(Event::Cleared);
        }
        Command::Randomize { probability, seed } => {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            engine.randomize(probability, &mut rng);
            out_events.push(Event::Randomized {
                population: engine.population(),
            });
        }
    }

    Ok(())
}

/// Query functions that provide read-only access to the engine state.
pub mod query {
    use super::GridEngine;
    use torus_life_core::{CellCoord, CellState, Generation, GridDimensions, GridError, GridView};

    /// Dimensions of the engine's grid.
    #[must_use]
    pub fn dimensions(engine: &GridEngine) -> GridDimensions {
        engine.dimensions()
    }

    /// Current generation counter.
    #[must_use]
    pub fn generation(engine: &GridEngine) -> Generation {
        engine.generation()
    }

    /// Current number of alive cells.
    #[must_use]
    pub fn population(engine: &GridEngine) -> usize {
        engine.population()
    }

    /// Read-only view of the live cells.
    #[must_use]
    pub fn grid_view(engine: &GridEngine) -> GridView<'_> {
        engine.view()
    }

    /// State of a single cell.
    pub fn cell(engine: &GridEngine, cell: CellCoord) -> Result<CellState, GridError> {
        engine.get(cell)
    }
}

fn count_wrapped_neighbors(cells: &[CellState], dimensions: GridDimensions, cell: CellCoord) -> u8 {
    let row = i64::from(cell.row());
    let column = i64::from(cell.column());

    NEIGHBOR_OFFSETS
        .iter()
        .map(|&(row_offset, column_offset)| dimensions.wrap(row + row_offset, column + column_offset))
        .filter_map(|neighbor| dimensions.index(neighbor))
        .filter(|&index| cells[index].is_alive())
        .fold(0, |count, _| count + 1)
}

const fn next_state(current: CellState, neighbors: u8) -> CellState {
    match (current, neighbors) {
        (CellState::Alive, 2 | 3) | (CellState::Dead, 3) => CellState::Alive,
        _ => CellState::Dead,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use torus_life_core::ConfigurationError;

    fn cell(row: u32, column: u32) -> CellCoord {
        CellCoord::new(row, column)
    }

    fn engine_with(rows: u32, columns: u32, alive: &[CellCoord]) -> GridEngine {
        let dimensions = GridDimensions::new(rows, columns).expect("valid dimensions");
        GridEngine::from_alive_cells(dimensions, alive.iter().copied()).expect("cells inside grid")
    }

    fn alive_cells(engine: &GridEngine) -> Vec<CellCoord> {
        engine.view().alive_cells().collect()
    }

    #[test]
    fn new_engine_is_empty_at_generation_zero() {
        let engine = GridEngine::with_size(4, 7).expect("valid dimensions");

        assert_eq!(engine.population(), 0);
        assert_eq!(engine.generation(), Generation::ZERO);
        assert_eq!(engine.dimensions().rows(), 4);
        assert_eq!(engine.dimensions().columns(), 7);
    }

    #[test]
    fn with_size_rejects_zero_dimensions() {
        let error = GridEngine::with_size(0, 3).expect_err("zero rows must be rejected");

        assert!(matches!(
            error,
            GridError::InvalidConfiguration(ConfigurationError::EmptyGrid { rows: 0, columns: 3 })
        ));
    }

    #[test]
    fn accessors_reject_cells_outside_grid() {
        let mut engine = GridEngine::with_size(3, 3).expect("valid dimensions");

        assert!(matches!(
            engine.get(cell(3, 0)),
            Err(GridError::OutOfRange { row: 3, column: 0, .. })
        ));
        assert!(engine.set_alive(cell(0, 3), CellState::Alive).is_err());
        assert!(engine.toggle(cell(9, 9)).is_err());
        assert!(engine.count_neighbors(cell(3, 3)).is_err());
        assert_eq!(engine.population(), 0);
    }

    #[test]
    fn set_alive_does_not_advance_generation() {
        let mut engine = GridEngine::with_size(3, 3).expect("valid dimensions");
        engine.step();
        engine
            .set_alive(cell(1, 1), CellState::Alive)
            .expect("cell inside grid");

        assert_eq!(engine.generation(), Generation::new(1));
        assert_eq!(engine.get(cell(1, 1)), Ok(CellState::Alive));
    }

    #[test]
    fn toggle_flips_state_and_reports_result() {
        let mut engine = GridEngine::with_size(3, 3).expect("valid dimensions");

        assert_eq!(engine.toggle(cell(2, 1)), Ok(CellState::Alive));
        assert_eq!(engine.toggle(cell(2, 1)), Ok(CellState::Dead));
    }

    #[test]
    fn count_neighbors_wraps_around_corners() {
        let mut engine = GridEngine::with_size(5, 5).expect("valid dimensions");
        for alive in [cell(4, 4), cell(4, 0), cell(0, 4), cell(1, 1)] {
            engine.set_alive(alive, CellState::Alive).expect("cell inside grid");
        }

        assert_eq!(engine.count_neighbors(cell(0, 0)), Ok(4));
        assert_eq!(engine.count_neighbors(cell(2, 2)), Ok(1));
        assert_eq!(engine.count_neighbors(cell(4, 4)), Ok(2));
    }

    #[test]
    fn count_neighbors_never_counts_the_cell_itself() {
        let mut engine = GridEngine::with_size(3, 3).expect("valid dimensions");
        engine.set_alive(cell(1, 1), CellState::Alive).expect("cell inside grid");

        assert_eq!(engine.count_neighbors(cell(1, 1)), Ok(0));
    }

    #[test]
    fn full_tiny_torus_counts_every_neighbor_image() {
        let mut engine = GridEngine::with_size(1, 1).expect("valid dimensions");
        engine.set_alive(cell(0, 0), CellState::Alive).expect("cell inside grid");

        assert_eq!(engine.count_neighbors(cell(0, 0)), Ok(8));
    }

    #[test]
    fn next_state_follows_b3_s23() {
        for neighbors in 0..=8 {
            let survives = next_state(CellState::Alive, neighbors);
            let born = next_state(CellState::Dead, neighbors);
            assert_eq!(survives.is_alive(), neighbors == 2 || neighbors == 3);
            assert_eq!(born.is_alive(), neighbors == 3);
        }
    }

    #[test]
    fn step_reads_only_the_pre_step_snapshot() {
        // An L-tromino grows into a block; updating in place would let the
        // first birth feed into later neighbor counts and produce a different shape.
        let mut engine = engine_with(6, 6, &[cell(2, 2), cell(2, 3), cell(3, 2)]);

        engine.step();

        assert_eq!(
            alive_cells(&engine),
            vec![cell(2, 2), cell(2, 3), cell(3, 2), cell(3, 3)]
        );
    }

    #[test]
    fn clear_kills_cells_and_resets_generation() {
        let mut engine = engine_with(4, 4, &[cell(0, 0), cell(1, 1)]);
        engine.step();
        engine.clear();

        assert_eq!(engine.population(), 0);
        assert_eq!(engine.generation(), Generation::ZERO);
    }

    #[test]
    fn randomize_with_extreme_probabilities_fills_or_empties_grid() {
        let mut engine = GridEngine::with_size(6, 9).expect("valid dimensions");
        let mut rng = StepRng::new(0, 0x9e37_79b9_7f4a_7c15);

        engine.step();
        engine.randomize(AliveProbability::new(1.0).expect("valid"), &mut rng);
        assert_eq!(engine.population(), 54);
        assert_eq!(engine.generation(), Generation::ZERO);

        engine.randomize(AliveProbability::new(0.0).expect("valid"), &mut rng);
        assert_eq!(engine.population(), 0);
    }

    #[test]
    fn apply_reports_each_mutation() {
        let mut engine = GridEngine::with_size(5, 5).expect("valid dimensions");
        let mut events = Vec::new();

        apply(&mut engine, Command::ToggleCell { cell: cell(2, 2) }, &mut events)
            .expect("cell inside grid");
        apply(&mut engine, Command::Step, &mut events).expect("step never fails");
        apply(&mut engine, Command::Clear, &mut events).expect("clear never fails");

        assert_eq!(
            events,
            vec![
                Event::CellChanged {
                    cell: cell(2, 2),
                    state: CellState::Alive
                },
                Event::GenerationAdvanced {
                    generation: Generation::new(1),
                    population: 0
                },
                Event::Cleared,
            ]
        );
    }

    #[test]
    fn apply_skips_events_for_unchanged_cells() {
        let mut engine = GridEngine::with_size(5, 5).expect("valid dimensions");
        let mut events = Vec::new();

        apply(
            &mut engine,
            Command::SetCell {
                cell: cell(1, 1),
                state: CellState::Dead,
            },
            &mut events,
        )
        .expect("cell inside grid");

        assert!(events.is_empty());
    }

    #[test]
    fn apply_rejects_out_of_range_edits_without_side_effects() {
        let mut engine = GridEngine::with_size(5, 5).expect("valid dimensions");
        let mut events = Vec::new();

        let result = apply(
            &mut engine,
            Command::SetCell {
                cell: cell(5, 1),
                state: CellState::Alive,
            },
            &mut events,
        );

        assert!(matches!(result, Err(GridError::OutOfRange { .. })));
        assert!(events.is_empty());
        assert_eq!(engine.population(), 0);
    }

    #[test]
    fn apply_randomize_is_reproducible_for_equal_seeds() {
        let probability = AliveProbability::DEFAULT;
        let mut first = GridEngine::with_size(12, 12).expect("valid dimensions");
        let mut second = GridEngine::with_size(12, 12).expect("valid dimensions");
        let mut first_events = Vec::new();
        let mut second_events = Vec::new();

        apply(
            &mut first,
            Command::Randomize {
                probability,
                seed: 7,
            },
            &mut first_events,
        )
        .expect("randomize never fails");
        apply(
            &mut second,
            Command::Randomize {
                probability,
                seed: 7,
            },
            &mut second_events,
        )
        .expect("randomize never fails");

        assert_eq!(first.view().cells(), second.view().cells());
        assert_eq!(first_events, second_events);
    }
}
