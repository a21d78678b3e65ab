#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pointer editing system that turns clicks and drags into cell commands.
//!
//! Pressing the pointer toggles the touched cell and locks the stroke to the
//! state that cell received. Dragging then paints that same state onto every
//! cell the pointer enters, so a stroke started on a dead cell only ever brings
//! cells to life and one started on an alive cell only ever erases.

use torus_life_core::{CellCoord, CellState, Command, GridView};

/// Discrete pointer observations supplied by an adapter.
///
/// Adapters clamp raw pointer positions to the grid before producing these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerEvent {
    /// The primary button went down over the provided cell.
    Pressed(CellCoord),
    /// The pointer moved over the provided cell.
    Moved(CellCoord),
    /// The primary button was released.
    Released,
    /// The pointer left the grid surface.
    Left,
}

/// Pure system that tracks the active stroke and emits edit commands.
#[derive(Clone, Debug, Default)]
pub struct Brush {
    stroke: Option<Stroke>,
}

#[derive(Clone, Copy, Debug)]
struct Stroke {
    paint: CellState,
    last_cell: CellCoord,
}

impl Brush {
    /// Consumes a pointer observation and the current grid, pushing the edits it implies.
    pub fn handle(&mut self, pointer: PointerEvent, grid: GridView<'_>, out: &mut Vec<Command>) {
        match pointer {
            PointerEvent::Pressed(cell) => {
                let Some(current) = grid.state(cell) else {
                    self.stroke = None;
                    return;
                };
                let paint = current.toggled();
                self.stroke = Some(Stroke {
                    paint,
                    last_cell: cell,
                });
                out.push(Command::SetCell { cell, state: paint });
            }
            PointerEvent::Moved(cell) => {
                let Some(stroke) = self.stroke.as_mut() else {
                    return;
                };
                if stroke.last_cell == cell || grid.state(cell).is_none() {
                    return;
                }
                stroke.last_cell = cell;
                out.push(Command::SetCell {
                    cell,
                    state: stroke.paint,
                });
            }
            PointerEvent::Released | PointerEvent::Left => {
                self.stroke = None;
            }
        }
    }

    /// Reports whether a press-drag gesture is currently in progress.
    #[must_use]
    pub fn is_painting(&self) -> bool {
        self.stroke.is_some()
    }
}
