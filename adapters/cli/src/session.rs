//! Frame-by-frame wiring between the presentation layer and the simulation.

use std::time::Duration;

use anyhow::{Context, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use torus_life_core::{AliveProbability, Command, Event, TickRate};
use torus_life_rendering::{
    ControlAction, ControlPanelPresentation, FrameInput, GridPresentation, Scene, Statistics,
};
use torus_life_system_brush::{Brush, PointerEvent};
use torus_life_system_clock::SimulationClock;
use torus_life_world::{self as world, GridEngine};
use tracing::{debug, warn};

use crate::config::SessionConfig;

/// Owns the engine, the clock, and the brush, and routes input between them.
#[derive(Debug)]
pub(crate) struct Session {
    engine: GridEngine,
    clock: SimulationClock,
    brush: Brush,
    probability: AliveProbability,
    seeds: ChaCha8Rng,
    commands: Vec<Command>,
    events: Vec<Event>,
}

impl Session {
    /// Creates a session with an all-dead grid and a stopped clock.
    ///
    /// `seed` feeds the stream of seeds handed to every randomization.
    pub(crate) fn new(config: &SessionConfig, seed: u64) -> Self {
        debug!(
            rows = config.dimensions.rows(),
            columns = config.dimensions.columns(),
            seed,
            "session created"
        );
        Self {
            engine: GridEngine::new(config.dimensions),
            clock: SimulationClock::new(config.rate),
            brush: Brush::default(),
            probability: config.probability,
            seeds: ChaCha8Rng::seed_from_u64(seed),
            commands: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Builds the initial scene for the current grid.
    pub(crate) fn scene(&self, cell_length: f32) -> Result<Scene> {
        let grid = GridPresentation::from_dimensions(self.engine.dimensions(), cell_length)
            .context("failed to describe the grid")?;
        Ok(Scene::new(
            grid,
            self.engine.view().to_snapshot(),
            self.statistics(),
            ControlPanelPresentation::default(),
        ))
    }

    /// Processes one frame: control actions, rate changes, pointer edits, and
    /// then the clock tick, before refreshing `scene`.
    pub(crate) fn advance(&mut self, now: Duration, input: FrameInput, scene: &mut Scene) {
        for action in &input.actions {
            self.perform(*action, now);
        }

        if let Some(rate) = input.requested_rate {
            match TickRate::new(f64::from(rate)) {
                Ok(rate) => self.clock.set_rate(rate),
                Err(error) => warn!(%error, "ignoring requested rate"),
            }
        }

        self.handle_pointer(&input);
        let _ = self.tick(now);

        self.refresh(scene);
    }

    /// Applies a single control action immediately.
    pub(crate) fn perform(&mut self, action: ControlAction, now: Duration) {
        match action {
            ControlAction::Start => self.clock.start(now),
            ControlAction::Stop => self.clock.stop(),
            ControlAction::Clear => self.commands.push(Command::Clear),
            ControlAction::Randomize => {
                let seed = self.seeds.gen();
                self.commands.push(Command::Randomize {
                    probability: self.probability,
                    seed,
                });
            }
            ControlAction::Step => self.clock.step(&mut self.commands),
        }
        self.flush();
    }

    /// Evaluates the clock at `now`, returning whether a generation was computed.
    pub(crate) fn tick(&mut self, now: Duration) -> bool {
        let stepped = self.clock.on_tick(now, &mut self.commands);
        self.flush();
        stepped
    }

    /// Earliest timestamp at which the running clock computes a generation.
    pub(crate) fn next_tick(&self) -> Option<Duration> {
        self.clock.next_tick()
    }

    /// Counters describing the current grid and playback.
    pub(crate) fn statistics(&self) -> Statistics {
        Statistics {
            generation: self.engine.generation(),
            population: self.engine.population(),
            playback: self.clock.state(),
            rate: self.clock.rate(),
        }
    }

    /// Copies the current grid and counters into `scene`.
    pub(crate) fn refresh(&self, scene: &mut Scene) {
        scene.refresh(self.engine.view().to_snapshot(), self.statistics());
    }

    fn handle_pointer(&mut self, input: &FrameInput) {
        let mut pointers = Vec::with_capacity(2);
        if input.pointer_pressed {
            if let Some(cell) = input.cursor_cell {
                pointers.push(PointerEvent::Pressed(cell));
            }
        } else if input.pointer_held && self.brush.is_painting() {
            pointers.push(match input.cursor_cell {
                Some(cell) => PointerEvent::Moved(cell),
                None => PointerEvent::Left,
            });
        }
        if input.pointer_released {
            pointers.push(PointerEvent::Released);
        }

        for pointer in pointers {
            self.brush
                .handle(pointer, self.engine.view(), &mut self.commands);
        }
        self.flush();
    }

    fn flush(&mut self) {
        for command in self.commands.drain(..) {
            if let Err(error) = world::apply(&mut self.engine, command, &mut self.events) {
                warn!(%error, ?command, "rejected grid command");
            }
        }
        self.clock.handle(&self.events);
        self.events.clear();
    }
}
