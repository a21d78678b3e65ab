use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use torus_life_core::{AliveProbability, CellCoord, CellState, Command, Event, GridDimensions};
use torus_life_world::{self as world, query, GridEngine};

#[test]
fn deterministic_replay_produces_identical_outcomes() {
    let first = replay(scripted_commands(0x0bad_5eed));
    let second = replay(scripted_commands(0x0bad_5eed));

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.fingerprint(), second.fingerprint());
}

#[test]
fn different_seeds_produce_different_outcomes() {
    let first = replay(scripted_commands(1));
    let second = replay(scripted_commands(2));

    assert_ne!(first.cells, second.cells);
}

#[test]
fn replay_event_log_tracks_every_generation() {
    let outcome = replay(scripted_commands(42));

    let advanced = outcome
        .events
        .iter()
        .filter(|event| matches!(event, Event::GenerationAdvanced { .. }))
        .count();
    assert_eq!(advanced, 12);
    assert!(outcome
        .events
        .iter()
        .any(|event| matches!(event, Event::Randomized { .. })));

    let last_generation = outcome.events.iter().rev().find_map(|event| match event {
        Event::GenerationAdvanced {
            generation,
            population,
        } => Some((*generation, *population)),
        _ => None,
    });
    assert_eq!(
        last_generation.map(|(generation, _)| generation.get()),
        Some(10)
    );
    assert_eq!(
        last_generation.map(|(_, population)| population),
        Some(outcome.population)
    );
}

fn replay(commands: Vec<Command>) -> ReplayOutcome {
    let dimensions = GridDimensions::new(24, 32).expect("valid dimensions");
    let mut engine = GridEngine::new(dimensions);
    let mut events = Vec::new();

    for command in commands {
        world::apply(&mut engine, command, &mut events).expect("scripted commands are valid");
    }

    ReplayOutcome {
        cells: query::grid_view(&engine).cells().to_vec(),
        population: query::population(&engine),
        events,
    }
}

fn scripted_commands(seed: u64) -> Vec<Command> {
    let mut commands = vec![
        Command::ToggleCell {
            cell: CellCoord::new(0, 0),
        },
        Command::Step,
        Command::Step,
        Command::Randomize {
            probability: AliveProbability::DEFAULT,
            seed,
        },
    ];
    commands.extend(std::iter::repeat(Command::Step).take(6));
    commands.push(Command::SetCell {
        cell: CellCoord::new(23, 31),
        state: CellState::Alive,
    });
    commands.extend(std::iter::repeat(Command::Step).take(4));
    commands
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ReplayOutcome {
    cells: Vec<CellState>,
    population: usize,
    events: Vec<Event>,
}

impl ReplayOutcome {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}
