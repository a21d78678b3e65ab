//! Windowless runs driven by a synthetic 60 Hz frame stream.

use std::{fs::File, io::BufWriter, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use torus_life_core::Generation;
use torus_life_rendering::{raster::Framebuffer, ControlAction};
use tracing::info;

use crate::{config::SessionConfig, session::Session};

/// Length of one synthetic frame.
const FRAME_NANOS: u64 = 16_666_667;

/// Options accepted by a headless run.
#[derive(Clone, Debug, Default)]
pub(crate) struct HeadlessOptions<'a> {
    pub(crate) generations: u64,
    pub(crate) randomize: bool,
    pub(crate) output: Option<&'a Path>,
}

/// Outcome of a headless run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct HeadlessReport {
    pub(crate) generation: Generation,
    pub(crate) population: usize,
    pub(crate) frames: u64,
}

/// Plays the simulation until the requested generation is reached.
pub(crate) fn run(
    config: &SessionConfig,
    seed: u64,
    options: &HeadlessOptions<'_>,
) -> Result<HeadlessReport> {
    let mut session = Session::new(config, seed);
    if options.randomize {
        session.perform(ControlAction::Randomize, Duration::ZERO);
    }
    let initial = session.statistics();
    info!(population = initial.population, "headless run starting");

    session.perform(ControlAction::Start, Duration::ZERO);
    let mut frames = 0_u64;
    while session.statistics().generation.get() < options.generations {
        let Some((frame, now)) = next_stepping_frame(&session, frames) else {
            bail!(
                "a rate of {} generations per second cannot reach generation {} before the frame clock overflows",
                config.rate.get(),
                options.generations
            );
        };
        frames = frame;
        if !session.tick(now) {
            bail!(
                "playback stopped at frame {frames} before generation {}",
                options.generations
            );
        }
        let statistics = session.statistics();
        info!(
            generation = statistics.generation.get(),
            population = statistics.population,
            "generation computed"
        );
    }

    if let Some(path) = options.output {
        write_frame(&session, config.cell_size, path)?;
        info!(path = %path.display(), "final frame written");
    }

    let statistics = session.statistics();
    Ok(HeadlessReport {
        generation: statistics.generation,
        population: statistics.population,
        frames,
    })
}

/// First frame after `frames` whose timestamp reaches the next scheduled tick.
///
/// Frames in between cannot step, so the run skips straight past them.
fn next_stepping_frame(session: &Session, frames: u64) -> Option<(u64, Duration)> {
    let due = session.next_tick()?.as_nanos();
    let frame_nanos = u128::from(FRAME_NANOS);
    let due_frame = u64::try_from((due + frame_nanos - 1) / frame_nanos).ok()?;
    let frame = due_frame.max(frames.checked_add(1)?);
    let now = FRAME_NANOS.checked_mul(frame)?;
    Some((frame, Duration::from_nanos(now)))
}

fn write_frame(session: &Session, cell_size: f32, path: &Path) -> Result<()> {
    let scene = session.scene(cell_size)?;
    let frame = Framebuffer::render(&scene);
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    frame
        .write_ppm(BufWriter::new(file))
        .with_context(|| format!("failed to write {}", path.display()))
}
