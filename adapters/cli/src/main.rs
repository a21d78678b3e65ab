#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots Torus Life in a window or headless.

mod config;
mod headless;
mod session;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use torus_life_rendering::{Color, Presentation, RenderingBackend};
use torus_life_rendering_macroquad::MacroquadBackend;
use tracing::info;
use tracing_subscriber::EnvFilter;

use self::{
    config::{FileConfig, SessionConfig},
    headless::HeadlessOptions,
    session::Session,
};

/// Conway's Game of Life on a toroidal grid.
#[derive(Debug, Parser)]
#[command(name = "torus-life", version)]
struct CliArgs {
    /// TOML file providing defaults for every other option.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Number of grid rows.
    #[arg(long)]
    rows: Option<u32>,
    /// Number of grid columns.
    #[arg(long)]
    columns: Option<u32>,
    /// Playback rate in generations per second.
    #[arg(long)]
    rate: Option<f64>,
    /// Chance that a cell is alive after randomizing.
    #[arg(long, value_name = "P")]
    alive_probability: Option<f64>,
    /// Side length of a cell in pixels.
    #[arg(long, value_name = "PX")]
    cell_size: Option<f32>,
    /// Seed for the randomization stream; drawn from the OS when omitted.
    #[arg(long)]
    seed: Option<u64>,
    /// Synchronise presentation with the display refresh rate.
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    vsync: Option<bool>,
    /// Log frame timing once per second.
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    show_fps: Option<bool>,
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Run without a window and report statistics.
    Headless {
        /// Number of generations to compute.
        #[arg(long)]
        generations: u64,
        /// Randomize the grid before playing.
        #[arg(long)]
        randomize: bool,
        /// Write the final frame to a binary PPM file.
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

impl CliArgs {
    fn overrides(&self) -> FileConfig {
        FileConfig {
            rows: self.rows,
            columns: self.columns,
            rate: self.rate,
            alive_probability: self.alive_probability,
            cell_size: self.cell_size,
            seed: self.seed,
            vsync: self.vsync,
            show_fps: self.show_fps,
        }
    }

    fn resolve(&self) -> Result<SessionConfig> {
        let file = match &self.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        file.resolve(self.overrides())
    }
}

/// Entry point for the Torus Life command-line interface.
fn main() -> Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    let config = args.resolve()?;
    let seed = config.seed.unwrap_or_else(rand::random);
    info!(seed, "randomization seed");

    match &args.mode {
        Some(Mode::Headless {
            generations,
            randomize,
            output,
        }) => {
            let options = HeadlessOptions {
                generations: *generations,
                randomize: *randomize,
                output: output.as_deref(),
            };
            let report = headless::run(&config, seed, &options)?;
            info!(
                generation = report.generation.get(),
                population = report.population,
                frames = report.frames,
                "headless run finished"
            );
            Ok(())
        }
        None => run_windowed(&config, seed),
    }
}

fn run_windowed(config: &SessionConfig, seed: u64) -> Result<()> {
    let mut session = Session::new(config, seed);
    let scene = session.scene(config.cell_size)?;
    let presentation = Presentation::new("Torus Life", Color::WHITE, scene);

    let mut backend = MacroquadBackend::new().with_show_fps(config.show_fps);
    if let Some(vsync) = config.vsync {
        backend = backend.with_vsync(vsync);
    }

    backend.run(presentation, move |now, input, scene| {
        session.advance(now, input, scene);
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn flags_parse_into_overrides() {
        let args = CliArgs::try_parse_from([
            "torus-life",
            "--rows",
            "20",
            "--rate",
            "30",
            "--vsync",
            "--show-fps=false",
        ])
        .expect("valid arguments");

        let overrides = args.overrides();

        assert_eq!(overrides.rows, Some(20));
        assert_eq!(overrides.rate, Some(30.0));
        assert_eq!(overrides.vsync, Some(true));
        assert_eq!(overrides.show_fps, Some(false));
        assert!(args.mode.is_none());
    }

    #[test]
    fn headless_subcommand_parses() {
        let args = CliArgs::try_parse_from([
            "torus-life",
            "--seed",
            "9",
            "headless",
            "--generations",
            "100",
            "--randomize",
            "--output",
            "frame.ppm",
        ])
        .expect("valid arguments");

        let config = args.resolve().expect("valid configuration");
        assert_eq!(config.seed, Some(9));
        match args.mode {
            Some(Mode::Headless {
                generations,
                randomize,
                output,
            }) => {
                assert_eq!(generations, 100);
                assert!(randomize);
                assert_eq!(output, Some(PathBuf::from("frame.ppm")));
            }
            None => panic!("headless subcommand expected"),
        }
    }

    #[test]
    fn invalid_flags_fail_resolution() {
        let args = CliArgs::try_parse_from(["torus-life", "--alive-probability", "2"])
            .expect("parses as a number");

        assert!(args.resolve().is_err());
    }
}
