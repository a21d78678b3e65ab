#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fixed-timestep clock that paces generations independently of the host's
//! refresh rate.
//!
//! The host calls [`SimulationClock::on_tick`] from whatever frame callback it
//! has, as often as it likes. While running, the clock emits at most one
//! [`Command::Step`] per call once a full tick period has elapsed, and carries
//! the leftover fraction of a period into the next evaluation so the long-run
//! rate does not drift with the sampling frequency.

use std::time::Duration;

use torus_life_core::{Command, Event, PlaybackState, TickRate};
use tracing::debug;

/// Pure system that converts host timestamps into step commands.
#[derive(Clone, Debug)]
pub struct SimulationClock {
    state: PlaybackState,
    rate: TickRate,
    last_tick: Duration,
}

impl SimulationClock {
    /// Creates a stopped clock paced at the provided rate.
    #[must_use]
    pub fn new(rate: TickRate) -> Self {
        Self {
            state: PlaybackState::Stopped,
            rate,
            last_tick: Duration::ZERO,
        }
    }

    /// Starts automatic playback, measuring the first tick from `now`.
    ///
    /// Has no effect while already running, so repeated start requests never
    /// reset the carried remainder.
    pub fn start(&mut self, now: Duration) {
        if self.state == PlaybackState::Running {
            return;
        }

        self.state = PlaybackState::Running;
        self.last_tick = now;
        debug!(rate = self.rate.get(), "playback started");
    }

    /// Stops automatic playback. Subsequent ticks never advance the grid.
    pub fn stop(&mut self) {
        if self.state == PlaybackState::Stopped {
            return;
        }

        self.state = PlaybackState::Stopped;
        debug!("playback stopped");
    }

    /// Evaluates the clock at host timestamp `now`.
    ///
    /// Emits a single [`Command::Step`] into `out` and returns `true` when the
    /// clock is running and at least one period elapsed since the last tick.
    /// Only one step is emitted per call even if several periods elapsed.
    pub fn on_tick(&mut self, now: Duration, out: &mut Vec<Command>) -> bool {
        if self.state == PlaybackState::Stopped {
            return false;
        }

        let period = self.rate.period();
        let elapsed = now.saturating_sub(self.last_tick);
        if elapsed < period {
            return false;
        }

        self.last_tick = now.saturating_sub(remainder(elapsed, period));
        out.push(Command::Step);
        true
    }

    /// Changes the playback rate; the next [`SimulationClock::on_tick`] uses it.
    pub fn set_rate(&mut self, rate: TickRate) {
        if self.rate == rate {
            return;
        }

        self.rate = rate;
        debug!(rate = rate.get(), "playback rate changed");
    }

    /// Stops playback and emits exactly one [`Command::Step`] for frame-by-frame inspection.
    pub fn step(&mut self, out: &mut Vec<Command>) {
        self.stop();
        out.push(Command::Step);
    }

    /// Reacts to engine events; clearing or randomizing the grid stops playback.
    pub fn handle(&mut self, events: &[Event]) {
        let reset = events
            .iter()
            .any(|event| matches!(event, Event::Cleared | Event::Randomized { .. }));
        if reset {
            self.stop();
        }
    }

    /// Current playback state.
    #[must_use]
    pub const fn state(&self) -> PlaybackState {
        self.state
    }

    /// Reports whether automatic playback is active.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == PlaybackState::Running
    }

    /// Current playback rate.
    #[must_use]
    pub const fn rate(&self) -> TickRate {
        self.rate
    }

    /// Earliest timestamp at which [`SimulationClock::on_tick`] steps.
    ///
    /// Returns `None` while stopped or when that timestamp lies beyond
    /// [`Duration::MAX`].
    #[must_use]
    pub fn next_tick(&self) -> Option<Duration> {
        if self.state == PlaybackState::Stopped {
            return None;
        }
        self.last_tick.checked_add(self.rate.period())
    }

    /// Duration of a single tick at the current rate.
    #[must_use]
    pub fn period(&self) -> Duration {
        self.rate.period()
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(TickRate::DEFAULT)
    }
}

fn remainder(elapsed: Duration, period: Duration) -> Duration {
    let period_nanos = period.as_nanos().max(1);
    let remainder_nanos = elapsed.as_nanos() % period_nanos;
    Duration::from_nanos(u64::try_from(remainder_nanos).unwrap_or(u64::MAX))
}
