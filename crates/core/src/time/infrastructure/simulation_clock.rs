use std::time::Instant;

use crate::time::domain::clock::Clock;

#[derive(Debug, Clone, Copy)]
enum Mode {
    Realtime {
        last_tick: Instant,
    },
    /// Time is `base + steps / fps`, derived from an integer step count so
    /// long sequences do not accumulate floating-point drift.
    FixedTimestep {
        fps: f64,
        base: f64,
        steps: u64,
    },
}

/// Animation clock with a realtime mode and a fixed-timestep mode.
#[derive(Debug, Clone)]
pub struct SimulationClock {
    mode: Mode,
    time: f64,
    delta: f64,
}

impl SimulationClock {
    /// A realtime clock starting at zero.
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(now: Instant) -> Self {
        Self {
            mode: Mode::Realtime { last_tick: now },
            time: 0.0,
            delta: 0.0,
        }
    }

    /// Frame rate of the fixed timestep, if one is active.
    pub fn fixed_fps(&self) -> Option<f64> {
        match self.mode {
            Mode::FixedTimestep { fps, .. } => Some(fps),
            Mode::Realtime { .. } => None,
        }
    }

    /// `update` with an explicit wall-clock instant.
    pub fn update_at(&mut self, now: Instant) {
        match &mut self.mode {
            Mode::Realtime { last_tick } => {
                self.delta = now.saturating_duration_since(*last_tick).as_secs_f64();
                self.time += self.delta;
                *last_tick = now;
            }
            Mode::FixedTimestep { fps, base, steps } => {
                *steps += 1;
                let next = *base + *steps as f64 / *fps;
                self.delta = next - self.time;
                self.time = next;
            }
        }
    }

    /// `set_realtime` with an explicit wall-clock instant.
    pub fn set_realtime_at(&mut self, now: Instant) {
        self.mode = Mode::Realtime { last_tick: now };
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SimulationClock {
    fn time(&self) -> f64 {
        self.time
    }

    fn delta_time(&self) -> f64 {
        self.delta
    }

    fn set_time(&mut self, time: f64) {
        self.time = time;
        if let Mode::FixedTimestep { base, steps, .. } = &mut self.mode {
            *base = time;
            *steps = 0;
        }
    }

    fn set_fixed_timestep(&mut self, fps: f64) {
        debug_assert!(fps > 0.0, "fixed timestep needs a positive frame rate");
        self.mode = Mode::FixedTimestep {
            fps,
            base: self.time,
            steps: 0,
        };
    }

    fn set_realtime(&mut self) {
        self.set_realtime_at(Instant::now());
    }

    fn is_fixed_timestep(&self) -> bool {
        matches!(self.mode, Mode::FixedTimestep { .. })
    }

    fn update(&mut self) {
        self.update_at(Instant::now());
    }
}
