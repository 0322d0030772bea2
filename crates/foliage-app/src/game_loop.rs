//! Fixed-timestep loop: camera simulation at a fixed rate, frame evaluation
//! once per rendered frame with an interpolation alpha.

use std::time::Instant;
use tracing::warn;

/// Fixed simulation timestep: 60 Hz.
pub const FIXED_DT: f64 = 1.0 / 60.0;

/// Frame time clamp. Longer frames are shortened to this and the simulation
/// falls behind instead of running dozens of catch-up steps.
pub const MAX_FRAME_TIME: f64 = 0.25;

/// Accumulator state of the fixed-timestep loop.
///
/// [`tick`](Self::tick) measures wall-clock time for the `--realtime` driver;
/// [`advance`](Self::advance) takes the frame time explicitly, which is what
/// the default headless run and the tests use.
#[derive(Debug, Clone)]
pub struct GameLoop {
    previous_time: Instant,
    accumulator: f64,
    total_sim_time: f64,
    frame_count: u64,
    update_count: u64,
}

impl GameLoop {
    /// Creates a new `GameLoop` starting from the current instant.
    pub fn new() -> Self {
        Self {
            previous_time: Instant::now(),
            accumulator: 0.0,
            total_sim_time: 0.0,
            frame_count: 0,
            update_count: 0,
        }
    }

    /// Runs one frame using the wall-clock time since the previous tick.
    pub fn tick(&mut self, update_fn: impl FnMut(f64, f64), render_fn: impl FnMut(f64)) {
        let current_time = Instant::now();
        let frame_time = current_time
            .duration_since(self.previous_time)
            .as_secs_f64();
        self.previous_time = current_time;
        self.advance(frame_time, update_fn, render_fn);
    }

    /// Runs one frame of `frame_time` seconds.
    ///
    /// - `update_fn(fixed_dt, total_sim_time)` is called zero or more times at
    ///   the fixed rate.
    /// - `render_fn(alpha)` is called exactly once with the interpolation alpha
    ///   in `[0.0, 1.0)`.
    pub fn advance(
        &mut self,
        frame_time: f64,
        mut update_fn: impl FnMut(f64, f64),
        mut render_fn: impl FnMut(f64),
    ) {
        let mut frame_time = frame_time.max(0.0);
        if frame_time > MAX_FRAME_TIME {
            warn!(
                "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
                frame_time * 1000.0,
                MAX_FRAME_TIME * 1000.0
            );
            frame_time = MAX_FRAME_TIME;
        }

        self.accumulator += frame_time;

        while self.accumulator >= FIXED_DT {
            update_fn(FIXED_DT, self.total_sim_time);
            self.total_sim_time += FIXED_DT;
            self.accumulator -= FIXED_DT;
            self.update_count += 1;
        }

        render_fn(self.alpha());
        self.frame_count += 1;
    }

    /// Returns the current interpolation alpha without running a frame.
    pub fn alpha(&self) -> f64 {
        if self.accumulator > 0.0 {
            self.accumulator / FIXED_DT
        } else {
            0.0
        }
    }

    /// Returns the total number of frames rendered.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Returns the total number of simulation update steps executed.
    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    /// Returns the total simulation time in seconds.
    pub fn total_sim_time(&self) -> f64 {
        self.total_sim_time
    }
}

impl Default for GameLoop {
    fn default() -> Self {
        Self::new()
    }
}
