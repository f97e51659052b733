//! Simulation time model.
//!
//! Time is continuous: the clock holds the global time in seconds and the
//! fixed step length.  Every element that needs "now" (timer conditions,
//! time triggers) reads it from the clock snapshot handed to it for the
//! current step, never from a global.

use std::fmt;

// ── SimClock ──────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// Global time, in seconds, at the start of the current step.
    pub time:      f32,
    /// Seconds advanced per step.
    pub time_step: f32,
    /// Number of completed steps.
    pub steps:     u64,
    /// Exact time at `origin_step`.  Regular steps are counted from here,
    /// and every step of a different length moves the origin forward.
    #[cfg_attr(feature = "serde", serde(default))]
    origin_time: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    origin_step: u64,
}

impl SimClock {
    pub fn new(time_step: f32) -> Self {
        Self { time: 0.0, time_step, steps: 0, origin_time: 0.0, origin_step: 0 }
    }

    /// Time at the start of the current step, without `f32` rounding.
    #[inline]
    fn exact_time(&self) -> f64 {
        self.origin_time + (self.steps - self.origin_step) as f64 * self.time_step as f64
    }

    /// Advance by one step of `time_step`.
    ///
    /// Time is recomputed from the steps taken since the origin rather than
    /// accumulated, so it does not drift over long runs.
    #[inline]
    pub fn advance(&mut self) {
        self.steps += 1;
        self.time = self.exact_time() as f32;
    }

    /// Advance by an arbitrary `dt`.  A `dt` other than `time_step` moves the
    /// origin to the new time, so later regular steps continue from it.
    #[inline]
    pub fn advance_by(&mut self, dt: f32) {
        if dt == self.time_step {
            self.advance();
            return;
        }
        let now = self.exact_time() + dt as f64;
        self.steps += 1;
        self.origin_time = now;
        self.origin_step = self.steps;
        self.time = now as f32;
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} (t = {:.3}s)", self.steps, self.time)
    }
}

// ── RunConfig ─────────────────────────────────────────────────────────────────

/// Top-level run configuration.
///
/// Typically loaded from a TOML file by the application and handed to the
/// integrator builder.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RunConfig {
    /// Seconds per step.  Default: 0.1.
    pub time_step: f32,

    /// Extra motion sub-steps the simulator takes inside each step.
    pub sub_steps: u32,

    /// The run ends once global time reaches this value.  `None` runs until
    /// every agent is in a final state.
    pub max_duration: Option<f32>,

    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,

    /// Worker thread count passed to Rayon.  `None` uses all logical cores.
    pub num_threads: Option<usize>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            time_step:    0.1,
            sub_steps:    0,
            max_duration: None,
            seed:         0,
            num_threads:  None,
        }
    }
}

impl RunConfig {
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.time_step)
    }

    /// Reject non-positive step lengths and durations.
    pub fn validate(&self) -> crate::CoreResult<()> {
        if !(self.time_step > 0.0) {
            return Err(crate::CoreError::Config(format!(
                "time_step must be positive, got {}",
                self.time_step
            )));
        }
        if let Some(d) = self.max_duration {
            if !(d > 0.0) {
                return Err(crate::CoreError::Config(format!(
                    "max_duration must be positive, got {d}"
                )));
            }
        }
        Ok(())
    }
}
