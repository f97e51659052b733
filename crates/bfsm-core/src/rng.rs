//! Deterministic per-agent and simulation-level RNG wrappers.
//!
//! # Determinism strategy
//!
//! Each agent gets its own independent `SmallRng` seeded by:
//!
//!   seed = global_seed XOR (agent_id * MIXING_CONSTANT)
//!
//! The mixing constant is the 64-bit fractional part of the golden ratio,
//! which spreads consecutive agent ids uniformly across the seed space.
//! Every random decision taken while an agent advances (probabilistic
//! targets, random goal selection, sampled timer durations) draws from that
//! agent's own stream, so the outcome of a step does not depend on how the
//! parallel phase was scheduled across threads.
//!
//! Single-threaded phases (event evaluation, tasks, build) draw from `SimRng`.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::AgentId;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Common sampling surface used by value generators and selectors, so they
/// accept either an agent's stream or the global one.
pub trait SampleRng {
    fn inner(&mut self) -> &mut SmallRng;

    /// Uniform sample in `[0, 1)`.
    #[inline]
    fn unit(&mut self) -> f32 {
        self.inner().r#gen::<f32>()
    }

    /// Uniform sample in `[lo, hi)`; returns `lo` for an empty interval.
    #[inline]
    fn uniform(&mut self, lo: f32, hi: f32) -> f32 {
        if hi > lo { self.inner().gen_range(lo..hi) } else { lo }
    }

    /// Uniform index in `0..len`; `None` when `len == 0`.
    #[inline]
    fn index(&mut self, len: usize) -> Option<usize> {
        (len > 0).then(|| self.inner().gen_range(0..len))
    }
}

// ── AgentRng ──────────────────────────────────────────────────────────────────

/// Per-agent deterministic RNG.
///
/// One per agent, stored in a `Vec<AgentRng>` indexed by `AgentId` next to the
/// other per-agent arrays.  Each parallel iteration borrows only its own slot.
pub struct AgentRng(SmallRng);

impl AgentRng {
    /// Seed deterministically from the run's global seed and an agent id.
    pub fn new(global_seed: u64, agent: AgentId) -> Self {
        let seed = global_seed ^ (agent.0 as u64).wrapping_mul(MIXING_CONSTANT);
        AgentRng(SmallRng::seed_from_u64(seed))
    }

    #[inline]
    pub fn random<T>(&mut self) -> T
    where
        rand::distributions::Standard: rand::distributions::Distribution<T>,
    {
        self.0.r#gen()
    }

    /// `true` with probability `p` (clamped to [0, 1]).
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }

    /// Choose a random element from a slice; `None` if it is empty.
    #[inline]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.0)
    }
}

impl SampleRng for AgentRng {
    #[inline]
    fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }
}

// ── SimRng ────────────────────────────────────────────────────────────────────

/// Simulation-level RNG for the single-threaded phases.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Derive a child `SimRng` with a different seed offset.
    pub fn child(&mut self, offset: u64) -> SimRng {
        let child_seed: u64 = self.0.r#gen::<u64>() ^ offset.wrapping_mul(MIXING_CONSTANT);
        SimRng(SmallRng::seed_from_u64(child_seed))
    }

    #[inline]
    pub fn random<T>(&mut self) -> T
    where
        rand::distributions::Standard: rand::distributions::Distribution<T>,
    {
        self.0.r#gen()
    }
}

impl SampleRng for SimRng {
    #[inline]
    fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }
}
