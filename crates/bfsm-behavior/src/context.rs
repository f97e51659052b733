//! Read-only per-step state passed to every behavior element.

use bfsm_agent::AgentBody;
use bfsm_core::SimClock;
use bfsm_goals::{GoalSets, SelectionContext};

/// A read-only snapshot of the simulation built once per step by the FSM and
/// shared (immutably) by every agent evaluated in that step.
///
/// This is the only way elements learn the time or look at other agents;
/// nothing reaches for a global.
#[derive(Copy, Clone)]
pub struct StepContext<'a> {
    /// Global time at the start of the step, in seconds.
    pub time: f32,

    /// Length of the step, in seconds.
    pub time_step: f32,

    /// Every agent's kinematic state, indexed by `AgentId`.
    pub bodies: &'a [AgentBody],

    pub goal_sets: &'a GoalSets,
}

impl<'a> StepContext<'a> {
    #[inline]
    pub fn new(clock: &SimClock, bodies: &'a [AgentBody], goal_sets: &'a GoalSets) -> Self {
        Self { time: clock.time, time_step: clock.time_step, bodies, goal_sets }
    }

    #[inline]
    pub fn selection(&self) -> SelectionContext<'a> {
        SelectionContext { goal_sets: self.goal_sets }
    }
}
