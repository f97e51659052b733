//! Elapsed-time condition.

use std::sync::{Mutex, OnceLock};

use bfsm_agent::Agent;
use bfsm_core::{AgentId, AgentRng, FloatGenerator, sync};
use bfsm_goals::Goal;
use rustc_hash::FxHashMap;

use crate::{Condition, StepContext};

/// Met once an agent has spent `duration` seconds in the state.
///
/// With `per_agent` every entry samples its own duration.  Otherwise one
/// duration is sampled the first time any agent enters and shared by all.
pub struct TimerCondition {
    duration:  FloatGenerator,
    per_agent: bool,
    shared:    OnceLock<f32>,
    triggers:  Mutex<FxHashMap<AgentId, f32>>,
}

impl TimerCondition {
    pub fn new(duration: FloatGenerator, per_agent: bool) -> Self {
        Self {
            duration,
            per_agent,
            shared: OnceLock::new(),
            triggers: Mutex::new(FxHashMap::default()),
        }
    }

    /// Time at which the condition becomes true for `agent`, if it is in the state.
    pub fn trigger_time(&self, agent: AgentId) -> Option<f32> {
        sync::lock(&self.triggers).get(&agent).copied()
    }
}

impl Condition for TimerCondition {
    fn on_enter(&self, agent: &Agent<'_>, ctx: &StepContext<'_>, rng: &mut AgentRng) {
        let duration = if self.per_agent {
            self.duration.sample(rng)
        } else {
            *self.shared.get_or_init(|| self.duration.sample(rng))
        };
        sync::lock(&self.triggers).insert(agent.id, ctx.time + duration);
    }

    fn on_leave(&self, agent: &Agent<'_>) {
        sync::lock(&self.triggers).remove(&agent.id);
    }

    fn condition_met(&self, agent: &Agent<'_>, _: &Goal, ctx: &StepContext<'_>) -> bool {
        self.trigger_time(agent.id).is_some_and(|t| ctx.time >= t)
    }

    fn copy(&self) -> Box<dyn Condition> {
        Box::new(TimerCondition::new(self.duration, self.per_agent))
    }
}
