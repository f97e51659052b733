//! A transition binds one condition to one target.

use bfsm_agent::Agent;
use bfsm_core::{AgentRng, StateId};
use bfsm_goals::Goal;
use rustc_hash::FxHashMap;

use crate::{BuildResult, Condition, StepContext, Task, TransitionTarget};

pub struct Transition {
    pub condition: Box<dyn Condition>,
    pub target:    Box<dyn TransitionTarget>,
}

impl Transition {
    pub fn new(condition: Box<dyn Condition>, target: Box<dyn TransitionTarget>) -> Self {
        Self { condition, target }
    }

    pub fn on_enter(
        &self,
        agent: &Agent<'_>,
        ctx: &StepContext<'_>,
        rng: &mut AgentRng,
        origin: StateId,
    ) {
        self.condition.on_enter(agent, ctx, rng);
        self.target.on_enter(agent.id, origin);
    }

    pub fn on_leave(&self, agent: &Agent<'_>) {
        self.condition.on_leave(agent);
        self.target.on_leave(agent.id);
    }

    /// The state the agent should move to, or `None` if the condition is not
    /// met.
    pub fn test(
        &self,
        agent: &Agent<'_>,
        goal: &Goal,
        ctx: &StepContext<'_>,
        rng: &mut AgentRng,
    ) -> Option<StateId> {
        if !self.condition.condition_met(agent, goal, ctx) {
            return None;
        }
        self.target.next_state(agent, rng)
    }

    pub fn connect(&mut self, states: &FxHashMap<String, StateId>) -> BuildResult<()> {
        self.target.connect(states)
    }

    /// Independent copy for another source state.
    pub fn copy(&self) -> Transition {
        Transition { condition: self.condition.copy(), target: self.target.copy() }
    }

    pub fn tasks(&self) -> Vec<Box<dyn Task>> {
        self.condition.tasks()
    }
}
