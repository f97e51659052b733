//! Transition conditions: the trait, the tautology, and boolean combinators.
//!
//! Spatial and timing conditions live in [`spatial`](crate::spatial) and
//! [`timer`](crate::timer).

use bfsm_agent::Agent;
use bfsm_core::AgentRng;
use bfsm_goals::Goal;

use crate::{StepContext, Task};

/// A predicate deciding whether a transition fires.
///
/// `on_enter` / `on_leave` bracket an agent's stay in the state that owns
/// the transition, so a condition can cache per-agent data (a timer's
/// trigger time) for exactly that long.
///
/// # Thread safety
///
/// One instance serves every agent in its state and is called from the
/// parallel phase.  Per-agent caches must be behind a lock.
pub trait Condition: Send + Sync {
    fn on_enter(&self, _agent: &Agent<'_>, _ctx: &StepContext<'_>, _rng: &mut AgentRng) {}

    fn on_leave(&self, _agent: &Agent<'_>) {}

    fn condition_met(&self, agent: &Agent<'_>, goal: &Goal, ctx: &StepContext<'_>) -> bool;

    /// A deep copy with empty per-agent caches, used when one transition
    /// leaves several states.
    fn copy(&self) -> Box<dyn Condition>;

    fn tasks(&self) -> Vec<Box<dyn Task>> {
        Vec::new()
    }
}

// ── auto ──────────────────────────────────────────────────────────────────────

/// Always met.
#[derive(Debug, Default)]
pub struct AutoCondition;

impl Condition for AutoCondition {
    fn condition_met(&self, _: &Agent<'_>, _: &Goal, _: &StepContext<'_>) -> bool {
        true
    }

    fn copy(&self) -> Box<dyn Condition> {
        Box::new(AutoCondition)
    }
}

// ── and / or / not ────────────────────────────────────────────────────────────

pub struct AndCondition {
    pub left:  Box<dyn Condition>,
    pub right: Box<dyn Condition>,
}

impl Condition for AndCondition {
    fn on_enter(&self, agent: &Agent<'_>, ctx: &StepContext<'_>, rng: &mut AgentRng) {
        self.left.on_enter(agent, ctx, rng);
        self.right.on_enter(agent, ctx, rng);
    }

    fn on_leave(&self, agent: &Agent<'_>) {
        self.left.on_leave(agent);
        self.right.on_leave(agent);
    }

    fn condition_met(&self, agent: &Agent<'_>, goal: &Goal, ctx: &StepContext<'_>) -> bool {
        self.left.condition_met(agent, goal, ctx) && self.right.condition_met(agent, goal, ctx)
    }

    fn copy(&self) -> Box<dyn Condition> {
        Box::new(AndCondition { left: self.left.copy(), right: self.right.copy() })
    }

    fn tasks(&self) -> Vec<Box<dyn Task>> {
        let mut tasks = self.left.tasks();
        tasks.extend(self.right.tasks());
        tasks
    }
}

pub struct OrCondition {
    pub left:  Box<dyn Condition>,
    pub right: Box<dyn Condition>,
}

impl Condition for OrCondition {
    fn on_enter(&self, agent: &Agent<'_>, ctx: &StepContext<'_>, rng: &mut AgentRng) {
        self.left.on_enter(agent, ctx, rng);
        self.right.on_enter(agent, ctx, rng);
    }

    fn on_leave(&self, agent: &Agent<'_>) {
        self.left.on_leave(agent);
        self.right.on_leave(agent);
    }

    fn condition_met(&self, agent: &Agent<'_>, goal: &Goal, ctx: &StepContext<'_>) -> bool {
        self.left.condition_met(agent, goal, ctx) || self.right.condition_met(agent, goal, ctx)
    }

    fn copy(&self) -> Box<dyn Condition> {
        Box::new(OrCondition { left: self.left.copy(), right: self.right.copy() })
    }

    fn tasks(&self) -> Vec<Box<dyn Task>> {
        let mut tasks = self.left.tasks();
        tasks.extend(self.right.tasks());
        tasks
    }
}

pub struct NotCondition {
    pub inner: Box<dyn Condition>,
}

impl Condition for NotCondition {
    fn on_enter(&self, agent: &Agent<'_>, ctx: &StepContext<'_>, rng: &mut AgentRng) {
        self.inner.on_enter(agent, ctx, rng);
    }

    fn on_leave(&self, agent: &Agent<'_>) {
        self.inner.on_leave(agent);
    }

    fn condition_met(&self, agent: &Agent<'_>, goal: &Goal, ctx: &StepContext<'_>) -> bool {
        !self.inner.condition_met(agent, goal, ctx)
    }

    fn copy(&self) -> Box<dyn Condition> {
        Box::new(NotCondition { inner: self.inner.copy() })
    }

    fn tasks(&self) -> Vec<Box<dyn Task>> {
        self.inner.tasks()
    }
}
