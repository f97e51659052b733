//! Conditions on where an agent is.

use bfsm_agent::Agent;
use bfsm_core::{AgentId, GoalSetId, Shape};
use bfsm_goals::Goal;

use crate::{Condition, StepContext};

// ── Static region ─────────────────────────────────────────────────────────────

/// Met while the agent is inside `shape` (or outside, with `inside = false`).
#[derive(Debug, Clone)]
pub struct ShapeCondition {
    pub shape:  Shape,
    pub inside: bool,
}

impl Condition for ShapeCondition {
    fn condition_met(&self, agent: &Agent<'_>, _: &Goal, _: &StepContext<'_>) -> bool {
        self.shape.contains(agent.pos()) == self.inside
    }

    fn copy(&self) -> Box<dyn Condition> {
        Box::new(self.clone())
    }
}

// ── Goal reached ──────────────────────────────────────────────────────────────

/// Met when the agent is closer than `distance` to its assigned goal.
#[derive(Debug, Clone)]
pub struct GoalReachedCondition {
    pub distance: f32,
}

impl Condition for GoalReachedCondition {
    fn condition_met(&self, agent: &Agent<'_>, goal: &Goal, _: &StepContext<'_>) -> bool {
        goal.squared_distance(agent.pos()) < self.distance * self.distance
    }

    fn copy(&self) -> Box<dyn Condition> {
        Box::new(self.clone())
    }
}

// ── Proximity ─────────────────────────────────────────────────────────────────

/// What a [`ProximityCondition`] measures distance to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProximitySubject {
    /// Any other agent of this class.
    Class(u32),
    /// One specific agent (a leader to follow).
    Agent(AgentId),
    /// Any goal of this set, treated as a waypoint.
    GoalSet(GoalSetId),
}

/// Met when the subject is within `distance` of the agent (or beyond it,
/// with `inside = false`).
#[derive(Debug, Clone)]
pub struct ProximityCondition {
    pub subject:  ProximitySubject,
    pub distance: f32,
    pub inside:   bool,
}

impl ProximityCondition {
    fn subject_within(&self, agent: &Agent<'_>, ctx: &StepContext<'_>) -> bool {
        let pos = agent.pos();
        let limit = self.distance * self.distance;
        match self.subject {
            ProximitySubject::Class(class) => ctx.bodies.iter().enumerate().any(|(i, b)| {
                i != agent.id.index() && b.class == class && b.pos.distance_squared(pos) <= limit
            }),
            ProximitySubject::Agent(other) => ctx
                .bodies
                .get(other.index())
                .is_some_and(|b| other != agent.id && b.pos.distance_squared(pos) <= limit),
            ProximitySubject::GoalSet(set) => {
                let Some(goals) = ctx.goal_sets.get(set) else {
                    return false;
                };
                (0..goals.size())
                    .filter_map(|i| goals.get_ith_goal(i))
                    .any(|g| g.squared_distance(pos) <= limit)
            }
        }
    }
}

impl Condition for ProximityCondition {
    fn condition_met(&self, agent: &Agent<'_>, _: &Goal, ctx: &StepContext<'_>) -> bool {
        self.subject_within(agent, ctx) == self.inside
    }

    fn copy(&self) -> Box<dyn Condition> {
        Box::new(self.clone())
    }
}
