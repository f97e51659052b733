//! Built-in goal-selection policies.
//!
//! Policies that synthesize a goal from the agent's own position (identity,
//! mirror, offset) hand out ephemeral goals that belong to no set.  The rest
//! pick from the available goals of one goal set.

use std::sync::Arc;

use bfsm_agent::Agent;
use bfsm_core::{AgentRng, GoalId, GoalSetId, Shape, Vec2Generator};

use crate::{Goal, GoalSelector, SelectionContext};

// ── Position-derived ──────────────────────────────────────────────────────────

/// A single-point goal at the agent's current position.
#[derive(Debug, Default)]
pub struct IdentitySelector;

impl GoalSelector for IdentitySelector {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn get_goal(&self, agent: &Agent<'_>, _: &SelectionContext<'_>, _: &mut AgentRng) -> Option<Arc<Goal>> {
        Some(Arc::new(Goal::ephemeral(Shape::point(agent.pos()))))
    }
}

/// The agent's position reflected across the selected axes.
#[derive(Debug)]
pub struct MirrorSelector {
    pub mirror_x: bool,
    pub mirror_y: bool,
}

impl GoalSelector for MirrorSelector {
    fn name(&self) -> &'static str {
        "mirror"
    }

    fn get_goal(&self, agent: &Agent<'_>, _: &SelectionContext<'_>, _: &mut AgentRng) -> Option<Arc<Goal>> {
        let mut p = agent.pos();
        if self.mirror_x {
            p.x = -p.x;
        }
        if self.mirror_y {
            p.y = -p.y;
        }
        Some(Arc::new(Goal::ephemeral(Shape::point(p))))
    }
}

/// The agent's position plus a sampled offset.
#[derive(Debug)]
pub struct OffsetSelector {
    pub offset: Vec2Generator,
}

impl GoalSelector for OffsetSelector {
    fn name(&self) -> &'static str {
        "offset"
    }

    fn get_goal(&self, agent: &Agent<'_>, _: &SelectionContext<'_>, rng: &mut AgentRng) -> Option<Arc<Goal>> {
        let p = agent.pos() + self.offset.sample(rng);
        Some(Arc::new(Goal::ephemeral(Shape::point(p))))
    }
}

// ── Fixed ─────────────────────────────────────────────────────────────────────

/// Always the same goal of the same set.
#[derive(Debug)]
pub struct ExplicitSelector {
    pub goal_set: GoalSetId,
    pub goal:     GoalId,
}

impl GoalSelector for ExplicitSelector {
    fn name(&self) -> &'static str {
        "explicit"
    }

    fn get_goal(&self, _: &Agent<'_>, ctx: &SelectionContext<'_>, _: &mut AgentRng) -> Option<Arc<Goal>> {
        ctx.goal_sets.get(self.goal_set)?.get_goal_by_id_concurrent(self.goal)
    }

    fn goal_set(&self) -> Option<GoalSetId> {
        Some(self.goal_set)
    }
}

/// Placeholder for "use the selector of state `source`".
///
/// Replaced while the FSM is built; it has no behavior of its own.
#[derive(Debug)]
pub struct SharedSelector {
    pub source: String,
}

impl GoalSelector for SharedSelector {
    fn name(&self) -> &'static str {
        "shared"
    }

    fn get_goal(&self, _: &Agent<'_>, _: &SelectionContext<'_>, _: &mut AgentRng) -> Option<Arc<Goal>> {
        None
    }

    fn shared_source(&self) -> Option<&str> {
        Some(&self.source)
    }
}

// ── Distance-ranked ───────────────────────────────────────────────────────────

/// Scan the available goals of `set`, keeping the one `better` prefers.
/// Ties keep the goal scanned first.
fn best_by_distance(
    agent: &Agent<'_>,
    ctx: &SelectionContext<'_>,
    set: GoalSetId,
    better: impl Fn(f32, f32) -> bool,
) -> Option<Arc<Goal>> {
    let pos = agent.pos();
    let mut best: Option<(f32, Arc<Goal>)> = None;
    ctx.goal_sets.get(set)?.scan_available(|goal| {
        let d = goal.squared_distance(pos);
        if best.as_ref().is_none_or(|(bd, _)| better(d, *bd)) {
            best = Some((d, Arc::clone(goal)));
        }
    });
    best.map(|(_, g)| g)
}

#[derive(Debug)]
pub struct NearestSelector {
    pub goal_set: GoalSetId,
}

impl GoalSelector for NearestSelector {
    fn name(&self) -> &'static str {
        "nearest"
    }

    fn get_goal(&self, agent: &Agent<'_>, ctx: &SelectionContext<'_>, _: &mut AgentRng) -> Option<Arc<Goal>> {
        best_by_distance(agent, ctx, self.goal_set, |d, best| d < best)
    }

    fn goal_set(&self) -> Option<GoalSetId> {
        Some(self.goal_set)
    }
}

#[derive(Debug)]
pub struct FarthestSelector {
    pub goal_set: GoalSetId,
}

impl GoalSelector for FarthestSelector {
    fn name(&self) -> &'static str {
        "farthest"
    }

    fn get_goal(&self, agent: &Agent<'_>, ctx: &SelectionContext<'_>, _: &mut AgentRng) -> Option<Arc<Goal>> {
        best_by_distance(agent, ctx, self.goal_set, |d, best| d > best)
    }

    fn goal_set(&self) -> Option<GoalSetId> {
        Some(self.goal_set)
    }
}

/// The second-closest available goal; the closest when only one is available.
#[derive(Debug)]
pub struct SecondNearestSelector {
    pub goal_set: GoalSetId,
}

impl GoalSelector for SecondNearestSelector {
    fn name(&self) -> &'static str {
        "second_nearest"
    }

    fn get_goal(&self, agent: &Agent<'_>, ctx: &SelectionContext<'_>, _: &mut AgentRng) -> Option<Arc<Goal>> {
        let pos = agent.pos();
        let mut first: Option<(f32, Arc<Goal>)> = None;
        let mut second: Option<(f32, Arc<Goal>)> = None;
        ctx.goal_sets.get(self.goal_set)?.scan_available(|goal| {
            let d = goal.squared_distance(pos);
            match &first {
                Some((fd, _)) if d >= *fd => {
                    if second.as_ref().is_none_or(|(sd, _)| d < *sd) {
                        second = Some((d, Arc::clone(goal)));
                    }
                }
                _ => {
                    second = first.take();
                    first = Some((d, Arc::clone(goal)));
                }
            }
        });
        second.or(first).map(|(_, g)| g)
    }

    fn goal_set(&self) -> Option<GoalSetId> {
        Some(self.goal_set)
    }
}

// ── Random ────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct RandomSelector {
    pub goal_set: GoalSetId,
}

impl GoalSelector for RandomSelector {
    fn name(&self) -> &'static str {
        "random"
    }

    fn get_goal(&self, _: &Agent<'_>, ctx: &SelectionContext<'_>, rng: &mut AgentRng) -> Option<Arc<Goal>> {
        ctx.goal_sets.get(self.goal_set)?.random_goal(rng)
    }

    fn goal_set(&self) -> Option<GoalSetId> {
        Some(self.goal_set)
    }
}

#[derive(Debug)]
pub struct WeightedSelector {
    pub goal_set: GoalSetId,
}

impl GoalSelector for WeightedSelector {
    fn name(&self) -> &'static str {
        "weighted"
    }

    fn get_goal(&self, _: &Agent<'_>, ctx: &SelectionContext<'_>, rng: &mut AgentRng) -> Option<Arc<Goal>> {
        ctx.goal_sets.get(self.goal_set)?.random_weighted_goal(rng)
    }

    fn goal_set(&self) -> Option<GoalSetId> {
        Some(self.goal_set)
    }
}
