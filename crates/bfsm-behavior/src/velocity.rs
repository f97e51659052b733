//! The preferred-velocity pipeline: one component per state computes a
//! preferred velocity, then modifiers adjust it in order.
//!
//! Components and modifiers are normally supplied by the motion-model side
//! of an application; the simple ones here are enough to drive agents
//! toward their goals.

use bfsm_agent::{Agent, PrefVelocity};
use bfsm_core::AgentId;
use bfsm_goals::Goal;
use glam::Vec2;

use crate::{StepContext, Task};

// ── VelComponent ──────────────────────────────────────────────────────────────

pub trait VelComponent: Send + Sync {
    fn on_enter(&self, _agent: &Agent<'_>) {}

    fn on_leave(&self, _agent: &Agent<'_>) {}

    /// Write the agent's preferred velocity given its assigned goal.
    fn set_pref_velocity(
        &self,
        agent: &Agent<'_>,
        goal: &Goal,
        ctx: &StepContext<'_>,
        pref: &mut PrefVelocity,
    );

    fn tasks(&self) -> Vec<Box<dyn Task>> {
        Vec::new()
    }
}

/// Stand still.
#[derive(Debug, Default)]
pub struct ZeroVelComponent;

impl VelComponent for ZeroVelComponent {
    fn set_pref_velocity(&self, agent: &Agent<'_>, _: &Goal, _: &StepContext<'_>, pref: &mut PrefVelocity) {
        pref.set_idle(agent.pos());
    }
}

/// A fixed velocity, independent of the goal.
#[derive(Debug)]
pub struct ConstVelComponent {
    pub vel: Vec2,
}

impl VelComponent for ConstVelComponent {
    fn set_pref_velocity(&self, agent: &Agent<'_>, _: &Goal, ctx: &StepContext<'_>, pref: &mut PrefVelocity) {
        let speed = self.vel.length();
        if speed <= f32::EPSILON {
            pref.set_idle(agent.pos());
            return;
        }
        pref.set_single(self.vel);
        pref.speed = speed;
        pref.target = agent.pos() + self.vel * ctx.time_step;
    }
}

/// A fixed direction at the agent's preferred speed.
#[derive(Debug)]
pub struct ConstDirVelComponent {
    pub dir: Vec2,
}

impl VelComponent for ConstDirVelComponent {
    fn set_pref_velocity(&self, agent: &Agent<'_>, _: &Goal, ctx: &StepContext<'_>, pref: &mut PrefVelocity) {
        let dir = self.dir.normalize_or_zero();
        if dir == Vec2::ZERO {
            pref.set_idle(agent.pos());
            return;
        }
        pref.set_single(dir);
        pref.speed = agent.props.pref_speed;
        pref.target = agent.pos() + dir * agent.props.pref_speed * ctx.time_step;
    }
}

/// Straight toward the nearest point of the goal, slowing down so the agent
/// does not overshoot within one step.
#[derive(Debug, Default)]
pub struct GoalVelComponent;

impl VelComponent for GoalVelComponent {
    fn set_pref_velocity(&self, agent: &Agent<'_>, goal: &Goal, ctx: &StepContext<'_>, pref: &mut PrefVelocity) {
        let pos = agent.pos();
        let target = goal.nearest_point(pos);
        let delta = target - pos;
        let dist = delta.length();
        if dist <= 1e-5 {
            pref.set_idle(pos);
            return;
        }
        pref.set_single(delta);
        let arrive = if ctx.time_step > 0.0 { dist / ctx.time_step } else { f32::INFINITY };
        pref.speed = agent.props.pref_speed.min(arrive);
        pref.target = target;
    }
}

// ── VelModifier ───────────────────────────────────────────────────────────────

/// One stage of the modifier pipeline.  Order matters: each stage sees the
/// output of the previous one.
pub trait VelModifier: Send + Sync {
    fn adapt_pref_velocity(&self, agent: &Agent<'_>, pref: &mut PrefVelocity);

    fn register_agent(&self, _agent: AgentId) {}

    fn unregister_agent(&self, _agent: AgentId) {}

    fn tasks(&self) -> Vec<Box<dyn Task>> {
        Vec::new()
    }
}

/// Multiply the preferred speed.
#[derive(Debug)]
pub struct ScaleVelModifier {
    pub factor: f32,
}

impl VelModifier for ScaleVelModifier {
    fn adapt_pref_velocity(&self, _: &Agent<'_>, pref: &mut PrefVelocity) {
        pref.speed *= self.factor;
    }
}
