//! Factories for the built-in element types.
//!
//! | Category            | Type names                                                        |
//! |---------------------|-------------------------------------------------------------------|
//! | condition           | `auto` `timer` `circle` `aabb` `obb` `goal_reached` `and` `or` `not` `proximity` `follow` `via` |
//! | transition target   | `single` `prob` `return`                                          |
//! | action              | `set_property` `offset_property` `scale_property`                 |
//! | goal selector       | `explicit` `identity` `mirror` `offset` `nearest` `farthest` `second_nearest` `random` `weighted` `nearest_nav_mesh` `shared` |
//! | velocity component  | `zero` `const` `const_dir` `goal`                                  |
//! | velocity modifier   | `scale`                                                           |
//! | event trigger       | `state_population` `time`                                         |
//! | event target        | `state_member` `all_agents`                                       |
//! | event effect        | `change_state` `set_agent_property` `offset_agent_property` `scale_agent_property` |
//! | task                | `nav_mesh_localizer`                                              |

use bfsm_agent::AgentProperty;
use bfsm_core::{AgentId, GoalId, GoalSetId};
use bfsm_goals::{
    ExplicitSelector, FarthestSelector, IdentitySelector, MirrorSelector, NearestNavMeshSelector,
    NearestSelector, OffsetSelector, RandomSelector, SecondNearestSelector, SharedSelector,
    WeightedSelector,
};

use crate::registry::{ElementSpec, FactoryContext, Registry};
use crate::{
    AgentPropertyManipulator, AllAgentsTarget, AndCondition, AutoCondition, BuildResult,
    ChangeStateEffect, ConstDirVelComponent, ConstVelComponent, GoalReachedCondition,
    GoalVelComponent, NavMeshLocalizerTask, NotCondition, OrCondition, PopulationMode,
    ProbTarget, PropertyAction, PropertyEffect, PropertyOp, ProximityCondition, ProximitySubject,
    ReturnTarget, ScaleVelModifier, ShapeCondition, SingleTarget, StateMemberTarget,
    StatePopulationTrigger, TimeTrigger, TimerCondition, ZeroVelComponent,
};

pub(crate) fn register_all(registry: &mut Registry) {
    register_conditions(registry);
    register_targets(registry);
    register_actions(registry);
    register_selectors(registry);
    register_velocity(registry);
    register_events(registry);
    register_tasks(registry);
}

fn property(spec: &ElementSpec) -> BuildResult<AgentProperty> {
    let name = spec.str("property")?;
    name.parse().map_err(|e: bfsm_agent::AgentError| spec.param_error("property", e.to_string()))
}

fn manipulator(spec: &ElementSpec, op: PropertyOp) -> BuildResult<AgentPropertyManipulator> {
    Ok(AgentPropertyManipulator::new(property(spec)?, op, spec.float_gen("value")?))
}

fn goal_set(spec: &ElementSpec) -> BuildResult<GoalSetId> {
    Ok(GoalSetId(spec.u32("goal_set")?))
}

// ── Conditions ────────────────────────────────────────────────────────────────

fn register_conditions(r: &mut Registry) {
    let c = &mut r.conditions;
    c.register("auto", |_, _| Ok(Box::new(AutoCondition)));
    c.register("timer", |spec, _| {
        Ok(Box::new(TimerCondition::new(spec.float_gen("dur")?, spec.bool_or("per_agent", true)?)))
    });
    for shape in ["circle", "aabb", "obb"] {
        c.register(shape, |spec, _| {
            Ok(Box::new(ShapeCondition { shape: spec.shape()?, inside: spec.bool_or("inside", true)? }))
        });
    }
    c.register("goal_reached", |spec, _| {
        Ok(Box::new(GoalReachedCondition { distance: spec.f32("distance")? }))
    });
    c.register("and", |spec, ctx: &FactoryContext<'_>| {
        let left = ctx.registry.conditions.create(&spec.nested("left")?, ctx)?;
        let right = ctx.registry.conditions.create(&spec.nested("right")?, ctx)?;
        Ok(Box::new(AndCondition { left, right }))
    });
    c.register("or", |spec, ctx: &FactoryContext<'_>| {
        let left = ctx.registry.conditions.create(&spec.nested("left")?, ctx)?;
        let right = ctx.registry.conditions.create(&spec.nested("right")?, ctx)?;
        Ok(Box::new(OrCondition { left, right }))
    });
    c.register("not", |spec, ctx: &FactoryContext<'_>| {
        let inner = ctx.registry.conditions.create(&spec.nested("condition")?, ctx)?;
        Ok(Box::new(NotCondition { inner }))
    });
    c.register("proximity", |spec, _| {
        proximity(spec, ProximitySubject::Class(spec.u32("class")?))
    });
    c.register("follow", |spec, _| {
        proximity(spec, ProximitySubject::Agent(AgentId(spec.u32("agent")?)))
    });
    c.register("via", |spec, _| proximity(spec, ProximitySubject::GoalSet(goal_set(spec)?)));
}

fn proximity(spec: &ElementSpec, subject: ProximitySubject) -> BuildResult<Box<dyn crate::Condition>> {
    Ok(Box::new(ProximityCondition {
        subject,
        distance: spec.f32("distance")?,
        inside: spec.bool_or("inside", true)?,
    }))
}

// ── Transition targets ────────────────────────────────────────────────────────

fn register_targets(r: &mut Registry) {
    let t = &mut r.targets;
    t.register("single", |spec, _| Ok(Box::new(SingleTarget::new(spec.str("state")?))));
    t.register("prob", |spec, _| {
        let mut targets = Vec::new();
        for entry in spec.tables("targets")? {
            let state = entry
                .get("state")
                .and_then(toml::Value::as_str)
                .ok_or_else(|| spec.param_error("targets", "every entry needs a \"state\" name"))?;
            let weight = match entry.get("weight") {
                None => 1.0,
                Some(toml::Value::Float(w)) => *w as f32,
                Some(toml::Value::Integer(w)) => *w as f32,
                Some(_) => return Err(spec.param_error("targets", "weights must be numbers")),
            };
            targets.push((state.to_owned(), weight));
        }
        if targets.is_empty() {
            return Err(spec.param_error("targets", "needs at least one state"));
        }
        Ok(Box::new(ProbTarget::new(targets)))
    });
    t.register("return", |_, _| Ok(Box::new(ReturnTarget::new())));
}

// ── Actions ───────────────────────────────────────────────────────────────────

fn register_actions(r: &mut Registry) {
    for (kind, op) in [
        ("set_property", PropertyOp::Set),
        ("offset_property", PropertyOp::Offset),
        ("scale_property", PropertyOp::Scale),
    ] {
        r.actions.register(kind, move |spec, _| {
            Ok(Box::new(PropertyAction::new(manipulator(spec, op)?, spec.bool_or("exit_reset", false)?)))
        });
    }
}

// ── Goal selectors ────────────────────────────────────────────────────────────

fn register_selectors(r: &mut Registry) {
    let s = &mut r.selectors;
    s.register("identity", |_, _| Ok(Box::new(IdentitySelector)));
    s.register("mirror", |spec, _| {
        Ok(Box::new(MirrorSelector {
            mirror_x: spec.bool_or("mirror_x", false)?,
            mirror_y: spec.bool_or("mirror_y", false)?,
        }))
    });
    s.register("offset", |spec, _| Ok(Box::new(OffsetSelector { offset: spec.vec2_gen("offset")? })));
    s.register("explicit", |spec, _| {
        Ok(Box::new(ExplicitSelector { goal_set: goal_set(spec)?, goal: GoalId(spec.u32("goal")?) }))
    });
    s.register("nearest", |spec, _| Ok(Box::new(NearestSelector { goal_set: goal_set(spec)? })));
    s.register("farthest", |spec, _| Ok(Box::new(FarthestSelector { goal_set: goal_set(spec)? })));
    s.register("second_nearest", |spec, _| {
        Ok(Box::new(SecondNearestSelector { goal_set: goal_set(spec)? }))
    });
    s.register("random", |spec, _| Ok(Box::new(RandomSelector { goal_set: goal_set(spec)? })));
    s.register("weighted", |spec, _| Ok(Box::new(WeightedSelector { goal_set: goal_set(spec)? })));
    s.register("nearest_nav_mesh", |spec, ctx: &FactoryContext<'_>| {
        let name = spec.str("nav_mesh")?;
        let localizer = ctx
            .resources
            .nav_mesh(name)
            .ok_or_else(|| spec.param_error("nav_mesh", format!("no navigation mesh named {name:?}")))?;
        Ok(Box::new(NearestNavMeshSelector { goal_set: goal_set(spec)?, localizer: localizer.clone() }))
    });
    s.register("shared", |spec, _| {
        Ok(Box::new(SharedSelector { source: spec.str("state")?.to_owned() }))
    });
}

// ── Velocity ──────────────────────────────────────────────────────────────────

fn register_velocity(r: &mut Registry) {
    let v = &mut r.vel_components;
    v.register("zero", |_, _| Ok(Box::new(ZeroVelComponent)));
    v.register("const", |spec, _| Ok(Box::new(ConstVelComponent { vel: spec.vec2("vel")? })));
    v.register("const_dir", |spec, _| Ok(Box::new(ConstDirVelComponent { dir: spec.vec2("dir")? })));
    v.register("goal", |_, _| Ok(Box::new(GoalVelComponent)));

    r.vel_modifiers.register("scale", |spec, _| {
        Ok(Box::new(ScaleVelModifier { factor: spec.f32("factor")? }))
    });
}

// ── Events ────────────────────────────────────────────────────────────────────

fn register_events(r: &mut Registry) {
    r.triggers.register("state_population", |spec, _| {
        let mode: PopulationMode = spec
            .str("mode")?
            .parse()
            .map_err(|e: String| spec.param_error("mode", e))?;
        Ok(Box::new(StatePopulationTrigger::new(spec.str("state")?, mode, spec.u32("threshold")? as usize)))
    });
    r.triggers.register("time", |spec, _| {
        let period = if spec.has("period") { Some(spec.f32("period")?) } else { None };
        Ok(Box::new(TimeTrigger::new(spec.f32("at")?, period)))
    });

    r.event_targets.register("state_member", |spec, _| {
        Ok(Box::new(StateMemberTarget::new(spec.str("state")?, spec.bool_or("inside", true)?)))
    });
    r.event_targets.register("all_agents", |_, _| Ok(Box::new(AllAgentsTarget::default())));

    r.event_effects.register("change_state", |spec, _| {
        Ok(Box::new(ChangeStateEffect::new(spec.str("state")?, spec.bool_or("force_reentry", false)?)))
    });
    for (kind, op) in [
        ("set_agent_property", PropertyOp::Set),
        ("offset_agent_property", PropertyOp::Offset),
        ("scale_agent_property", PropertyOp::Scale),
    ] {
        r.event_effects.register(kind, move |spec, _| Ok(Box::new(PropertyEffect::new(manipulator(spec, op)?))));
    }
}

// ── Tasks ─────────────────────────────────────────────────────────────────────

fn register_tasks(r: &mut Registry) {
    r.tasks.register("nav_mesh_localizer", |spec, ctx: &FactoryContext<'_>| {
        let name = spec.str("nav_mesh")?;
        let localizer = ctx
            .resources
            .nav_mesh(name)
            .ok_or_else(|| spec.param_error("nav_mesh", format!("no navigation mesh named {name:?}")))?;
        Ok(Box::new(NavMeshLocalizerTask::new(localizer.clone())))
    });
}
