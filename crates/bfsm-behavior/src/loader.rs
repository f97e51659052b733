//! TOML behavior loader.
//!
//! # File format
//!
//! ```toml
//! initial_state = "walk"
//!
//! [initial_by_class]
//! 1 = "wait"
//!
//! [[goal_set]]
//! id = 0
//! [[goal_set.goal]]
//! id = 0
//! type = "circle"
//! center = [10.0, 0.0]
//! radius = 1.0
//! capacity = 4
//!
//! [[state]]
//! name = "walk"
//! velocity = { type = "goal" }
//! goal_selector = { type = "nearest", goal_set = 0 }
//!
//! [[state]]
//! name = "arrived"
//! final = true
//!
//! [[transition]]
//! from = "walk"                # or ["a", "b"]
//! to = "arrived"               # or targets = [{ state = "a", weight = 2 }], or return = true
//! condition = { type = "goal_reached", distance = 0.5 }
//!
//! [[task]]
//! type = "nav_mesh_localizer"
//! nav_mesh = "floor"
//! ```
//!
//! `to`, `targets` and `return` are shorthands for the `single`, `prob` and
//! `return` transition targets; any registered target can be named with
//! `target = { type = "...", ... }`.  A transition takes exactly one of the
//! four forms.
//!
//! Global velocity modifiers go in `[[vel_modifier]]`.  Events use
//! `[[event_target]]` and `[[event_effect]]` (each with a `name`) and
//! `[[event]]` with a `trigger` table and `response = [{ effect, target }]`.
//!
//! Element tables carry their type name in `type`; see
//! [`builtins`](crate::builtins) for the names and their parameters.

use std::collections::BTreeMap;
use std::path::Path;

use bfsm_core::{GoalId, GoalSetId};
use bfsm_goals::{Goal, GoalError, GoalSet};
use serde::Deserialize;
use toml::{Table, Value};

use crate::registry::{ElementSpec, FactoryContext, Registry, Resources};
use crate::{
    BehaviorDescription, BuildError, BuildResult, StateDescription, Transition,
};

// ── File schema ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct BehaviorFile {
    #[serde(default)]
    initial_state:    Option<String>,
    #[serde(default)]
    initial_by_class: BTreeMap<String, String>,
    #[serde(default, rename = "goal_set")]
    goal_sets:        Vec<GoalSetNode>,
    #[serde(default, rename = "state")]
    states:           Vec<StateNode>,
    #[serde(default, rename = "transition")]
    transitions:      Vec<TransitionNode>,
    #[serde(default, rename = "vel_modifier")]
    vel_modifiers:    Vec<Table>,
    #[serde(default, rename = "event_target")]
    event_targets:    Vec<NamedNode>,
    #[serde(default, rename = "event_effect")]
    event_effects:    Vec<NamedNode>,
    #[serde(default, rename = "event")]
    events:           Vec<EventNode>,
    #[serde(default, rename = "task")]
    tasks:            Vec<Table>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct GoalSetNode {
    id:    u32,
    #[serde(default, rename = "goal")]
    goals: Vec<GoalNode>,
}

#[derive(Deserialize)]
struct GoalNode {
    id:       u32,
    #[serde(default)]
    weight:   Option<f32>,
    #[serde(default)]
    capacity: Option<usize>,
    /// `type` plus the shape parameters.
    #[serde(flatten)]
    shape:    Table,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct StateNode {
    name:          String,
    #[serde(default, rename = "final")]
    is_final:      bool,
    #[serde(default)]
    persistent:    bool,
    #[serde(default)]
    velocity:      Option<Table>,
    #[serde(default)]
    goal_selector: Option<Table>,
    #[serde(default, rename = "action")]
    actions:       Vec<Table>,
    #[serde(default, rename = "vel_modifier")]
    vel_modifiers: Vec<Table>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TransitionNode {
    from:      OneOrMany,
    #[serde(default)]
    to:        Option<String>,
    #[serde(default)]
    targets:   Option<Vec<ProbNode>>,
    #[serde(default, rename = "return")]
    to_origin: bool,
    #[serde(default)]
    target:    Option<Table>,
    condition: Table,
}

impl TransitionNode {
    /// The target element this transition names, shorthands expanded.
    fn target_spec(&mut self) -> BuildResult<ElementSpec> {
        let shorthand = |kind: &str, key: &str, value: Value| {
            let mut params = Table::new();
            params.insert(key.to_owned(), value);
            ElementSpec::new(kind, params)
        };
        match (self.to.take(), self.targets.take(), self.to_origin, self.target.take()) {
            (Some(to), None, false, None) => Ok(shorthand("single", "state", Value::String(to))),
            (None, Some(targets), false, None) => {
                let entries = targets
                    .into_iter()
                    .map(|t| {
                        let mut entry = Table::new();
                        entry.insert("state".to_owned(), Value::String(t.state));
                        entry.insert("weight".to_owned(), Value::Float(f64::from(t.weight)));
                        Value::Table(entry)
                    })
                    .collect();
                Ok(shorthand("prob", "targets", Value::Array(entries)))
            }
            (None, None, true, None) => Ok(ElementSpec::new("return", Table::new())),
            (None, None, false, Some(table)) => ElementSpec::from_table(table, "transition target"),
            _ => Err(BuildError::Param {
                kind:   "transition".to_owned(),
                key:    "to".to_owned(),
                reason: "exactly one of `to`, `targets`, `return = true` or `target` is required"
                    .to_owned(),
            }),
        }
    }
}

fn unit_weight() -> f32 {
    1.0
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ProbNode {
    state:  String,
    #[serde(default = "unit_weight")]
    weight: f32,
}

#[derive(Deserialize)]
struct NamedNode {
    name: String,
    #[serde(flatten)]
    spec: Table,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct EventNode {
    name:     String,
    trigger:  Table,
    #[serde(default)]
    response: Vec<ResponseNode>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ResponseNode {
    effect: String,
    target: String,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load a behavior description from a TOML file.  Relative resource paths in
/// the file resolve against the file's folder.
pub fn load_behavior_file(
    path: &Path,
    registry: &Registry,
    resources: &Resources,
) -> BuildResult<BehaviorDescription> {
    let text = std::fs::read_to_string(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    load_behavior_str(&text, base, registry, resources)
}

/// Like [`load_behavior_file`] but parses `text` directly.
pub fn load_behavior_str(
    text: &str,
    base_folder: &Path,
    registry: &Registry,
    resources: &Resources,
) -> BuildResult<BehaviorDescription> {
    let file: BehaviorFile = toml::from_str(text)?;
    let ctx = FactoryContext { base_folder, resources, registry };
    let mut desc = BehaviorDescription::new();

    // ── Goal sets ─────────────────────────────────────────────────────────
    for node in file.goal_sets {
        let set_id = GoalSetId(node.id);
        let mut set = GoalSet::new(set_id);
        for g in node.goals {
            let shape = ElementSpec::from_table(g.shape, "goal")?.shape()?;
            let mut goal = Goal::new(GoalId(g.id), shape);
            if let Some(w) = g.weight {
                goal = goal.with_weight(w);
            }
            if let Some(c) = g.capacity {
                goal = goal.with_capacity(c);
            }
            if !set.add_goal(GoalId(g.id), goal) {
                return Err(GoalError::DuplicateGoal { set: set_id, goal: GoalId(g.id) }.into());
            }
        }
        desc.add_goal_set(set)?;
    }

    // ── States ────────────────────────────────────────────────────────────
    for node in file.states {
        let mut state = StateDescription::new(node.name)
            .final_state(node.is_final)
            .persistent(node.persistent);
        if let Some(table) = node.velocity {
            let spec = ElementSpec::from_table(table, "velocity component")?;
            state = state.velocity(registry.vel_components.create(&spec, &ctx)?);
        }
        if let Some(table) = node.goal_selector {
            let spec = ElementSpec::from_table(table, "goal selector")?;
            state = state.selector(registry.selectors.create(&spec, &ctx)?);
        }
        for table in node.actions {
            let spec = ElementSpec::from_table(table, "action")?;
            state = state.action(registry.actions.create(&spec, &ctx)?);
        }
        for table in node.vel_modifiers {
            let spec = ElementSpec::from_table(table, "velocity modifier")?;
            state = state.vel_modifier(registry.vel_modifiers.create(&spec, &ctx)?);
        }
        desc.add_state(state);
    }

    // ── Transitions ───────────────────────────────────────────────────────
    for mut node in file.transitions {
        let target = registry.targets.create(&node.target_spec()?, &ctx)?;
        let spec = ElementSpec::from_table(node.condition, "condition")?;
        let condition = registry.conditions.create(&spec, &ctx)?;
        desc.add_transition(node.from.into_vec(), Transition::new(condition, target));
    }

    for table in file.vel_modifiers {
        let spec = ElementSpec::from_table(table, "velocity modifier")?;
        desc.add_vel_modifier(registry.vel_modifiers.create(&spec, &ctx)?);
    }

    // ── Events ────────────────────────────────────────────────────────────
    for node in file.event_targets {
        let spec = ElementSpec::from_table(node.spec, "event target")?;
        desc.events.add_target(node.name, registry.event_targets.create(&spec, &ctx)?)?;
    }
    for node in file.event_effects {
        let spec = ElementSpec::from_table(node.spec, "event effect")?;
        desc.events.add_effect(node.name, registry.event_effects.create(&spec, &ctx)?)?;
    }
    for node in file.events {
        let spec = ElementSpec::from_table(node.trigger, "event trigger")?;
        let trigger = registry.triggers.create(&spec, &ctx)?;
        let responses = node.response.into_iter().map(|r| (r.effect, r.target));
        desc.events.add_event(node.name, trigger, responses)?;
    }

    for table in file.tasks {
        let spec = ElementSpec::from_table(table, "task")?;
        desc.add_task(registry.tasks.create(&spec, &ctx)?);
    }

    // ── Initial states ────────────────────────────────────────────────────
    desc.initial_state = file.initial_state;
    for (class, state) in file.initial_by_class {
        let class: u32 = class.parse().map_err(|_| BuildError::Param {
            kind:   "initial_by_class".to_owned(),
            key:    class.clone(),
            reason: "class keys must be non-negative integers".to_owned(),
        })?;
        desc.initial_by_class.insert(class, state);
    }

    Ok(desc)
}
