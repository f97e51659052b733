//! `build_fsm`: turn a [`BehaviorDescription`] into a connected [`Fsm`] and
//! place every agent in its starting state.
//!
//! # Phases
//!
//! 1. instantiate states (names must be unique)
//! 2. resolve shared selectors to the source state's slot
//! 3. connect transition targets and event elements to state ids
//! 4. collect tasks from every element, deduplicated
//! 5. enter every agent into its initial state
//!
//! Any failure aborts the build; no partially built FSM is returned.

use std::sync::Arc;

use bfsm_agent::{AgentRngs, AgentStore};
use bfsm_core::{AgentId, SimClock, StateId};
use bfsm_goals::{IdentitySelector, SelectorSlot};
use rustc_hash::FxHashMap;

use crate::{
    BehaviorDescription, BuildError, BuildResult, Fsm, FsmError, NavMeshLocalizerTask, State,
    ZeroVelComponent,
};

/// Build the FSM described by `desc` and initialize every agent in `agents`.
///
/// Failures are logged at `error` before being returned.
pub fn build_fsm(
    desc: BehaviorDescription,
    agents: &mut AgentStore,
    rngs: &mut AgentRngs,
    clock: &SimClock,
) -> BuildResult<Fsm> {
    match build(desc, agents, rngs, clock) {
        Ok(fsm) => {
            tracing::info!(
                states = fsm.state_count(),
                tasks = fsm.task_count(),
                agents = fsm.agent_count(),
                "behavior FSM built"
            );
            Ok(fsm)
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to build behavior FSM");
            Err(e)
        }
    }
}

fn build(
    desc: BehaviorDescription,
    agents: &mut AgentStore,
    rngs: &mut AgentRngs,
    clock: &SimClock,
) -> BuildResult<Fsm> {
    let BehaviorDescription {
        states: state_descs,
        transitions,
        goal_sets,
        tasks,
        vel_modifiers,
        mut events,
        initial_state,
        initial_by_class,
    } = desc;

    if state_descs.is_empty() {
        return Err(BuildError::NoStates);
    }
    if agents.count != rngs.len() {
        return Err(BuildError::AgentCountMismatch { store: agents.count, rngs: rngs.len() });
    }

    // ── 1. names ──────────────────────────────────────────────────────────────
    let mut names: FxHashMap<String, StateId> = FxHashMap::default();
    for (i, s) in state_descs.iter().enumerate() {
        if names.insert(s.name.clone(), StateId(i as u32)).is_some() {
            return Err(BuildError::DuplicateState(s.name.clone()));
        }
    }

    // ── 2. selector slots ─────────────────────────────────────────────────────
    let mut slots: Vec<Option<Arc<SelectorSlot>>> = Vec::with_capacity(state_descs.len());
    let mut shared: Vec<(usize, String)> = Vec::new();
    let mut rest = Vec::with_capacity(state_descs.len());
    for (i, s) in state_descs.into_iter().enumerate() {
        let selector = s.goal_selector.unwrap_or_else(|| Box::new(IdentitySelector));
        match selector.shared_source() {
            Some(source) => {
                shared.push((i, source.to_owned()));
                slots.push(None);
            }
            None => slots.push(Some(Arc::new(SelectorSlot::new(selector).persistent(s.persistent)))),
        }
        rest.push((s.name, s.is_final, s.vel_component, s.actions, s.vel_modifiers));
    }
    for (i, source) in shared {
        let state = rest[i].0.clone();
        let idx = names.get(&source).ok_or_else(|| BuildError::UnknownState {
            name:    source.clone(),
            context: format!("shared goal selector of state {state:?}"),
        })?;
        let slot = slots[idx.index()]
            .clone()
            .ok_or(BuildError::UnresolvedSharedSelector { state, source_state: source })?;
        slot.set_persistent(true);
        slots[i] = Some(slot);
    }

    // ── 3. states and transitions ─────────────────────────────────────────────
    let mut states = Vec::with_capacity(rest.len());
    for (i, ((name, is_final, vel, actions, modifiers), slot)) in rest.into_iter().zip(slots).enumerate() {
        let Some(slot) = slot else {
            return Err(BuildError::UnresolvedSharedSelector { state: name, source_state: String::new() });
        };
        if let Some(set) = slot.selector().goal_set() {
            if goal_sets.get(set).is_none() {
                return Err(BuildError::UnknownGoalSet {
                    set,
                    context: format!("goal selector of state {name:?}"),
                });
            }
        }
        let vel = vel.unwrap_or_else(|| Box::new(ZeroVelComponent));
        let mut state = State::new(StateId(i as u32), name, vel, slot).with_final(is_final);
        for action in actions {
            state.add_action(action);
        }
        for modifier in modifiers {
            state.add_vel_modifier(modifier);
        }
        states.push(state);
    }

    for (from, mut transition) in transitions {
        let idx = names.get(&from).ok_or_else(|| BuildError::UnknownState {
            name:    from.clone(),
            context: "transition source".to_owned(),
        })?;
        transition.connect(&names)?;
        states[idx.index()].add_transition(transition);
    }

    events.connect(&names)?;

    // ── 4. FSM and tasks ──────────────────────────────────────────────────────
    let mut fsm = Fsm::new(goal_sets, agents.count);
    let mut requested = tasks;
    for state in &states {
        requested.extend(state.tasks());
        if let Some(localizer) = state.selector().selector().nav_mesh_localizer() {
            requested.push(Box::new(NavMeshLocalizerTask::new(Arc::clone(localizer))));
        }
    }
    for modifier in &vel_modifiers {
        requested.extend(modifier.tasks());
    }
    for task in requested {
        fsm.add_task(task);
    }
    for state in states {
        fsm.add_state(state);
    }
    for modifier in vel_modifiers {
        fsm.add_vel_modifier(modifier);
    }
    fsm.set_events(events);

    // ── 5. initial states ─────────────────────────────────────────────────────
    let default_state = match &initial_state {
        Some(name) => *names.get(name).ok_or_else(|| BuildError::UnknownState {
            name:    name.clone(),
            context: "initial_state".to_owned(),
        })?,
        None => StateId(0),
    };
    let mut by_class: FxHashMap<u32, StateId> = FxHashMap::default();
    for (class, name) in &initial_by_class {
        let id = names.get(name).ok_or_else(|| BuildError::UnknownState {
            name:    name.clone(),
            context: format!("initial state of class {class}"),
        })?;
        by_class.insert(*class, *id);
    }

    for i in 0..agents.count {
        let agent = AgentId(i as u32);
        let class = agents.bodies[i].class;
        let state = by_class.get(&class).copied().unwrap_or(default_state);
        fsm.initialize_agent(agent, state, agents, rngs, clock)
            .map_err(|e| match e {
                FsmError::State(source) => BuildError::Initialization { agent, source },
                other => BuildError::Fsm(other),
            })?;
    }

    Ok(fsm)
}
