//! The behavior FSM: states, the per-agent current-state array, and the
//! per-step driver.
//!
//! # Step order
//!
//! ```text
//! do_step
//!   1. events.evaluate()                      sequential
//!   2. for every agent (parallel):
//!        advance       test transitions, possibly chaining
//!        pref velocity state component + modifiers, then global modifiers
//!   3. escalate if any event operand or agent failed
//! (simulator moves agents)
//! do_tasks                                    sequential, insertion order
//! ```
//!
//! Per-agent failures in steps 1 and 2 never stop other agents.  They are
//! logged, counted, and reported together as `FsmError::AgentsFailed` once
//! every agent has been attempted.

use std::sync::Arc;

use bfsm_agent::{Agent, AgentBody, AgentProperties, AgentRngs, AgentStore, PrefVelocity};
use bfsm_core::{AgentId, AgentRng, GoalId, GoalSetId, SimClock, StateId};
use bfsm_goals::{Goal, GoalSets};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    EventSystem, FsmError, FsmResult, State, StateError, StepContext, Task, TaskContext,
    TaskError, VelModifier,
};

pub struct Fsm {
    states:        Vec<State>,
    names:         FxHashMap<String, StateId>,
    /// `current[agent]` is the single source of truth for an agent's state.
    current:       Vec<StateId>,
    goal_sets:     GoalSets,
    vel_modifiers: Vec<Box<dyn VelModifier>>,
    tasks:         Vec<Box<dyn Task>>,
    events:        EventSystem,
}

impl Fsm {
    pub fn new(goal_sets: GoalSets, agent_count: usize) -> Self {
        Self {
            states: Vec::new(),
            names: FxHashMap::default(),
            current: vec![StateId::INVALID; agent_count],
            goal_sets,
            vel_modifiers: Vec::new(),
            tasks: Vec::new(),
            events: EventSystem::default(),
        }
    }

    // ── Construction ──────────────────────────────────────────────────────────

    /// Append a state.  Its id must equal its index.
    pub(crate) fn add_state(&mut self, state: State) {
        debug_assert_eq!(state.id().index(), self.states.len());
        self.names.insert(state.name().to_owned(), state.id());
        self.states.push(state);
    }

    pub fn add_vel_modifier(&mut self, modifier: Box<dyn VelModifier>) {
        self.vel_modifiers.push(modifier);
    }

    pub(crate) fn set_events(&mut self, events: EventSystem) {
        self.events = events;
    }

    /// Register a task unless an equivalent one is already registered.
    /// Returns `true` if the task was added.
    pub fn add_task(&mut self, task: Box<dyn Task>) -> bool {
        if self.tasks.iter().any(|t| t.is_equivalent(task.as_ref())) {
            tracing::debug!(task = %task, "equivalent task already registered");
            return false;
        }
        self.tasks.push(task);
        true
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Resize the current-state array.  Every agent's state is forgotten and
    /// must be re-initialized with [`initialize_agent`](Self::initialize_agent).
    pub fn set_agent_count(&mut self, count: usize) {
        self.current.clear();
        self.current.resize(count, StateId::INVALID);
    }

    /// Place `agent` in `state` for the first time.
    pub fn initialize_agent(
        &mut self,
        agent: AgentId,
        state: StateId,
        agents: &mut AgentStore,
        rngs: &mut AgentRngs,
        clock: &SimClock,
    ) -> FsmResult<()> {
        let target = self.states.get(state.index()).ok_or(FsmError::UnknownState(state))?;
        let slot = self.current.get_mut(agent.index()).ok_or(FsmError::UnknownAgent(agent))?;
        let (bodies, props, _) = agents.decision_split();
        let ctx = StepContext::new(clock, bodies, &self.goal_sets);
        let (mut a, rng) = agent_parts(agent, bodies, props, rngs)?;
        target.enter(&mut a, &ctx, rng, state)?;
        *slot = state;
        for modifier in &self.vel_modifiers {
            modifier.register_agent(agent);
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn agent_count(&self) -> usize {
        self.current.len()
    }

    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.get(id.index())
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn state_by_name(&self, name: &str) -> Option<&State> {
        self.names.get(name).and_then(|id| self.state(*id))
    }

    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.names.get(name).copied()
    }

    /// `None` for an unknown agent or one not yet placed in a state.
    pub fn get_agent_state_id(&self, agent: AgentId) -> Option<StateId> {
        self.current.get(agent.index()).copied().filter(|s| s.is_valid())
    }

    /// The goal `agent` holds in its current state.
    pub fn agent_goal(&self, agent: AgentId) -> Option<Arc<Goal>> {
        let state = self.get_agent_state_id(agent)?;
        self.state(state)?.goal(agent)
    }

    /// Number of agents currently in `state`.
    pub fn state_population(&self, state: StateId) -> usize {
        self.current.iter().filter(|s| **s == state).count()
    }

    pub fn goal_sets(&self) -> &GoalSets {
        &self.goal_sets
    }

    pub fn get_goal(&self, set: GoalSetId, goal: GoalId) -> Option<Arc<Goal>> {
        self.goal_sets.get_goal(set, goal).ok()
    }

    /// `true` iff every agent is in a final state; trivially `true` with no
    /// agents.
    pub fn all_final(&self) -> bool {
        self.current
            .iter()
            .all(|s| self.state(*s).is_some_and(State::is_final))
    }

    // ── Stepping ──────────────────────────────────────────────────────────────

    fn check_counts(&self, agents: &AgentStore, rngs: &AgentRngs) -> FsmResult<()> {
        let expected = self.current.len();
        if agents.count != expected {
            return Err(FsmError::AgentCountMismatch { expected, got: agents.count, what: "agent store" });
        }
        if rngs.len() != expected {
            return Err(FsmError::AgentCountMismatch { expected, got: rngs.len(), what: "agent RNG" });
        }
        Ok(())
    }

    /// One decision step.  Returns [`all_final`](Self::all_final) afterwards.
    ///
    /// # Errors
    ///
    /// `FsmError::AgentsFailed` once every agent has been attempted, if any
    /// agent (or event response) failed.
    pub fn do_step(
        &mut self,
        agents: &mut AgentStore,
        rngs: &mut AgentRngs,
        clock: &SimClock,
    ) -> FsmResult<bool> {
        self.check_counts(agents, rngs)?;

        let mut failed = 0;
        if !self.events.is_empty() {
            let mut events = std::mem::take(&mut self.events);
            failed += events.evaluate(self, agents, rngs, clock);
            self.events = events;
        }

        failed += self.step_agents(agents, rngs, clock);
        if failed > 0 {
            tracing::error!(failed, time = clock.time, "agents failed during the step");
            return Err(FsmError::AgentsFailed { failed });
        }
        Ok(self.all_final())
    }

    fn step_agents(&mut self, agents: &mut AgentStore, rngs: &mut AgentRngs, clock: &SimClock) -> usize {
        // Explicit field borrows so the borrow checker sees disjoint access.
        let states = self.states.as_slice();
        let modifiers = self.vel_modifiers.as_slice();
        let current = &mut self.current;
        let (bodies, props, prefs) = agents.decision_split();
        let ctx = StepContext::new(clock, bodies, &self.goal_sets);

        #[cfg(not(feature = "parallel"))]
        {
            current
                .iter_mut()
                .zip(props.iter_mut())
                .zip(prefs.iter_mut())
                .zip(rngs.inner.iter_mut())
                .enumerate()
                .map(|(i, (((cur, props), pref), rng))| {
                    run_agent(states, modifiers, &ctx, AgentId(i as u32), cur, props, pref, rng)
                })
                .sum()
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            current
                .par_iter_mut()
                .zip(props.par_iter_mut())
                .zip(prefs.par_iter_mut())
                .zip(rngs.inner.par_iter_mut())
                .enumerate()
                .map(|(i, (((cur, props), pref), rng))| {
                    run_agent(states, modifiers, &ctx, AgentId(i as u32), cur, props, pref, rng)
                })
                .sum()
        }
    }

    /// Test `agent`'s transitions, following any chain that fires.
    pub fn advance(
        &mut self,
        agent: AgentId,
        agents: &mut AgentStore,
        rngs: &mut AgentRngs,
        clock: &SimClock,
    ) -> FsmResult<()> {
        let states = self.states.as_slice();
        let current = self.current.get_mut(agent.index()).ok_or(FsmError::UnknownAgent(agent))?;
        let (bodies, props, _) = agents.decision_split();
        let ctx = StepContext::new(clock, bodies, &self.goal_sets);
        let (mut a, rng) = agent_parts(agent, bodies, props, rngs)?;
        advance_agent(states, &mut a, &ctx, rng, current)?;
        Ok(())
    }

    /// Write `agent`'s preferred velocity into the store.
    pub fn compute_pref_velocity(
        &self,
        agent: AgentId,
        agents: &mut AgentStore,
        clock: &SimClock,
    ) -> FsmResult<()> {
        let state = self.get_agent_state_id(agent).ok_or(FsmError::UnknownAgent(agent))?;
        let (bodies, props, prefs) = agents.decision_split();
        let ctx = StepContext::new(clock, bodies, &self.goal_sets);
        let i = agent.index();
        let (Some(body), Some(props), Some(pref)) = (bodies.get(i), props.get_mut(i), prefs.get_mut(i))
        else {
            return Err(FsmError::UnknownAgent(agent));
        };
        let a = Agent { id: agent, body, props };
        pref_velocity(&self.states, &self.vel_modifiers, &a, &ctx, state, pref)?;
        Ok(())
    }

    /// Move `agent` into `target` outside the normal transition test.
    /// Returns `false` if it was already there and `force_reentry` is off.
    pub fn force_state(
        &mut self,
        agent: AgentId,
        target: StateId,
        force_reentry: bool,
        agents: &mut AgentStore,
        rngs: &mut AgentRngs,
        clock: &SimClock,
    ) -> FsmResult<bool> {
        let to = self.states.get(target.index()).ok_or(FsmError::UnknownState(target))?;
        let slot = self.current.get_mut(agent.index()).ok_or(FsmError::UnknownAgent(agent))?;
        let from = *slot;
        if from == target && !force_reentry {
            return Ok(false);
        }
        let (bodies, props, _) = agents.decision_split();
        let ctx = StepContext::new(clock, bodies, &self.goal_sets);
        let (mut a, rng) = agent_parts(agent, bodies, props, rngs)?;
        let previous = self.states.get(from.index());
        if let Some(state) = previous {
            state.leave(&mut a);
        }
        if let Err(e) = to.enter(&mut a, &ctx, rng, from) {
            let returned = previous.is_some_and(|state| state.enter(&mut a, &ctx, rng, from).is_ok());
            if !returned {
                tracing::error!(%agent, from = %from, "could not return to the previous state");
                *slot = StateId::INVALID;
            }
            return Err(e.into());
        }
        *slot = target;
        tracing::debug!(%agent, from = %from, to = %to.name(), "state forced");
        Ok(true)
    }

    /// Run every task once, in registration order.
    ///
    /// # Errors
    ///
    /// `FsmError::TaskFatal` from the first task that fails fatally; the
    /// remaining tasks do not run.
    pub fn do_tasks(&self, agents: &AgentStore, time: f32) -> FsmResult<()> {
        let ctx = TaskContext { fsm: self, agents, time };
        for task in &self.tasks {
            match task.do_work(&ctx) {
                Ok(()) => {}
                Err(TaskError::Recoverable(reason)) => {
                    tracing::warn!(task = %task, %reason, "task failed; skipped this step");
                }
                Err(TaskError::Fatal(reason)) => {
                    tracing::error!(task = %task, %reason, "task failed fatally");
                    return Err(FsmError::TaskFatal { task: task.to_string(), reason });
                }
            }
        }
        Ok(())
    }
}

// ── Per-agent helpers ─────────────────────────────────────────────────────────

fn agent_parts<'a>(
    id: AgentId,
    bodies: &'a [AgentBody],
    props: &'a mut [AgentProperties],
    rngs: &'a mut AgentRngs,
) -> FsmResult<(Agent<'a>, &'a mut AgentRng)> {
    let i = id.index();
    match (bodies.get(i), props.get_mut(i), rngs.get_mut(id)) {
        (Some(body), Some(props), Some(rng)) => Ok((Agent { id, body, props }, rng)),
        _ => Err(FsmError::UnknownAgent(id)),
    }
}

fn advance_agent(
    states: &[State],
    agent: &mut Agent<'_>,
    ctx: &StepContext<'_>,
    rng: &mut AgentRng,
    current: &mut StateId,
) -> Result<(), StateError> {
    let origin = *current;
    let state = states
        .get(origin.index())
        .ok_or(StateError::NotInState { agent: agent.id, state: origin })?;
    let mut visited = FxHashSet::default();
    state.test_transitions(states, agent, ctx, rng, origin, current, &mut visited)
}

fn pref_velocity(
    states: &[State],
    modifiers: &[Box<dyn VelModifier>],
    agent: &Agent<'_>,
    ctx: &StepContext<'_>,
    current: StateId,
    pref: &mut PrefVelocity,
) -> Result<(), StateError> {
    let state = states
        .get(current.index())
        .ok_or(StateError::NotInState { agent: agent.id, state: current })?;
    state.get_pref_velocity(agent, ctx, pref)?;
    for modifier in modifiers {
        modifier.adapt_pref_velocity(agent, pref);
    }
    Ok(())
}

/// One agent's share of the decision phase.  Returns 1 on failure so the
/// caller can count failures with `sum`.
#[allow(clippy::too_many_arguments)]
fn run_agent(
    states: &[State],
    modifiers: &[Box<dyn VelModifier>],
    ctx: &StepContext<'_>,
    id: AgentId,
    current: &mut StateId,
    props: &mut AgentProperties,
    pref: &mut PrefVelocity,
    rng: &mut AgentRng,
) -> usize {
    let mut agent = Agent { id, body: &ctx.bodies[id.index()], props };
    let result = advance_agent(states, &mut agent, ctx, rng, current)
        .and_then(|()| pref_velocity(states, modifiers, &agent, ctx, *current, pref));
    match result {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!(agent = %id, error = %e, "agent failed during the step");
            1
        }
    }
}
