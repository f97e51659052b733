//! A behavioral state and the enter / leave / transition-test protocol.
//!
//! # Cascading transitions
//!
//! [`State::test_transitions`] does not stop at the first transition that
//! fires: the agent enters the target and the target's transitions are
//! tested in turn, so one advance may walk `A -> B -> C`.  The walk keeps the
//! set of states already tested during this advance and stops as soon as it
//! enters one of them again, so it ends after at most as many transitions as
//! there are states.

use std::sync::{Arc, RwLock};

use bfsm_agent::{Agent, PrefVelocity};
use bfsm_core::{AgentId, AgentRng, StateId, sync};
use bfsm_goals::{Goal, SelectorSlot};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{Action, StateError, StepContext, Task, Transition, VelComponent, VelModifier};

pub struct State {
    id:            StateId,
    name:          String,
    is_final:      bool,
    vel_component: Box<dyn VelComponent>,
    actions:       Vec<Box<dyn Action>>,
    /// Tested in order; the first one met wins.
    transitions:   Vec<Transition>,
    vel_modifiers: Vec<Box<dyn VelModifier>>,
    selector:      Arc<SelectorSlot>,
    /// Exactly one entry per agent currently in this state.
    goals:         RwLock<FxHashMap<AgentId, Arc<Goal>>>,
}

impl State {
    pub fn new(
        id: StateId,
        name: impl Into<String>,
        vel_component: Box<dyn VelComponent>,
        selector: Arc<SelectorSlot>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            is_final: false,
            vel_component,
            actions: Vec::new(),
            transitions: Vec::new(),
            vel_modifiers: Vec::new(),
            selector,
            goals: RwLock::new(FxHashMap::default()),
        }
    }

    pub fn with_final(mut self, is_final: bool) -> Self {
        self.is_final = is_final;
        self
    }

    pub fn add_action(&mut self, action: Box<dyn Action>) {
        self.actions.push(action);
    }

    pub fn add_transition(&mut self, transition: Transition) {
        self.transitions.push(transition);
    }

    pub fn add_vel_modifier(&mut self, modifier: Box<dyn VelModifier>) {
        self.vel_modifiers.push(modifier);
    }

    #[inline]
    pub fn id(&self) -> StateId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn is_final(&self) -> bool {
        self.is_final
    }

    pub fn selector(&self) -> &Arc<SelectorSlot> {
        &self.selector
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    /// The goal recorded for `agent`, if it is in this state.
    pub fn goal(&self, agent: AgentId) -> Option<Arc<Goal>> {
        sync::read(&self.goals).get(&agent).cloned()
    }

    /// Number of agents currently in this state.
    pub fn population(&self) -> usize {
        sync::read(&self.goals).len()
    }

    /// Every task requested by this state's elements.
    pub fn tasks(&self) -> Vec<Box<dyn Task>> {
        let mut tasks = self.vel_component.tasks();
        for action in &self.actions {
            tasks.extend(action.tasks());
        }
        for transition in &self.transitions {
            tasks.extend(transition.tasks());
        }
        for modifier in &self.vel_modifiers {
            tasks.extend(modifier.tasks());
        }
        tasks
    }

    // ── Protocol ──────────────────────────────────────────────────────────────

    /// Bring `agent` into this state.  `origin` is the state it occupied when
    /// the current advance began.
    ///
    /// # Errors
    ///
    /// `StateError::Goal` when the selector cannot provide a goal.  The
    /// entry actions are undone and nothing of the agent is recorded here.
    pub fn enter(
        &self,
        agent: &mut Agent<'_>,
        ctx: &StepContext<'_>,
        rng: &mut AgentRng,
        origin: StateId,
    ) -> Result<(), StateError> {
        for action in &self.actions {
            action.on_enter(agent, rng);
        }

        let goal = match self.selector.assign_goal(agent, &ctx.selection(), rng) {
            Ok(goal) => goal,
            Err(source) => {
                for action in self.actions.iter().rev() {
                    action.undo_enter(agent);
                }
                return Err(StateError::Goal { state: self.name.clone(), source });
            }
        };
        sync::write(&self.goals).insert(agent.id, goal);

        self.vel_component.on_enter(agent);
        for transition in &self.transitions {
            transition.on_enter(agent, ctx, rng, origin);
        }
        for modifier in &self.vel_modifiers {
            modifier.register_agent(agent.id);
        }
        Ok(())
    }

    pub fn leave(&self, agent: &mut Agent<'_>) {
        let goal = sync::write(&self.goals).remove(&agent.id);
        if let Some(goal) = goal {
            self.selector.free_goal(agent.id, &goal);
        }

        for action in &self.actions {
            action.on_leave(agent);
        }
        self.vel_component.on_leave(agent);
        for transition in &self.transitions {
            transition.on_leave(agent);
        }
        for modifier in &self.vel_modifiers {
            modifier.unregister_agent(agent.id);
        }
    }

    /// Test this state's transitions for `agent`, following any chain of
    /// transitions that fire.  `origin` is the state the advance started in.
    /// `current` is updated after every successful enter, so it names the
    /// agent's state even if a later link fails.
    ///
    /// When the target cannot be entered the agent goes back into this
    /// state.  If that fails too, `current` becomes `StateId::INVALID`.
    #[allow(clippy::too_many_arguments)]
    pub fn test_transitions(
        &self,
        states: &[State],
        agent: &mut Agent<'_>,
        ctx: &StepContext<'_>,
        rng: &mut AgentRng,
        origin: StateId,
        current: &mut StateId,
        visited: &mut FxHashSet<StateId>,
    ) -> Result<(), StateError> {
        visited.insert(self.id);

        let goal = self
            .goal(agent.id)
            .ok_or_else(|| StateError::MissingGoal { state: self.name.clone(), agent: agent.id })?;
        let next = self
            .transitions
            .iter()
            .find_map(|t| t.test(agent, &goal, ctx, rng));
        let Some(next) = next else {
            return Ok(());
        };
        let target = states
            .get(next.index())
            .ok_or(StateError::NotInState { agent: agent.id, state: next })?;

        self.leave(agent);
        if let Err(e) = target.enter(agent, ctx, rng, origin) {
            if let Err(again) = self.enter(agent, ctx, rng, origin) {
                tracing::error!(
                    agent = %agent.id,
                    state = %self.name,
                    error = %again,
                    "could not return to the state just left"
                );
                *current = StateId::INVALID;
            }
            return Err(e);
        }
        *current = next;
        tracing::debug!(agent = %agent.id, from = %self.name, to = %target.name, "transition");

        if visited.contains(&next) {
            if next == self.id {
                tracing::debug!(agent = %agent.id, state = %self.name, "state re-entered; chain ends");
            } else {
                tracing::warn!(
                    agent = %agent.id,
                    state = %target.name,
                    "transition chain returned to a state already tested this step; chain ends"
                );
            }
            return Ok(());
        }
        target.test_transitions(states, agent, ctx, rng, origin, current, visited)
    }

    /// Compute the agent's preferred velocity: the velocity component, then
    /// this state's modifiers in order.
    pub fn get_pref_velocity(
        &self,
        agent: &Agent<'_>,
        ctx: &StepContext<'_>,
        pref: &mut PrefVelocity,
    ) -> Result<(), StateError> {
        let goal = self
            .goal(agent.id)
            .ok_or_else(|| StateError::MissingGoal { state: self.name.clone(), agent: agent.id })?;
        self.vel_component.set_pref_velocity(agent, &goal, ctx, pref);
        for modifier in &self.vel_modifiers {
            modifier.adapt_pref_velocity(agent, pref);
        }
        Ok(())
    }
}
