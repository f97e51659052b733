//! Transition targets: where an agent goes once a condition is met.
//!
//! Targets name their destination states; the names are resolved to
//! `StateId`s once, by [`connect`](TransitionTarget::connect), while the FSM
//! is built.

use std::sync::Mutex;

use bfsm_agent::Agent;
use bfsm_core::{AgentId, AgentRng, SampleRng, StateId, sync};
use rustc_hash::FxHashMap;

use crate::{BuildError, BuildResult};

pub trait TransitionTarget: Send + Sync {
    /// The agent entered the state owning this target.  `origin` is the
    /// state the agent was in when the current advance began.
    fn on_enter(&self, _agent: AgentId, _origin: StateId) {}

    fn on_leave(&self, _agent: AgentId) {}

    fn next_state(&self, agent: &Agent<'_>, rng: &mut AgentRng) -> Option<StateId>;

    /// Resolve destination names.
    fn connect(&mut self, states: &FxHashMap<String, StateId>) -> BuildResult<()>;

    /// A deep copy with empty per-agent state.
    fn copy(&self) -> Box<dyn TransitionTarget>;
}

fn resolve(states: &FxHashMap<String, StateId>, name: &str) -> BuildResult<StateId> {
    states.get(name).copied().ok_or_else(|| BuildError::UnknownState {
        name:    name.to_owned(),
        context: "transition target".to_owned(),
    })
}

// ── Single ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SingleTarget {
    name:  String,
    state: StateId,
}

impl SingleTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), state: StateId::INVALID }
    }
}

impl TransitionTarget for SingleTarget {
    fn next_state(&self, _: &Agent<'_>, _: &mut AgentRng) -> Option<StateId> {
        self.state.is_valid().then_some(self.state)
    }

    fn connect(&mut self, states: &FxHashMap<String, StateId>) -> BuildResult<()> {
        self.state = resolve(states, &self.name)?;
        Ok(())
    }

    fn copy(&self) -> Box<dyn TransitionTarget> {
        Box::new(self.clone())
    }
}

// ── Probabilistic ─────────────────────────────────────────────────────────────

/// Weighted random choice among several states.
#[derive(Debug, Clone)]
pub struct ProbTarget {
    names:    Vec<(String, f32)>,
    resolved: Vec<(StateId, f32)>,
    total:    f32,
}

impl ProbTarget {
    pub fn new(targets: impl IntoIterator<Item = (String, f32)>) -> Self {
        let names: Vec<(String, f32)> =
            targets.into_iter().map(|(n, w)| (n, w.max(0.0))).collect();
        let total = names.iter().map(|(_, w)| w).sum();
        Self { names, resolved: Vec::new(), total }
    }
}

impl TransitionTarget for ProbTarget {
    fn next_state(&self, _: &Agent<'_>, rng: &mut AgentRng) -> Option<StateId> {
        let (last, _) = *self.resolved.last()?;
        let threshold = self.total * rng.unit();
        let mut accum = 0.0;
        for &(state, w) in &self.resolved {
            accum += w;
            if accum > threshold {
                return Some(state);
            }
        }
        Some(last)
    }

    fn connect(&mut self, states: &FxHashMap<String, StateId>) -> BuildResult<()> {
        self.resolved = self
            .names
            .iter()
            .map(|(name, w)| resolve(states, name).map(|s| (s, *w)))
            .collect::<BuildResult<_>>()?;
        Ok(())
    }

    fn copy(&self) -> Box<dyn TransitionTarget> {
        Box::new(self.clone())
    }
}

// ── Return ────────────────────────────────────────────────────────────────────

/// Sends each agent back to the state it came from.
#[derive(Debug, Default)]
pub struct ReturnTarget {
    origins: Mutex<FxHashMap<AgentId, StateId>>,
}

impl ReturnTarget {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TransitionTarget for ReturnTarget {
    fn on_enter(&self, agent: AgentId, origin: StateId) {
        sync::lock(&self.origins).insert(agent, origin);
    }

    fn on_leave(&self, agent: AgentId) {
        sync::lock(&self.origins).remove(&agent);
    }

    fn next_state(&self, agent: &Agent<'_>, _: &mut AgentRng) -> Option<StateId> {
        sync::lock(&self.origins).get(&agent.id).copied()
    }

    fn connect(&mut self, _: &FxHashMap<String, StateId>) -> BuildResult<()> {
        Ok(())
    }

    fn copy(&self) -> Box<dyn TransitionTarget> {
        Box::new(ReturnTarget::new())
    }
}
