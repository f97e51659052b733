//! Global trigger → effect rules, evaluated once per step before any agent
//! advances.
//!
//! An event is one trigger and an ordered list of responses.  Each response
//! pairs a named effect with a named target; when the trigger fires the
//! target recomputes its operand set and the effect is applied to it.
//! Effects and targets are declared once and may be shared by several
//! events.

use std::fmt;

use bfsm_agent::{AgentRngs, AgentStore};
use bfsm_core::{AgentId, SimClock, StateId};
use rustc_hash::FxHashMap;

use crate::{AgentPropertyManipulator, BuildError, BuildResult, Fsm};

/// What an event target's operand set is made of.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum TargetKind {
    Agents,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Agents => f.write_str("agents"),
        }
    }
}

/// Read-only view handed to triggers.
pub struct EventView<'a> {
    pub fsm:  &'a Fsm,
    pub time: f32,
}

fn resolve_state(states: &FxHashMap<String, StateId>, name: &str, context: &str) -> BuildResult<StateId> {
    states.get(name).copied().ok_or_else(|| BuildError::UnknownState {
        name:    name.to_owned(),
        context: context.to_owned(),
    })
}

// ── Triggers ──────────────────────────────────────────────────────────────────

pub trait EventTrigger: Send + Sync {
    /// Evaluated once per step; may update internal edge-detection state.
    fn fires(&mut self, view: &EventView<'_>) -> bool;

    fn connect(&mut self, _states: &FxHashMap<String, StateId>) -> BuildResult<()> {
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PopulationMode {
    /// Population grew since the last evaluation.
    OnIncrease,
    /// Population shrank since the last evaluation.
    OnDecrease,
    /// Every step the population is above the threshold.
    WhileHigher,
    /// Every step the population is below the threshold.
    WhileLower,
    /// The population crossed the threshold going up.
    RiseTo,
    /// The population crossed the threshold going down.
    DropTo,
}

impl std::str::FromStr for PopulationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "on_increase" => PopulationMode::OnIncrease,
            "on_decrease" => PopulationMode::OnDecrease,
            "while_higher" => PopulationMode::WhileHigher,
            "while_lower" => PopulationMode::WhileLower,
            "rise_to" => PopulationMode::RiseTo,
            "drop_to" => PopulationMode::DropTo,
            other => return Err(format!("unknown population mode {other:?}")),
        })
    }
}

/// Fires on the population of one state.
///
/// The first evaluation only records the population; edge modes need a
/// previous value to compare against.
#[derive(Debug)]
pub struct StatePopulationTrigger {
    state_name: String,
    state:      StateId,
    mode:       PopulationMode,
    threshold:  usize,
    last:       Option<usize>,
}

impl StatePopulationTrigger {
    pub fn new(state: impl Into<String>, mode: PopulationMode, threshold: usize) -> Self {
        Self {
            state_name: state.into(),
            state: StateId::INVALID,
            mode,
            threshold,
            last: None,
        }
    }
}

impl EventTrigger for StatePopulationTrigger {
    fn fires(&mut self, view: &EventView<'_>) -> bool {
        let pop = view.fsm.state_population(self.state);
        let last = self.last.replace(pop);
        let t = self.threshold;
        match self.mode {
            PopulationMode::WhileHigher => pop > t,
            PopulationMode::WhileLower => pop < t,
            PopulationMode::OnIncrease => last.is_some_and(|l| pop > l),
            PopulationMode::OnDecrease => last.is_some_and(|l| pop < l),
            PopulationMode::RiseTo => last.is_some_and(|l| l < t && pop >= t),
            PopulationMode::DropTo => last.is_some_and(|l| l > t && pop <= t),
        }
    }

    fn connect(&mut self, states: &FxHashMap<String, StateId>) -> BuildResult<()> {
        self.state = resolve_state(states, &self.state_name, "state_population trigger")?;
        Ok(())
    }
}

/// Fires once at `at`, then every `period` seconds if one is given.
#[derive(Debug)]
pub struct TimeTrigger {
    next:   f32,
    period: Option<f32>,
}

impl TimeTrigger {
    pub fn new(at: f32, period: Option<f32>) -> Self {
        Self { next: at, period: period.filter(|p| *p > 0.0) }
    }
}

impl EventTrigger for TimeTrigger {
    fn fires(&mut self, view: &EventView<'_>) -> bool {
        if view.time < self.next {
            return false;
        }
        self.next = match self.period {
            Some(p) => {
                let mut next = self.next + p;
                while next <= view.time {
                    next += p;
                }
                next
            }
            None => f32::INFINITY,
        };
        true
    }
}

// ── Targets ───────────────────────────────────────────────────────────────────

pub trait EventTarget: Send + Sync {
    fn kind(&self) -> TargetKind;

    /// Recompute the operand set; called right before an effect is applied.
    fn update(&mut self, fsm: &Fsm, agents: &AgentStore);

    fn agents(&self) -> &[AgentId];

    fn connect(&mut self, _states: &FxHashMap<String, StateId>) -> BuildResult<()> {
        Ok(())
    }
}

/// Agents currently in (or, with `inside = false`, not in) one state.
#[derive(Debug)]
pub struct StateMemberTarget {
    state_name: String,
    state:      StateId,
    inside:     bool,
    members:    Vec<AgentId>,
}

impl StateMemberTarget {
    pub fn new(state: impl Into<String>, inside: bool) -> Self {
        Self { state_name: state.into(), state: StateId::INVALID, inside, members: Vec::new() }
    }
}

impl EventTarget for StateMemberTarget {
    fn kind(&self) -> TargetKind {
        TargetKind::Agents
    }

    fn update(&mut self, fsm: &Fsm, agents: &AgentStore) {
        self.members.clear();
        self.members.extend(
            agents
                .agent_ids()
                .filter(|&id| (fsm.get_agent_state_id(id) == Some(self.state)) == self.inside),
        );
    }

    fn agents(&self) -> &[AgentId] {
        &self.members
    }

    fn connect(&mut self, states: &FxHashMap<String, StateId>) -> BuildResult<()> {
        self.state = resolve_state(states, &self.state_name, "state_member target")?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct AllAgentsTarget {
    members: Vec<AgentId>,
}

impl EventTarget for AllAgentsTarget {
    fn kind(&self) -> TargetKind {
        TargetKind::Agents
    }

    fn update(&mut self, _: &Fsm, agents: &AgentStore) {
        self.members.clear();
        self.members.extend(agents.agent_ids());
    }

    fn agents(&self) -> &[AgentId] {
        &self.members
    }
}

// ── Effects ───────────────────────────────────────────────────────────────────

pub trait EventEffect: Send + Sync {
    fn target_kind(&self) -> TargetKind;

    fn is_compatible(&self, target: &dyn EventTarget) -> bool {
        self.target_kind() == target.kind()
    }

    /// Apply to every operand of `target`.  Returns how many operands failed.
    fn apply(
        &self,
        target: &dyn EventTarget,
        fsm: &mut Fsm,
        agents: &mut AgentStore,
        rngs: &mut AgentRngs,
        clock: &SimClock,
    ) -> usize;

    fn connect(&mut self, _states: &FxHashMap<String, StateId>) -> BuildResult<()> {
        Ok(())
    }
}

/// Move the target agents into a state.  With `force_reentry`, agents
/// already there leave and enter it again.
#[derive(Debug)]
pub struct ChangeStateEffect {
    state_name:    String,
    state:         StateId,
    force_reentry: bool,
}

impl ChangeStateEffect {
    pub fn new(state: impl Into<String>, force_reentry: bool) -> Self {
        Self { state_name: state.into(), state: StateId::INVALID, force_reentry }
    }
}

impl EventEffect for ChangeStateEffect {
    fn target_kind(&self) -> TargetKind {
        TargetKind::Agents
    }

    fn apply(
        &self,
        target: &dyn EventTarget,
        fsm: &mut Fsm,
        agents: &mut AgentStore,
        rngs: &mut AgentRngs,
        clock: &SimClock,
    ) -> usize {
        let mut failed = 0;
        for &agent in target.agents() {
            if let Err(e) = fsm.force_state(agent, self.state, self.force_reentry, agents, rngs, clock) {
                tracing::error!(%agent, error = %e, "change_state effect failed");
                failed += 1;
            }
        }
        failed
    }

    fn connect(&mut self, states: &FxHashMap<String, StateId>) -> BuildResult<()> {
        self.state = resolve_state(states, &self.state_name, "change_state effect")?;
        Ok(())
    }
}

/// Set, offset or scale one property of every target agent.
#[derive(Debug)]
pub struct PropertyEffect {
    manipulator: AgentPropertyManipulator,
}

impl PropertyEffect {
    pub fn new(manipulator: AgentPropertyManipulator) -> Self {
        Self { manipulator }
    }
}

impl EventEffect for PropertyEffect {
    fn target_kind(&self) -> TargetKind {
        TargetKind::Agents
    }

    fn apply(
        &self,
        target: &dyn EventTarget,
        _: &mut Fsm,
        agents: &mut AgentStore,
        rngs: &mut AgentRngs,
        _: &SimClock,
    ) -> usize {
        let mut failed = 0;
        for &id in target.agents() {
            let (Some(mut agent), Some(rng)) = (agents.agent_mut(id), rngs.get_mut(id))
            else {
                tracing::error!(agent = %id, "property effect target is not a live agent");
                failed += 1;
                continue;
            };
            self.manipulator.apply(&mut agent, rng);
        }
        failed
    }
}

// ── EventSystem ───────────────────────────────────────────────────────────────

struct Event {
    name:      String,
    trigger:   Box<dyn EventTrigger>,
    /// `(effect index, target index)` pairs.
    responses: Vec<(usize, usize)>,
}

/// Named targets and effects plus the events that use them.
#[derive(Default)]
pub struct EventSystem {
    targets: Vec<(String, Box<dyn EventTarget>)>,
    effects: Vec<(String, Box<dyn EventEffect>)>,
    events:  Vec<Event>,
}

impl EventSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn add_target(&mut self, name: impl Into<String>, target: Box<dyn EventTarget>) -> BuildResult<()> {
        let name = name.into();
        if self.targets.iter().any(|(n, _)| *n == name) {
            return Err(BuildError::Event(format!("event target {name:?} is defined more than once")));
        }
        self.targets.push((name, target));
        Ok(())
    }

    pub fn add_effect(&mut self, name: impl Into<String>, effect: Box<dyn EventEffect>) -> BuildResult<()> {
        let name = name.into();
        if self.effects.iter().any(|(n, _)| *n == name) {
            return Err(BuildError::Event(format!("event effect {name:?} is defined more than once")));
        }
        self.effects.push((name, effect));
        Ok(())
    }

    /// Register an event.  `responses` are `(effect name, target name)`
    /// pairs; both must already be registered and compatible.
    pub fn add_event(
        &mut self,
        name: impl Into<String>,
        trigger: Box<dyn EventTrigger>,
        responses: impl IntoIterator<Item = (String, String)>,
    ) -> BuildResult<()> {
        let name = name.into();
        let mut resolved = Vec::new();
        for (effect, target) in responses {
            let e = self.effects.iter().position(|(n, _)| *n == effect).ok_or_else(|| {
                BuildError::Event(format!("event {name:?} names unknown effect {effect:?}"))
            })?;
            let t = self.targets.iter().position(|(n, _)| *n == target).ok_or_else(|| {
                BuildError::Event(format!("event {name:?} names unknown target {target:?}"))
            })?;
            if !self.effects[e].1.is_compatible(self.targets[t].1.as_ref()) {
                return Err(BuildError::Event(format!(
                    "event {name:?}: effect {effect:?} cannot act on target {target:?} ({})",
                    self.targets[t].1.kind()
                )));
            }
            resolved.push((e, t));
        }
        self.events.push(Event { name, trigger, responses: resolved });
        Ok(())
    }

    /// Resolve state names in every trigger, target and effect.
    pub fn connect(&mut self, states: &FxHashMap<String, StateId>) -> BuildResult<()> {
        for (_, target) in &mut self.targets {
            target.connect(states)?;
        }
        for (_, effect) in &mut self.effects {
            effect.connect(states)?;
        }
        for event in &mut self.events {
            event.trigger.connect(states)?;
        }
        Ok(())
    }

    /// Test every trigger and apply the responses of those that fire.
    /// Returns how many agent operands failed; failures never stop the
    /// remaining responses.
    pub fn evaluate(
        &mut self,
        fsm: &mut Fsm,
        agents: &mut AgentStore,
        rngs: &mut AgentRngs,
        clock: &SimClock,
    ) -> usize {
        let EventSystem { targets, effects, events } = self;
        let mut failed = 0;
        for event in events.iter_mut() {
            let fired = event.trigger.fires(&EventView { fsm: &*fsm, time: clock.time });
            if !fired {
                continue;
            }
            tracing::debug!(event = %event.name, time = clock.time, "event fired");
            for &(e, t) in &event.responses {
                let (target_name, target) = &mut targets[t];
                let (effect_name, effect) = &effects[e];
                target.update(fsm, agents);
                if !effect.is_compatible(target.as_ref()) {
                    tracing::error!(
                        event = %event.name,
                        effect = %effect_name,
                        target = %target_name,
                        "incompatible event response skipped"
                    );
                    continue;
                }
                failed += effect.apply(target.as_ref(), fsm, agents, rngs, clock);
            }
        }
        failed
    }
}
