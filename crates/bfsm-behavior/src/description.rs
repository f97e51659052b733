//! The in-memory behavior description consumed by [`build_fsm`](crate::build_fsm).
//!
//! A description is produced by the TOML loader or assembled directly in
//! code.  Every element in it is already constructed; building the FSM only
//! wires them together.

use bfsm_goals::{GoalSelector, GoalSet, GoalSets};
use rustc_hash::FxHashMap;

use crate::{
    Action, BuildError, BuildResult, EventSystem, Task, Transition, VelComponent, VelModifier,
};

pub struct StateDescription {
    pub name:          String,
    pub is_final:      bool,
    /// `None` keeps the agent still.
    pub vel_component: Option<Box<dyn VelComponent>>,
    pub actions:       Vec<Box<dyn Action>>,
    /// `None` gives every agent a goal at its own position.
    pub goal_selector: Option<Box<dyn GoalSelector>>,
    pub persistent:    bool,
    pub vel_modifiers: Vec<Box<dyn VelModifier>>,
}

impl StateDescription {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name:          name.into(),
            is_final:      false,
            vel_component: None,
            actions:       Vec::new(),
            goal_selector: None,
            persistent:    false,
            vel_modifiers: Vec::new(),
        }
    }

    pub fn final_state(mut self, is_final: bool) -> Self {
        self.is_final = is_final;
        self
    }

    pub fn velocity(mut self, component: Box<dyn VelComponent>) -> Self {
        self.vel_component = Some(component);
        self
    }

    pub fn action(mut self, action: Box<dyn Action>) -> Self {
        self.actions.push(action);
        self
    }

    pub fn selector(mut self, selector: Box<dyn GoalSelector>) -> Self {
        self.goal_selector = Some(selector);
        self
    }

    pub fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    pub fn vel_modifier(mut self, modifier: Box<dyn VelModifier>) -> Self {
        self.vel_modifiers.push(modifier);
        self
    }
}

#[derive(Default)]
pub struct BehaviorDescription {
    pub states:           Vec<StateDescription>,
    /// `(source state name, transition)`, in declaration order.
    pub transitions:      Vec<(String, Transition)>,
    pub goal_sets:        GoalSets,
    pub tasks:            Vec<Box<dyn Task>>,
    /// Applied to every agent after its state's own modifiers.
    pub vel_modifiers:    Vec<Box<dyn VelModifier>>,
    pub events:           EventSystem,
    /// Starting state for agents without a class entry.  Defaults to the
    /// first declared state.
    pub initial_state:    Option<String>,
    pub initial_by_class: FxHashMap<u32, String>,
}

impl BehaviorDescription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_state(&mut self, state: StateDescription) {
        self.states.push(state);
    }

    /// Add `transition` leaving every state in `from`.  Each source gets its
    /// own deep copy so per-agent caches never collide.
    pub fn add_transition<S: Into<String>>(
        &mut self,
        from: impl IntoIterator<Item = S>,
        transition: Transition,
    ) {
        let mut sources: Vec<String> = from.into_iter().map(Into::into).collect();
        let Some(last) = sources.pop() else {
            return;
        };
        for source in sources {
            self.transitions.push((source, transition.copy()));
        }
        self.transitions.push((last, transition));
    }

    pub fn add_goal_set(&mut self, set: GoalSet) -> BuildResult<()> {
        self.goal_sets
            .insert(set)
            .map_err(|set| BuildError::DuplicateGoalSet(set.id()))
    }

    pub fn add_task(&mut self, task: Box<dyn Task>) {
        self.tasks.push(task);
    }

    pub fn add_vel_modifier(&mut self, modifier: Box<dyn VelModifier>) {
        self.vel_modifiers.push(modifier);
    }
}
