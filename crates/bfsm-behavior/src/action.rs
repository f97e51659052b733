//! State-entry side effects.

use bfsm_agent::Agent;
use bfsm_core::AgentRng;

use crate::{AgentPropertyManipulator, Task};

/// An effect applied when an agent enters a state.
///
/// `on_leave` is fixed: first [`reset_action`](Action::reset_action), which
/// undoes the entry effect if the action was configured to, then
/// [`leave_action`](Action::leave_action), which always runs.
pub trait Action: Send + Sync {
    fn on_enter(&self, agent: &mut Agent<'_>, rng: &mut AgentRng);

    /// Take back `on_enter` after the state failed to admit the agent.
    fn undo_enter(&self, agent: &mut Agent<'_>) {
        self.reset_action(agent);
    }

    fn reset_action(&self, _agent: &mut Agent<'_>) {}

    fn leave_action(&self, _agent: &mut Agent<'_>) {}

    fn on_leave(&self, agent: &mut Agent<'_>) {
        self.reset_action(agent);
        self.leave_action(agent);
    }

    fn tasks(&self) -> Vec<Box<dyn Task>> {
        Vec::new()
    }
}

/// Set, offset or scale one agent property on entry; optionally restore it
/// on exit.
#[derive(Debug)]
pub struct PropertyAction {
    manipulator:  AgentPropertyManipulator,
    undo_on_exit: bool,
}

impl PropertyAction {
    pub fn new(manipulator: AgentPropertyManipulator, undo_on_exit: bool) -> Self {
        Self { manipulator, undo_on_exit }
    }

    pub fn manipulator(&self) -> &AgentPropertyManipulator {
        &self.manipulator
    }
}

impl Action for PropertyAction {
    fn on_enter(&self, agent: &mut Agent<'_>, rng: &mut AgentRng) {
        self.manipulator.manipulate(agent, rng);
    }

    fn undo_enter(&self, agent: &mut Agent<'_>) {
        self.manipulator.restore(agent);
    }

    fn reset_action(&self, agent: &mut Agent<'_>) {
        if self.undo_on_exit {
            self.manipulator.restore(agent);
        }
    }
}
