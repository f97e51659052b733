//! Behavior-layer error types.
//!
//! | Type         | Scope                                                     |
//! |--------------|-----------------------------------------------------------|
//! | `StateError` | one agent; logged and counted by the FSM                  |
//! | `TaskError`  | one task; `Recoverable` skips it, `Fatal` aborts the step |
//! | `FsmError`   | the whole step; the simulation is unusable afterwards     |
//! | `BuildError` | construction; no FSM is produced                          |

use thiserror::Error;

use bfsm_agent::AgentError;
use bfsm_core::{AgentId, CoreError, GoalSetId, StateId};
use bfsm_goals::{GoalError, GoalSelectorError};

#[derive(Debug, Error)]
pub enum StateError {
    #[error("state {state:?}: {source}")]
    Goal {
        state:  String,
        #[source]
        source: GoalSelectorError,
    },

    #[error("state {state:?} has no goal recorded for {agent}")]
    MissingGoal { state: String, agent: AgentId },

    #[error("{agent} is not in a valid state ({state})")]
    NotInState { agent: AgentId, state: StateId },
}

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("{0}")]
    Recoverable(String),

    #[error("{0}")]
    Fatal(String),
}

#[derive(Debug, Error)]
pub enum FsmError {
    #[error("{failed} agent(s) failed during the step")]
    AgentsFailed { failed: usize },

    #[error("task {task} failed fatally: {reason}")]
    TaskFatal { task: String, reason: String },

    #[error("{what} length {got} does not match agent count {expected}")]
    AgentCountMismatch {
        expected: usize,
        got:      usize,
        what:     &'static str,
    },

    #[error("unknown state {0}")]
    UnknownState(StateId),

    #[error("unknown agent {0}")]
    UnknownAgent(AgentId),

    #[error(transparent)]
    State(#[from] StateError),
}

pub type FsmResult<T> = Result<T, FsmError>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("behavior defines no states")]
    NoStates,

    #[error("state name {0:?} is defined more than once")]
    DuplicateState(String),

    #[error("unknown state {name:?} referenced by {context}")]
    UnknownState { name: String, context: String },

    #[error("state {state:?} shares the selector of {source_state:?}, which has no selector of its own")]
    UnresolvedSharedSelector { state: String, source_state: String },

    #[error("goal set {set} referenced by {context} does not exist")]
    UnknownGoalSet { set: GoalSetId, context: String },

    #[error("goal set {0} is defined more than once")]
    DuplicateGoalSet(GoalSetId),

    #[error("unknown {category} type {kind:?}")]
    UnknownElement { category: &'static str, kind: String },

    #[error("{kind}: parameter {key:?} {reason}")]
    Param { kind: String, key: String, reason: String },

    #[error("event configuration: {0}")]
    Event(String),

    #[error("initial state for {agent}: {source}")]
    Initialization {
        agent:  AgentId,
        #[source]
        source: StateError,
    },

    #[error(transparent)]
    Fsm(#[from] FsmError),

    #[error("agent store has {store} agents but {rngs} RNG streams were supplied")]
    AgentCountMismatch { store: usize, rngs: usize },

    #[error(transparent)]
    Goal(#[from] GoalError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type BuildResult<T> = Result<T, BuildError>;
