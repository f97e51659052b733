//! Goal and goal-selection error types.  Both are recoverable per agent:
//! the state that triggered them turns them into a per-agent failure.

use thiserror::Error;

use bfsm_core::{AgentId, GoalId, GoalSetId};

#[derive(Debug, Error)]
pub enum GoalError {
    #[error("goal {goal} in {set} is at capacity")]
    AtCapacity { set: GoalSetId, goal: GoalId },

    #[error("goal {goal} not found in {set}")]
    UnknownGoal { set: GoalSetId, goal: GoalId },

    #[error("goal set {0} not found")]
    UnknownGoalSet(GoalSetId),

    #[error("goal {goal} already defined in {set}")]
    DuplicateGoal { set: GoalSetId, goal: GoalId },
}

pub type GoalResult<T> = Result<T, GoalError>;

#[derive(Debug, Error)]
pub enum GoalSelectorError {
    #[error("{selector} selector found no goal for {agent}")]
    NoGoal { agent: AgentId, selector: &'static str },

    #[error("{selector} selector could not assign a goal to {agent}: {source}")]
    Assign {
        agent:    AgentId,
        selector: &'static str,
        #[source]
        source:   GoalError,
    },

    #[error("shared selector placeholder (source state {source_state:?}) was called at runtime")]
    Placeholder { source_state: String },
}
