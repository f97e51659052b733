//! Per-step work items run after every agent has advanced.
//!
//! Any element may ask for a task (a nav-mesh selector needs its localizer
//! refreshed, say).  The FSM keeps one copy of each: a task is only added if
//! no already-registered task reports itself equivalent.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use bfsm_agent::AgentStore;
use bfsm_goals::NavMeshLocalizer;

use crate::{Fsm, TaskError};

/// What a task may look at while it runs.  Tasks run sequentially, after
/// the decision phase and the simulator's motion step.
pub struct TaskContext<'a> {
    pub fsm:    &'a Fsm,
    pub agents: &'a AgentStore,
    pub time:   f32,
}

/// A deduplicated per-step work item.
///
/// # Errors
///
/// `TaskError::Recoverable` is logged and the task is skipped for this step.
/// `TaskError::Fatal` stops task execution and fails the step.
pub trait Task: Send + Sync + fmt::Display {
    fn do_work(&self, ctx: &TaskContext<'_>) -> Result<(), TaskError>;

    /// `true` if `other` would do the same work as `self`.
    fn is_equivalent(&self, other: &dyn Task) -> bool;

    fn as_any(&self) -> &dyn Any;
}

// ── NavMeshLocalizerTask ──────────────────────────────────────────────────────

/// Re-locates every agent on a nav mesh once per step.  Two tasks are
/// equivalent when they refresh the same localizer instance.
pub struct NavMeshLocalizerTask {
    localizer: Arc<NavMeshLocalizer>,
}

impl NavMeshLocalizerTask {
    pub fn new(localizer: Arc<NavMeshLocalizer>) -> Self {
        Self { localizer }
    }
}

impl Task for NavMeshLocalizerTask {
    fn do_work(&self, ctx: &TaskContext<'_>) -> Result<(), TaskError> {
        let agents = ctx.agents;
        let lost = self
            .localizer
            .refresh(agents.agent_ids().map(|id| (id, agents.bodies[id.index()].pos)));
        if lost > 0 {
            tracing::debug!(lost, "agents off the navigation mesh keep their last node");
        }
        Ok(())
    }

    fn is_equivalent(&self, other: &dyn Task) -> bool {
        other
            .as_any()
            .downcast_ref::<NavMeshLocalizerTask>()
            .is_some_and(|o| Arc::ptr_eq(&o.localizer, &self.localizer))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for NavMeshLocalizerTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("nav mesh localizer refresh")
    }
}
