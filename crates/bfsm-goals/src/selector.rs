//! The goal-selection contract and the per-state slot that wraps a policy.
//!
//! # Two layers
//!
//! [`GoalSelector`] is the policy: given an agent, propose a goal.  It knows
//! nothing about population or persistence.
//!
//! [`SelectorSlot`] is what a state actually holds.  It owns one policy and
//! adds the bookkeeping every policy shares: claiming the proposed goal
//! (`Goal::assign`), remembering it for persistent selectors, and freeing it
//! again on leave.  Two states that share a selector share the same
//! `Arc<SelectorSlot>`.
//!
//! # Claiming under contention
//!
//! A policy proposes a goal while holding its set's read lock; the claim
//! needs the write lock, so it happens after the scan has released it.  If
//! another agent filled the goal in between, the claim fails with
//! `AtCapacity` and the slot asks the policy again, up to
//! `MAX_CLAIM_RETRIES` times.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use bfsm_agent::Agent;
use bfsm_core::{AgentId, AgentRng, GoalSetId, sync};
use rustc_hash::FxHashMap;

use crate::{Goal, GoalError, GoalSelectorError, GoalSets, NavMeshLocalizer};

const MAX_CLAIM_RETRIES: usize = 8;

/// What a selector may consult besides the agent itself.
#[derive(Copy, Clone)]
pub struct SelectionContext<'a> {
    pub goal_sets: &'a GoalSets,
}

// ── GoalSelector trait ────────────────────────────────────────────────────────

/// A goal-selection policy.
///
/// # Thread safety
///
/// Selectors are shared by every agent evaluated in the parallel phase, so
/// implementations must be `Send + Sync`.  Per-agent randomness comes from
/// the agent's own `AgentRng`.
pub trait GoalSelector: Send + Sync {
    /// Registry name of the policy (used in diagnostics).
    fn name(&self) -> &'static str;

    /// Propose a goal for `agent`; `None` when nothing is available.
    fn get_goal(
        &self,
        agent: &Agent<'_>,
        ctx: &SelectionContext<'_>,
        rng: &mut AgentRng,
    ) -> Option<Arc<Goal>>;

    /// The goal set this policy draws from, if any.
    fn goal_set(&self) -> Option<GoalSetId> {
        None
    }

    /// For the shared-selector placeholder: the state whose selector should
    /// be used instead.
    fn shared_source(&self) -> Option<&str> {
        None
    }

    /// Localizer this policy reads, so its refresh task can be scheduled.
    fn nav_mesh_localizer(&self) -> Option<&Arc<NavMeshLocalizer>> {
        None
    }
}

// ── SelectorSlot ──────────────────────────────────────────────────────────────

pub struct SelectorSlot {
    selector:   Box<dyn GoalSelector>,
    persistent: AtomicBool,
    assigned:   RwLock<FxHashMap<AgentId, Arc<Goal>>>,
}

impl SelectorSlot {
    pub fn new(selector: Box<dyn GoalSelector>) -> Self {
        Self {
            selector,
            persistent: AtomicBool::new(false),
            assigned: RwLock::new(FxHashMap::default()),
        }
    }

    /// Builder form of [`set_persistent`](Self::set_persistent).
    pub fn persistent(self, persistent: bool) -> Self {
        self.set_persistent(persistent);
        self
    }

    /// A persistent slot keeps an agent's goal across leave/enter and hands
    /// the same goal back without selecting again.
    pub fn set_persistent(&self, persistent: bool) {
        self.persistent.store(persistent, Ordering::Release);
    }

    #[inline]
    pub fn is_persistent(&self) -> bool {
        self.persistent.load(Ordering::Acquire)
    }

    #[inline]
    pub fn selector(&self) -> &dyn GoalSelector {
        self.selector.as_ref()
    }

    /// Goal this slot is holding for `agent` (persistent slots only).
    pub fn assigned_goal(&self, agent: AgentId) -> Option<Arc<Goal>> {
        sync::read(&self.assigned).get(&agent).cloned()
    }

    /// Select and claim a goal for `agent`.
    pub fn assign_goal(
        &self,
        agent: &Agent<'_>,
        ctx: &SelectionContext<'_>,
        rng: &mut AgentRng,
    ) -> Result<Arc<Goal>, GoalSelectorError> {
        let persistent = self.is_persistent();
        if persistent {
            if let Some(goal) = self.assigned_goal(agent.id) {
                return Ok(goal);
            }
        }

        if let Some(source) = self.selector.shared_source() {
            tracing::error!(agent = %agent.id, source, "shared selector placeholder invoked");
            return Err(GoalSelectorError::Placeholder { source_state: source.to_owned() });
        }

        let name = self.selector.name();
        let mut attempt = 0;
        loop {
            let Some(goal) = self.selector.get_goal(agent, ctx, rng) else {
                tracing::warn!(agent = %agent.id, selector = name, "no goal available");
                return Err(GoalSelectorError::NoGoal { agent: agent.id, selector: name });
            };

            match goal.assign(agent.id) {
                Ok(()) => {
                    if persistent {
                        sync::write(&self.assigned).insert(agent.id, Arc::clone(&goal));
                    }
                    return Ok(goal);
                }
                Err(GoalError::AtCapacity { .. }) if attempt < MAX_CLAIM_RETRIES => {
                    attempt += 1;
                }
                Err(source) => {
                    tracing::warn!(agent = %agent.id, selector = name, %source, "goal assignment failed");
                    return Err(GoalSelectorError::Assign { agent: agent.id, selector: name, source });
                }
            }
        }
    }

    /// Release `goal` for `agent`.  Persistent slots keep the claim.
    pub fn free_goal(&self, _agent: AgentId, goal: &Goal) {
        if !self.is_persistent() {
            goal.free();
        }
    }
}
