//! A single goal: a region an agent can be sent to.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use bfsm_core::{AgentId, GoalId, GoalSetId, Shape, sync};
use glam::Vec2;

use crate::goal_set::Ledger;
use crate::{GoalError, GoalResult};

/// A capacity-bounded, weighted target region.
///
/// A goal either belongs to a [`GoalSet`](crate::GoalSet) (it then shares the
/// set's availability ledger) or is ephemeral: synthesized by a selector for a
/// single agent, unbounded, and dropped once the agent leaves it.
#[derive(Debug)]
pub struct Goal {
    id:         GoalId,
    set:        GoalSetId,
    shape:      Shape,
    weight:     f32,
    capacity:   usize,
    population: AtomicUsize,
    ledger:     Option<Arc<RwLock<Ledger>>>,
}

impl Goal {
    /// A goal with unbounded capacity and weight 1.  It becomes part of a set
    /// through [`GoalSet::add_goal`](crate::GoalSet::add_goal).
    pub fn new(id: GoalId, shape: Shape) -> Self {
        Self {
            id,
            set: GoalSetId::INVALID,
            shape,
            weight: 1.0,
            capacity: usize::MAX,
            population: AtomicUsize::new(0),
            ledger: None,
        }
    }

    /// A per-agent goal that belongs to no set.
    pub fn ephemeral(shape: Shape) -> Self {
        Self::new(GoalId::INVALID, shape)
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight.max(0.0);
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub(crate) fn attach(&mut self, set: GoalSetId, id: GoalId, ledger: Arc<RwLock<Ledger>>) {
        self.set = set;
        self.id = id;
        self.ledger = Some(ledger);
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn id(&self) -> GoalId {
        self.id
    }

    /// Owning set; `GoalSetId::INVALID` for ephemeral goals.
    #[inline]
    pub fn set_id(&self) -> GoalSetId {
        self.set
    }

    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[inline]
    pub fn weight(&self) -> f32 {
        self.weight
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn population(&self) -> usize {
        self.population.load(Ordering::Acquire)
    }

    #[inline]
    pub fn has_capacity(&self) -> bool {
        self.population() < self.capacity
    }

    #[inline]
    pub fn is_ephemeral(&self) -> bool {
        self.ledger.is_none()
    }

    // ── Geometry ──────────────────────────────────────────────────────────

    #[inline]
    pub fn squared_distance(&self, p: Vec2) -> f32 {
        self.shape.squared_distance(p)
    }

    #[inline]
    pub fn nearest_point(&self, p: Vec2) -> Vec2 {
        self.shape.nearest_point(p)
    }

    #[inline]
    pub fn centroid(&self) -> Vec2 {
        self.shape.centroid()
    }

    // ── Population ────────────────────────────────────────────────────────

    /// Count `agent` into this goal.
    ///
    /// The population check, the increment and (on reaching capacity) the
    /// removal from the set's available list all happen under one write lock
    /// on the ledger.  A full goal rejects the agent and is left unchanged.
    pub fn assign(&self, agent: AgentId) -> GoalResult<()> {
        let mut ledger = self.ledger.as_deref().map(sync::write);

        let pop = self.population.load(Ordering::Acquire);
        if pop >= self.capacity {
            tracing::debug!(%agent, goal = %self.id, set = %self.set, "goal full");
            return Err(GoalError::AtCapacity { set: self.set, goal: self.id });
        }
        self.population.store(pop + 1, Ordering::Release);

        if pop + 1 == self.capacity {
            if let Some(ledger) = ledger.as_mut() {
                ledger.set_full(self.id, self.weight);
            }
        }
        Ok(())
    }

    /// Mirror of [`assign`](Self::assign): count one agent out, and put the
    /// goal back on the available list if it was full.
    pub fn free(&self) {
        let mut ledger = self.ledger.as_deref().map(sync::write);

        let pop = self.population.load(Ordering::Acquire);
        if pop == 0 {
            tracing::warn!(goal = %self.id, set = %self.set, "freeing a goal with no population");
            return;
        }
        self.population.store(pop - 1, Ordering::Release);

        if pop == self.capacity {
            if let Some(ledger) = ledger.as_mut() {
                ledger.set_available(self.id, self.weight);
            }
        }
    }
}
