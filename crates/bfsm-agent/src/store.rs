//! Agent storage: `AgentStore` (per-agent arrays) and `AgentRngs` (per-agent RNG).
//!
//! # Why split the arrays?
//!
//! The parallel decision phase reads every agent's body (a proximity
//! condition looks at *other* agents' positions) while each iteration writes
//! only its own properties, its own preferred velocity and its own RNG.
//! Keeping those in separate `Vec`s lets the FSM borrow `&[AgentBody]` shared
//! and zip `&mut` slices of the rest without any locking:
//!
//! ```ignore
//! let (bodies, props, prefs) = store.decision_split();
//! props.par_iter_mut()
//!     .zip(prefs.par_iter_mut())
//!     .zip(rngs.inner.par_iter_mut())
//!     .enumerate()
//!     .for_each(|(i, ((props, pref), rng))| { /* advance agent i */ });
//! ```

use bfsm_core::{AgentId, AgentRng};
use glam::Vec2;

use crate::{AgentProperties, PrefVelocity};

// ── AgentRngs ─────────────────────────────────────────────────────────────────

/// Per-agent deterministic RNG state, kept apart from [`AgentStore`] so the
/// decision phase can hold `&mut` to both at once.
pub struct AgentRngs {
    pub inner: Vec<AgentRng>,
    seed:      u64,
}

impl AgentRngs {
    /// Allocate and seed `count` per-agent RNGs from `global_seed`.
    pub fn new(count: usize, global_seed: u64) -> Self {
        let inner = (0..count as u32)
            .map(|i| AgentRng::new(global_seed, AgentId(i)))
            .collect();
        Self { inner, seed: global_seed }
    }

    /// `None` for an id outside the population.
    #[inline]
    pub fn get_mut(&mut self, agent: AgentId) -> Option<&mut AgentRng> {
        self.inner.get_mut(agent.index())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Grow or shrink to `count`.  Existing streams are untouched; new agents
    /// get the stream they would have had if they had been present from the
    /// start.
    pub fn resize(&mut self, count: usize) {
        if count <= self.inner.len() {
            self.inner.truncate(count);
            return;
        }
        let seed = self.seed;
        let from = self.inner.len() as u32;
        self.inner
            .extend((from..count as u32).map(|i| AgentRng::new(seed, AgentId(i))));
    }
}

// ── AgentBody ─────────────────────────────────────────────────────────────────

/// Kinematic state of one agent.  Read-only while behaviors are evaluated;
/// the simulator writes it during motion integration.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgentBody {
    pub pos:    Vec2,
    pub vel:    Vec2,
    /// Facing direction (unit vector).
    pub orient: Vec2,
    /// Population class tag, used to pick the initial state.
    pub class:  u32,
}

impl Default for AgentBody {
    fn default() -> Self {
        Self { pos: Vec2::ZERO, vel: Vec2::ZERO, orient: Vec2::X, class: 0 }
    }
}

impl AgentBody {
    pub fn at(pos: Vec2) -> Self {
        Self { pos, ..Self::default() }
    }
}

// ── Agent view ────────────────────────────────────────────────────────────────

/// Borrowed view of one agent as behavior elements see it: its body
/// (read-only) and its mutable scalar properties.
pub struct Agent<'a> {
    pub id:    AgentId,
    pub body:  &'a AgentBody,
    pub props: &'a mut AgentProperties,
}

impl Agent<'_> {
    #[inline]
    pub fn pos(&self) -> Vec2 {
        self.body.pos
    }

    #[inline]
    pub fn class(&self) -> u32 {
        self.body.class
    }
}

// ── AgentStore ────────────────────────────────────────────────────────────────

/// Per-agent arrays.  Every `Vec` has exactly `count` elements and the
/// `AgentId` value indexes all of them.
#[derive(Clone, Debug, Default)]
pub struct AgentStore {
    /// Number of agents.  Equals the length of every `Vec`.
    pub count: usize,

    pub bodies: Vec<AgentBody>,

    /// Scalar properties; actions and event effects write these.
    pub props: Vec<AgentProperties>,

    /// Output of the decision phase, consumed by the motion model.
    pub pref_velocity: Vec<PrefVelocity>,
}

impl AgentStore {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Iterator over all `AgentId`s in ascending index order.
    pub fn agent_ids(&self) -> impl Iterator<Item = AgentId> + '_ {
        (0..self.count as u32).map(AgentId)
    }

    /// Append an agent and return its id.
    pub fn push(&mut self, body: AgentBody, props: AgentProperties) -> AgentId {
        let id = AgentId(self.count as u32);
        self.bodies.push(body);
        self.props.push(props);
        self.pref_velocity.push(PrefVelocity::default());
        self.count += 1;
        id
    }

    /// Mutable view of one agent; `None` if `id` is out of range.
    pub fn agent_mut(&mut self, id: AgentId) -> Option<Agent<'_>> {
        let i = id.index();
        let body = self.bodies.get(i)?;
        let props = self.props.get_mut(i)?;
        Some(Agent { id, body, props })
    }

    /// Borrow the arrays the decision phase needs: shared bodies, exclusive
    /// properties and preferred-velocity slots.
    pub fn decision_split(&mut self) -> (&[AgentBody], &mut [AgentProperties], &mut [PrefVelocity]) {
        (&self.bodies, &mut self.props, &mut self.pref_velocity)
    }
}
