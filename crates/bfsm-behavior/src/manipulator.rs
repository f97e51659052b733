//! Reversible writes to an agent's scalar properties.
//!
//! One manipulator keeps at most one pending undo value per agent.  A second
//! `manipulate` before `restore` replaces the saved value, so the original is
//! lost; this is logged at `warn` because it usually means two overlapping
//! actions or effects touch the same property.

use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use bfsm_agent::{Agent, AgentProperty};
use bfsm_core::{AgentId, FloatGenerator, SampleRng, sync};
use rustc_hash::FxHashMap;

/// How the sampled value combines with the current one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PropertyOp {
    /// Replace.
    Set,
    /// Add.
    Offset,
    /// Multiply.
    Scale,
}

impl PropertyOp {
    #[inline]
    pub fn apply(self, old: f32, sample: f32) -> f32 {
        match self {
            PropertyOp::Set => sample,
            PropertyOp::Offset => old + sample,
            PropertyOp::Scale => old * sample,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PropertyOp::Set => "set",
            PropertyOp::Offset => "offset",
            PropertyOp::Scale => "scale",
        }
    }
}

impl fmt::Display for PropertyOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PropertyOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "set" => Ok(PropertyOp::Set),
            "offset" => Ok(PropertyOp::Offset),
            "scale" => Ok(PropertyOp::Scale),
            other => Err(format!("unknown property operation {other:?}")),
        }
    }
}

pub struct AgentPropertyManipulator {
    property: AgentProperty,
    op:       PropertyOp,
    value:    FloatGenerator,
    saved:    Mutex<FxHashMap<AgentId, f32>>,
}

impl AgentPropertyManipulator {
    pub fn new(property: AgentProperty, op: PropertyOp, value: FloatGenerator) -> Self {
        Self { property, op, value, saved: Mutex::new(FxHashMap::default()) }
    }

    #[inline]
    pub fn property(&self) -> AgentProperty {
        self.property
    }

    #[inline]
    pub fn op(&self) -> PropertyOp {
        self.op
    }

    /// Write the new value without keeping an undo value.
    pub fn apply<R: SampleRng + ?Sized>(&self, agent: &mut Agent<'_>, rng: &mut R) {
        let old = agent.props.get(self.property);
        agent.props.set(self.property, self.op.apply(old, self.value.sample(rng)));
    }

    /// Write the new value and remember the old one for [`restore`](Self::restore).
    pub fn manipulate<R: SampleRng + ?Sized>(&self, agent: &mut Agent<'_>, rng: &mut R) {
        let old = agent.props.get(self.property);
        let new = self.op.apply(old, self.value.sample(rng));
        if let Some(lost) = sync::lock(&self.saved).insert(agent.id, old) {
            tracing::warn!(
                agent = %agent.id,
                property = %self.property,
                lost,
                "property manipulated again before restore; earlier value discarded"
            );
        }
        agent.props.set(self.property, new);
    }

    /// Write back the saved value.  No-op if nothing is saved for this agent.
    pub fn restore(&self, agent: &mut Agent<'_>) {
        if let Some(old) = sync::lock(&self.saved).remove(&agent.id) {
            agent.props.set(self.property, old);
        }
    }

    pub fn has_saved(&self, agent: AgentId) -> bool {
        sync::lock(&self.saved).contains_key(&agent)
    }

    /// Same configuration, no saved values.
    pub fn copy(&self) -> Self {
        Self::new(self.property, self.op, self.value)
    }
}

impl fmt::Debug for AgentPropertyManipulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentPropertyManipulator")
            .field("property", &self.property)
            .field("op", &self.op)
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}
