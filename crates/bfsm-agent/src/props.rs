//! Mutable scalar agent properties.
//!
//! These are the only agent fields the behavior kernel writes besides the
//! preferred velocity.  Actions and event effects address them by name.

use std::fmt;
use std::str::FromStr;

use crate::AgentError;

/// Names of the scalar properties an action or effect may manipulate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AgentProperty {
    MaxSpeed,
    MaxAccel,
    PrefSpeed,
    MaxAngleVel,
    NeighborDist,
    Priority,
    Radius,
}

impl AgentProperty {
    pub const ALL: [AgentProperty; 7] = [
        AgentProperty::MaxSpeed,
        AgentProperty::MaxAccel,
        AgentProperty::PrefSpeed,
        AgentProperty::MaxAngleVel,
        AgentProperty::NeighborDist,
        AgentProperty::Priority,
        AgentProperty::Radius,
    ];

    /// The name used in behavior descriptions.
    pub fn name(self) -> &'static str {
        match self {
            AgentProperty::MaxSpeed => "max_speed",
            AgentProperty::MaxAccel => "max_accel",
            AgentProperty::PrefSpeed => "pref_speed",
            AgentProperty::MaxAngleVel => "max_angle_vel",
            AgentProperty::NeighborDist => "neighbor_dist",
            AgentProperty::Priority => "priority",
            AgentProperty::Radius => "r",
        }
    }
}

impl FromStr for AgentProperty {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgentProperty::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| AgentError::UnknownProperty(s.to_owned()))
    }
}

impl fmt::Display for AgentProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── AgentProperties ───────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AgentProperties {
    pub max_speed:     f32,
    pub max_accel:     f32,
    pub pref_speed:    f32,
    /// Degrees per second.
    pub max_angle_vel: f32,
    pub neighbor_dist: f32,
    pub priority:      f32,
    pub radius:        f32,
}

impl Default for AgentProperties {
    fn default() -> Self {
        Self {
            max_speed:     2.0,
            max_accel:     10.0,
            pref_speed:    1.34,
            max_angle_vel: 360.0,
            neighbor_dist: 5.0,
            priority:      0.0,
            radius:        0.19,
        }
    }
}

impl AgentProperties {
    #[inline]
    pub fn get(&self, prop: AgentProperty) -> f32 {
        match prop {
            AgentProperty::MaxSpeed => self.max_speed,
            AgentProperty::MaxAccel => self.max_accel,
            AgentProperty::PrefSpeed => self.pref_speed,
            AgentProperty::MaxAngleVel => self.max_angle_vel,
            AgentProperty::NeighborDist => self.neighbor_dist,
            AgentProperty::Priority => self.priority,
            AgentProperty::Radius => self.radius,
        }
    }

    #[inline]
    pub fn set(&mut self, prop: AgentProperty, value: f32) {
        let slot = match prop {
            AgentProperty::MaxSpeed => &mut self.max_speed,
            AgentProperty::MaxAccel => &mut self.max_accel,
            AgentProperty::PrefSpeed => &mut self.pref_speed,
            AgentProperty::MaxAngleVel => &mut self.max_angle_vel,
            AgentProperty::NeighborDist => &mut self.neighbor_dist,
            AgentProperty::Priority => &mut self.priority,
            AgentProperty::Radius => &mut self.radius,
        };
        *slot = value;
    }
}
