//! Strongly typed, zero-cost identifier wrappers.
//!
//! Agents and states are both addressed by dense integer ids: an `AgentId` is
//! the agent's slot in every per-agent `Vec`, a `StateId` is the state's slot
//! in the FSM's state vector.  Goal sets and goals carry the integer ids their
//! behavior description gave them, so those are sparse.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline(always)]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Dense index of an agent, `0..agent_count`.
    pub struct AgentId(u32);
}

typed_id! {
    /// Dense index of a state inside the FSM, assigned in declaration order.
    pub struct StateId(u32);
}

typed_id! {
    /// Identifier of a goal set, as declared in the behavior description.
    pub struct GoalSetId(u32);
}

typed_id! {
    /// Identifier of a goal, unique within its goal set.
    pub struct GoalId(u32);
}
