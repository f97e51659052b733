//! `bfsm-agent`: per-agent storage for the `bfsm` behavior kernel.
//!
//! The behavior kernel only needs a narrow slice of an agent: where it is,
//! which class it belongs to, a handful of scalar properties that actions may
//! temporarily override, and an output slot for the preferred velocity.  The
//! motion model that turns a preferred velocity into real motion lives
//! elsewhere and owns whatever else it needs.
//!
//! # Crate layout
//!
//! | Module            | Contents                                                |
//! |-------------------|---------------------------------------------------------|
//! | [`props`]         | `AgentProperty` names, `AgentProperties` values         |
//! | [`pref_velocity`] | `PrefVelocity` (direction, speed, target, arc)          |
//! | [`store`]         | `AgentBody`, `AgentStore`, `Agent` view, `AgentRngs`    |
//! | [`builder`]       | `AgentStoreBuilder` (fluent construction)               |
//! | [`error`]         | `AgentError`, `AgentResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                   |
//! |---------|----------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on all public types.   |

pub mod builder;
pub mod error;
pub mod pref_velocity;
pub mod props;
pub mod store;

#[cfg(test)]
mod tests;

pub use builder::AgentStoreBuilder;
pub use error::{AgentError, AgentResult};
pub use pref_velocity::PrefVelocity;
pub use props::{AgentProperties, AgentProperty};
pub use store::{Agent, AgentBody, AgentRngs, AgentStore};
