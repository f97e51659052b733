//! `bfsm-core`: foundational types for the `bfsm` behavior kernel.
//!
//! Every other `bfsm-*` crate depends on this one.  It has no `bfsm-*`
//! dependencies and few external ones (`rand`, `glam`, `thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`ids`]         | `AgentId`, `StateId`, `GoalSetId`, `GoalId`               |
//! | [`geo`]         | `Shape` (point / circle / AABB / OBB) and distance queries |
//! | [`dist`]        | `FloatGenerator`, `Vec2Generator`                         |
//! | [`time`]        | `SimClock`, `RunConfig`                                   |
//! | [`rng`]         | `AgentRng` (per-agent), `SimRng` (global)                 |
//! | [`sync`]        | poison-tolerant lock helpers                              |
//! | [`error`]       | `CoreError`, `CoreResult`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public value types.  |

pub mod dist;
pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod sync;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use dist::{FloatGenerator, Vec2Generator};
pub use error::{CoreError, CoreResult};
pub use geo::Shape;
pub use glam::Vec2;
pub use ids::{AgentId, GoalId, GoalSetId, StateId};
pub use rng::{AgentRng, SampleRng, SimRng};
pub use time::{RunConfig, SimClock};
