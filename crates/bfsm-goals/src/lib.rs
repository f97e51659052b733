//! `bfsm-goals`: goals, goal sets, and the policies that pick one for an agent.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                       |
//! |----------------|----------------------------------------------------------------|
//! | [`goal`]       | `Goal` (shape, weight, capacity, population)                   |
//! | [`goal_set`]   | `GoalSet` (available-goal ledger), `GoalSets`                  |
//! | [`selector`]   | `GoalSelector` trait, `SelectorSlot` (persistence + cache)     |
//! | [`selectors`]  | explicit / identity / mirror / offset / nearest / farthest / second-nearest / random / weighted / shared |
//! | [`nav_mesh`]   | `NavMesh` trait, `NavMeshLocalizer`, `NearestNavMeshSelector`  |
//! | [`error`]      | `GoalError`, `GoalSelectorError`                               |
//!
//! # Concurrency
//!
//! Goals are shared as `Arc<Goal>` between their set, the selectors that
//! handed them out, and the states that record them.  A goal's population and
//! its set's availability ledger change together under the ledger's write
//! lock, so no thread ever sees a goal listed as available once it is full.

pub mod error;
pub mod goal;
pub mod goal_set;
pub mod nav_mesh;
pub mod selector;
pub mod selectors;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{GoalError, GoalResult, GoalSelectorError};
pub use goal::Goal;
pub use goal_set::{GoalSet, GoalSets};
pub use nav_mesh::{NavMesh, NavMeshLocalizer, NavNode, NearestNavMeshSelector};
pub use selector::{GoalSelector, SelectionContext, SelectorSlot};
pub use selectors::{
    ExplicitSelector, FarthestSelector, IdentitySelector, MirrorSelector, NearestSelector,
    OffsetSelector, RandomSelector, SecondNearestSelector, SharedSelector, WeightedSelector,
};
