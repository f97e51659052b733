//! Navigation-mesh distance for goal selection.
//!
//! The mesh itself is an external collaborator behind the [`NavMesh`] trait.
//! [`NavMeshLocalizer`] remembers which mesh node each agent was last found
//! on; it is refreshed once per step by a task, so selectors running in the
//! parallel phase only read it.

use std::fmt;
use std::sync::{Arc, RwLock};

use bfsm_agent::Agent;
use bfsm_core::{AgentId, AgentRng, GoalSetId, sync};
use glam::Vec2;
use rustc_hash::FxHashMap;

use crate::{Goal, GoalSelector, SelectionContext};

/// Index of a navigation-mesh node (polygon).
pub type NavNode = u32;

/// Pluggable navigation mesh.
///
/// # Thread safety
///
/// Queried concurrently from the parallel phase; implementations must be
/// `Send + Sync`.
pub trait NavMesh: Send + Sync {
    /// Node containing `p`, if `p` is on the mesh.
    fn locate(&self, p: Vec2) -> Option<NavNode>;

    /// Length of the shortest path from `from` (known to lie in `start`) to
    /// `to`; `None` if `to` is unreachable.
    fn path_length(&self, start: NavNode, from: Vec2, to: Vec2) -> Option<f32>;
}

// ── NavMeshLocalizer ──────────────────────────────────────────────────────────

pub struct NavMeshLocalizer {
    mesh:  Arc<dyn NavMesh>,
    nodes: RwLock<FxHashMap<AgentId, NavNode>>,
}

impl NavMeshLocalizer {
    pub fn new(mesh: Arc<dyn NavMesh>) -> Self {
        Self { mesh, nodes: RwLock::new(FxHashMap::default()) }
    }

    #[inline]
    pub fn mesh(&self) -> &dyn NavMesh {
        self.mesh.as_ref()
    }

    /// Cached node for `agent`.
    pub fn node_of(&self, agent: AgentId) -> Option<NavNode> {
        sync::read(&self.nodes).get(&agent).copied()
    }

    /// Cached node for `agent`, falling back to a direct lookup of `pos`.
    pub fn locate(&self, agent: AgentId, pos: Vec2) -> Option<NavNode> {
        self.node_of(agent).or_else(|| self.mesh.locate(pos))
    }

    /// Re-locate every agent.  An agent that has stepped off the mesh keeps
    /// its last known node.  Returns how many agents could not be located.
    pub fn refresh(&self, agents: impl IntoIterator<Item = (AgentId, Vec2)>) -> usize {
        let mut nodes = sync::write(&self.nodes);
        let mut lost = 0;
        for (agent, pos) in agents {
            match self.mesh.locate(pos) {
                Some(node) => {
                    nodes.insert(agent, node);
                }
                None => lost += 1,
            }
        }
        lost
    }
}

impl fmt::Debug for NavMeshLocalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavMeshLocalizer")
            .field("tracked", &sync::read(&self.nodes).len())
            .finish()
    }
}

// ── NearestNavMeshSelector ────────────────────────────────────────────────────

/// Nearest available goal by path length through the mesh.  Goals whose
/// centroid cannot be reached are skipped; ties keep the goal scanned first.
pub struct NearestNavMeshSelector {
    pub goal_set:  GoalSetId,
    pub localizer: Arc<NavMeshLocalizer>,
}

impl GoalSelector for NearestNavMeshSelector {
    fn name(&self) -> &'static str {
        "nearest_nav_mesh"
    }

    fn get_goal(&self, agent: &Agent<'_>, ctx: &SelectionContext<'_>, _: &mut AgentRng) -> Option<Arc<Goal>> {
        let pos = agent.pos();
        let start = self.localizer.locate(agent.id, pos)?;
        let mesh = self.localizer.mesh();

        let mut best: Option<(f32, Arc<Goal>)> = None;
        ctx.goal_sets.get(self.goal_set)?.scan_available(|goal| {
            let Some(len) = mesh.path_length(start, pos, goal.centroid()) else {
                return;
            };
            if best.as_ref().is_none_or(|(bl, _)| len < *bl) {
                best = Some((len, Arc::clone(goal)));
            }
        });
        best.map(|(_, g)| g)
    }

    fn goal_set(&self) -> Option<GoalSetId> {
        Some(self.goal_set)
    }

    fn nav_mesh_localizer(&self) -> Option<&Arc<NavMeshLocalizer>> {
        Some(&self.localizer)
    }
}
