//! Unit tests for bfsm-goals.

use std::sync::Arc;

use bfsm_agent::{Agent, AgentBody, AgentProperties};
use bfsm_core::{AgentId, AgentRng, GoalId, GoalSetId, Shape};
use glam::Vec2;

use crate::{Goal, GoalSet, GoalSets, SelectionContext};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn point_goal(id: u32, x: f32, y: f32) -> Goal {
    Goal::new(GoalId(id), Shape::point(Vec2::new(x, y)))
}

/// One set (id 0) with the given goals.
fn sets_with(goals: Vec<Goal>) -> GoalSets {
    let mut set = GoalSet::new(GoalSetId(0));
    for g in goals {
        let id = g.id();
        assert!(set.add_goal(id, g));
    }
    let mut sets = GoalSets::new();
    sets.insert(set).unwrap();
    sets
}

/// Run `f` with an agent view at `pos`.
fn with_agent<R>(id: u32, pos: Vec2, f: impl FnOnce(&Agent<'_>) -> R) -> R {
    let body = AgentBody::at(pos);
    let mut props = AgentProperties::default();
    let agent = Agent { id: AgentId(id), body: &body, props: &mut props };
    f(&agent)
}

fn rng() -> AgentRng {
    AgentRng::new(1234, AgentId(0))
}

#[cfg(test)]
mod goal_set {
    use super::*;

    #[test]
    fn add_goal_rejects_duplicates() {
        let mut set = GoalSet::new(GoalSetId(3));
        assert!(set.add_goal(GoalId(1), point_goal(1, 0.0, 0.0)));
        assert_eq!(set.size(), 1);
        assert!(!set.add_goal(GoalId(1), point_goal(1, 5.0, 5.0)));
        assert_eq!(set.size(), 1);
        assert_eq!(set.total_weight(), 1.0);
        let g = set.get_goal_by_id(GoalId(1)).unwrap();
        assert_eq!(g.centroid(), Vec2::ZERO);
        assert_eq!(g.set_id(), GoalSetId(3));
    }

    #[test]
    fn ith_goal_follows_insertion_order() {
        let mut set = GoalSet::new(GoalSetId(0));
        set.add_goal(GoalId(9), point_goal(9, 0.0, 0.0));
        set.add_goal(GoalId(2), point_goal(2, 1.0, 0.0));
        assert_eq!(set.get_ith_goal(0).unwrap().id(), GoalId(9));
        assert_eq!(set.get_ith_goal_concurrent(1).unwrap().id(), GoalId(2));
        assert!(set.get_ith_goal(2).is_none());
    }

    #[test]
    fn full_goal_leaves_available_list_and_returns() {
        let sets = sets_with(vec![point_goal(0, 0.0, 0.0).with_capacity(2)]);
        let set = sets.get(GoalSetId(0)).unwrap();
        let goal = set.get_goal_by_id_concurrent(GoalId(0)).unwrap();

        goal.assign(AgentId(0)).unwrap();
        assert!(set.is_available(GoalId(0)));
        goal.assign(AgentId(1)).unwrap();
        assert!(!set.is_available(GoalId(0)));
        assert_eq!(set.total_weight(), 0.0);

        assert!(goal.assign(AgentId(2)).is_err());
        assert_eq!(goal.population(), 2);

        goal.free();
        assert!(set.is_available(GoalId(0)));
        assert_eq!(set.total_weight(), 1.0);
    }

    #[test]
    fn zero_capacity_goal_never_available() {
        let sets = sets_with(vec![point_goal(0, 0.0, 0.0).with_capacity(0)]);
        let set = sets.get(GoalSetId(0)).unwrap();
        assert_eq!(set.size(), 1);
        assert_eq!(set.available_count(), 0);
        assert!(set.random_goal(&mut rng()).is_none());
    }

    #[test]
    fn random_goal_only_returns_available() {
        let sets = sets_with(vec![
            point_goal(0, 0.0, 0.0).with_capacity(1),
            point_goal(1, 1.0, 0.0),
        ]);
        let set = sets.get(GoalSetId(0)).unwrap();
        set.get_goal_by_id(GoalId(0)).unwrap().assign(AgentId(0)).unwrap();
        let mut r = rng();
        for _ in 0..50 {
            assert_eq!(set.random_goal(&mut r).unwrap().id(), GoalId(1));
        }
    }

    #[test]
    fn weighted_selection_converges() {
        let sets = sets_with(vec![
            point_goal(0, 0.0, 0.0).with_weight(1.0),
            point_goal(1, 0.0, 0.0).with_weight(1.0),
            point_goal(2, 0.0, 0.0).with_weight(2.0),
        ]);
        let set = sets.get(GoalSetId(0)).unwrap();
        let mut r = rng();
        let n = 20_000;
        let mut counts = [0usize; 3];
        for _ in 0..n {
            counts[set.random_weighted_goal(&mut r).unwrap().id().index()] += 1;
        }
        let freq: Vec<f32> = counts.iter().map(|&c| c as f32 / n as f32).collect();
        assert!((freq[0] - 0.25).abs() < 0.02, "{freq:?}");
        assert!((freq[1] - 0.25).abs() < 0.02, "{freq:?}");
        assert!((freq[2] - 0.50).abs() < 0.02, "{freq:?}");
    }

    #[test]
    fn goal_sets_lookup_errors() {
        let sets = sets_with(vec![point_goal(0, 0.0, 0.0)]);
        assert!(sets.get_goal(GoalSetId(0), GoalId(0)).is_ok());
        assert!(sets.get_goal(GoalSetId(0), GoalId(5)).is_err());
        assert!(sets.get_goal(GoalSetId(1), GoalId(0)).is_err());
    }
}

#[cfg(test)]
mod capacity_props {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// population <= capacity always, and the goal is listed as available
        /// exactly when population < capacity.
        #[test]
        fn availability_tracks_population(
            capacity in 0usize..5,
            ops in proptest::collection::vec(any::<bool>(), 0..40),
        ) {
            let sets = sets_with(vec![point_goal(0, 0.0, 0.0).with_capacity(capacity)]);
            let set = sets.get(GoalSetId(0)).unwrap();
            let goal = Arc::clone(set.get_goal_by_id(GoalId(0)).unwrap());

            for (i, assign) in ops.into_iter().enumerate() {
                if assign {
                    let before = goal.population();
                    let res = goal.assign(AgentId(i as u32));
                    prop_assert_eq!(res.is_ok(), before < capacity);
                } else if goal.population() > 0 {
                    goal.free();
                }
                prop_assert!(goal.population() <= capacity);
                prop_assert_eq!(set.is_available(GoalId(0)), goal.population() < capacity);
            }
        }
    }
}

#[cfg(test)]
mod selectors {
    use super::*;
    use crate::{
        ExplicitSelector, FarthestSelector, GoalSelector, IdentitySelector, MirrorSelector,
        NearestSelector, OffsetSelector, SecondNearestSelector,
    };
    use bfsm_core::Vec2Generator;

    fn line_of_goals() -> GoalSets {
        sets_with(vec![
            point_goal(0, 1.0, 0.0),
            point_goal(1, -1.0, 0.0),
            point_goal(2, 5.0, 0.0),
        ])
    }

    fn pick(sel: &dyn GoalSelector, sets: &GoalSets, pos: Vec2) -> Option<Arc<Goal>> {
        let ctx = SelectionContext { goal_sets: sets };
        with_agent(0, pos, |a| sel.get_goal(a, &ctx, &mut rng()))
    }

    #[test]
    fn nearest_breaks_ties_by_scan_order() {
        let sets = line_of_goals();
        let g = pick(&NearestSelector { goal_set: GoalSetId(0) }, &sets, Vec2::ZERO).unwrap();
        assert_eq!(g.id(), GoalId(0));
    }

    #[test]
    fn farthest_and_second_nearest() {
        let sets = line_of_goals();
        let pos = Vec2::new(0.5, 0.0);
        let far = pick(&FarthestSelector { goal_set: GoalSetId(0) }, &sets, pos).unwrap();
        assert_eq!(far.id(), GoalId(2));
        let second = pick(&SecondNearestSelector { goal_set: GoalSetId(0) }, &sets, pos).unwrap();
        assert_eq!(second.id(), GoalId(1));
    }

    #[test]
    fn second_nearest_falls_back_to_only_goal() {
        let sets = sets_with(vec![point_goal(4, 3.0, 3.0)]);
        let g = pick(&SecondNearestSelector { goal_set: GoalSetId(0) }, &sets, Vec2::ZERO).unwrap();
        assert_eq!(g.id(), GoalId(4));
    }

    #[test]
    fn missing_goal_set_yields_none() {
        let sets = line_of_goals();
        assert!(pick(&NearestSelector { goal_set: GoalSetId(7) }, &sets, Vec2::ZERO).is_none());
    }

    #[test]
    fn explicit_returns_named_goal() {
        let sets = line_of_goals();
        let sel = ExplicitSelector { goal_set: GoalSetId(0), goal: GoalId(2) };
        assert_eq!(pick(&sel, &sets, Vec2::ZERO).unwrap().id(), GoalId(2));
    }

    #[test]
    fn position_derived_goals_are_ephemeral() {
        let sets = GoalSets::new();
        let pos = Vec2::new(2.0, -3.0);

        let id = pick(&IdentitySelector, &sets, pos).unwrap();
        assert!(id.is_ephemeral());
        assert_eq!(id.centroid(), pos);

        let m = pick(&MirrorSelector { mirror_x: true, mirror_y: false }, &sets, pos).unwrap();
        assert_eq!(m.centroid(), Vec2::new(-2.0, -3.0));

        let off = OffsetSelector { offset: Vec2Generator::constant(Vec2::new(1.0, 1.0)) };
        assert_eq!(pick(&off, &sets, pos).unwrap().centroid(), Vec2::new(3.0, -2.0));
    }
}

#[cfg(test)]
mod slot {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::{GoalError, GoalSelector, GoalSelectorError, NearestSelector, SelectorSlot, SharedSelector};

    fn nearest_slot() -> SelectorSlot {
        SelectorSlot::new(Box::new(NearestSelector { goal_set: GoalSetId(0) }))
    }

    #[test]
    fn capacity_one_goal_blocks_second_agent_until_freed() {
        let sets = sets_with(vec![point_goal(0, 0.0, 0.0).with_capacity(1)]);
        let ctx = SelectionContext { goal_sets: &sets };
        let slot = nearest_slot();
        let mut r = rng();

        let g0 = with_agent(0, Vec2::ONE, |a| slot.assign_goal(a, &ctx, &mut r)).unwrap();
        let err = with_agent(1, Vec2::ONE, |a| slot.assign_goal(a, &ctx, &mut r)).unwrap_err();
        assert!(matches!(err, GoalSelectorError::NoGoal { agent: AgentId(1), .. }));

        slot.free_goal(AgentId(0), &g0);
        let g1 = with_agent(1, Vec2::ONE, |a| slot.assign_goal(a, &ctx, &mut r)).unwrap();
        assert_eq!(g1.id(), GoalId(0));
        assert_eq!(g1.population(), 1);
    }

    #[test]
    fn persistent_slot_reuses_and_keeps_goal() {
        let sets = sets_with(vec![point_goal(0, 0.0, 0.0), point_goal(1, 9.0, 0.0)]);
        let ctx = SelectionContext { goal_sets: &sets };
        let slot = nearest_slot().persistent(true);
        let mut r = rng();

        let g = with_agent(0, Vec2::ZERO, |a| slot.assign_goal(a, &ctx, &mut r)).unwrap();
        slot.free_goal(AgentId(0), &g);
        assert_eq!(g.population(), 1);

        // Even from next to the other goal, the cached one comes back.
        let again = with_agent(0, Vec2::new(9.0, 0.0), |a| slot.assign_goal(a, &ctx, &mut r)).unwrap();
        assert!(Arc::ptr_eq(&g, &again));
        assert_eq!(g.population(), 1);
    }

    /// Proposes `script` in order, repeating the last entry, regardless of
    /// availability; stands in for a policy whose scan raced another claim.
    struct Scripted {
        script: Vec<Arc<Goal>>,
        calls:  Arc<AtomicUsize>,
    }

    impl GoalSelector for Scripted {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn get_goal(&self, _: &Agent<'_>, _: &SelectionContext<'_>, _: &mut AgentRng) -> Option<Arc<Goal>> {
            let i = self.calls.fetch_add(1, Ordering::Relaxed);
            self.script.get(i.min(self.script.len() - 1)).cloned()
        }
    }

    #[test]
    fn claim_retries_after_losing_a_race() {
        let sets = sets_with(vec![
            point_goal(0, 0.0, 0.0).with_capacity(1),
            point_goal(1, 5.0, 0.0).with_capacity(1),
        ]);
        let set = sets.get(GoalSetId(0)).unwrap();
        let taken = Arc::clone(set.get_goal_by_id(GoalId(0)).unwrap());
        let free = Arc::clone(set.get_goal_by_id(GoalId(1)).unwrap());
        taken.assign(AgentId(9)).unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let slot = SelectorSlot::new(Box::new(Scripted {
            script: vec![Arc::clone(&taken), Arc::clone(&taken), Arc::clone(&free)],
            calls:  Arc::clone(&calls),
        }));
        let ctx = SelectionContext { goal_sets: &sets };
        let g = with_agent(0, Vec2::ZERO, |a| slot.assign_goal(a, &ctx, &mut rng())).unwrap();
        assert_eq!(g.id(), GoalId(1));
        assert_eq!(calls.load(Ordering::Relaxed), 3);
        assert_eq!(taken.population(), 1);
        assert_eq!(free.population(), 1);
    }

    #[test]
    fn claim_gives_up_after_bounded_retries() {
        let sets = sets_with(vec![point_goal(0, 0.0, 0.0).with_capacity(1)]);
        let taken = Arc::clone(sets.get(GoalSetId(0)).unwrap().get_goal_by_id(GoalId(0)).unwrap());
        taken.assign(AgentId(9)).unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let slot = SelectorSlot::new(Box::new(Scripted { script: vec![taken], calls: Arc::clone(&calls) }));
        let ctx = SelectionContext { goal_sets: &sets };
        let err = with_agent(0, Vec2::ZERO, |a| slot.assign_goal(a, &ctx, &mut rng())).unwrap_err();
        assert!(matches!(
            err,
            GoalSelectorError::Assign { agent: AgentId(0), source: GoalError::AtCapacity { .. }, .. }
        ));
        assert_eq!(calls.load(Ordering::Relaxed), 9);
    }

    #[test]
    fn shared_placeholder_is_an_error() {
        let sets = GoalSets::new();
        let ctx = SelectionContext { goal_sets: &sets };
        let slot = SelectorSlot::new(Box::new(SharedSelector { source: "walk".into() }));
        let err = with_agent(0, Vec2::ZERO, |a| slot.assign_goal(a, &ctx, &mut rng())).unwrap_err();
        assert!(matches!(err, GoalSelectorError::Placeholder { .. }));
    }
}

#[cfg(test)]
mod nav_mesh {
    use super::*;
    use crate::{GoalSelector, NavMesh, NavMeshLocalizer, NavNode, NearestNavMeshSelector};

    /// Mesh covering x >= 0, one node per unit column; paths are Manhattan.
    /// Anything with y > 10 is walled off.
    struct Columns;

    impl NavMesh for Columns {
        fn locate(&self, p: Vec2) -> Option<NavNode> {
            (p.x >= 0.0).then_some(p.x as NavNode)
        }

        fn path_length(&self, _: NavNode, from: Vec2, to: Vec2) -> Option<f32> {
            (to.y <= 10.0).then(|| (to - from).abs().element_sum())
        }
    }

    #[test]
    fn ranks_by_path_length_and_skips_unreachable() {
        let sets = sets_with(vec![
            point_goal(0, 1.0, 20.0), // closest, unreachable
            point_goal(1, 4.0, 4.0),  // path 8
            point_goal(2, 6.0, 0.0),  // path 6
        ]);
        let localizer = Arc::new(NavMeshLocalizer::new(Arc::new(Columns)));
        let sel = NearestNavMeshSelector { goal_set: GoalSetId(0), localizer };
        let ctx = SelectionContext { goal_sets: &sets };
        let g = with_agent(0, Vec2::new(0.0, 0.0), |a| sel.get_goal(a, &ctx, &mut rng())).unwrap();
        assert_eq!(g.id(), GoalId(2));
        assert!(sel.nav_mesh_localizer().is_some());
    }

    #[test]
    fn refresh_keeps_last_known_node() {
        let localizer = NavMeshLocalizer::new(Arc::new(Columns));
        assert_eq!(localizer.refresh([(AgentId(0), Vec2::new(3.5, 0.0))]), 0);
        assert_eq!(localizer.node_of(AgentId(0)), Some(3));
        assert_eq!(localizer.refresh([(AgentId(0), Vec2::new(-1.0, 0.0))]), 1);
        assert_eq!(localizer.node_of(AgentId(0)), Some(3));
    }
}
