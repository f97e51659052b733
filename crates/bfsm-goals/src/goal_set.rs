//! Goal sets and the availability ledger they share with their goals.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use bfsm_core::{GoalId, GoalSetId, SampleRng, sync};
use rustc_hash::FxHashMap;

use crate::{Goal, GoalError, GoalResult};

// ── Ledger ────────────────────────────────────────────────────────────────────

/// The goals of a set that still have room, in the order they became
/// available, and the sum of their weights.
#[derive(Debug, Default)]
pub(crate) struct Ledger {
    available:    Vec<GoalId>,
    total_weight: f32,
}

impl Ledger {
    pub(crate) fn set_full(&mut self, id: GoalId, weight: f32) {
        if let Some(i) = self.available.iter().position(|&g| g == id) {
            self.available.remove(i);
            self.total_weight -= weight;
            if self.available.is_empty() {
                self.total_weight = 0.0;
            }
        }
    }

    pub(crate) fn set_available(&mut self, id: GoalId, weight: f32) {
        debug_assert!(
            !self.available.contains(&id),
            "goal {id} marked available twice without being marked full"
        );
        self.available.push(id);
        self.total_weight += weight;
    }
}

// ── GoalSet ───────────────────────────────────────────────────────────────────

/// A group of goals under one id.
///
/// Goal membership is fixed once the set is built (`add_goal` needs
/// `&mut self`); only the availability ledger changes while the simulation
/// runs, and it is behind a readers-writer lock.
#[derive(Debug)]
pub struct GoalSet {
    id:     GoalSetId,
    goals:  Vec<Arc<Goal>>,
    index:  FxHashMap<GoalId, usize>,
    ledger: Arc<RwLock<Ledger>>,
}

impl GoalSet {
    pub fn new(id: GoalSetId) -> Self {
        Self {
            id,
            goals: Vec::new(),
            index: FxHashMap::default(),
            ledger: Arc::new(RwLock::new(Ledger::default())),
        }
    }

    #[inline]
    pub fn id(&self) -> GoalSetId {
        self.id
    }

    /// Take ownership of `goal` under `id`.
    ///
    /// Returns `false` and drops `goal` if the id is already used.  A goal
    /// with zero capacity is kept but never listed as available.
    pub fn add_goal(&mut self, id: GoalId, mut goal: Goal) -> bool {
        if self.index.contains_key(&id) {
            return false;
        }
        goal.attach(self.id, id, Arc::clone(&self.ledger));
        if goal.has_capacity() {
            sync::write(&self.ledger).set_available(id, goal.weight());
        }
        self.index.insert(id, self.goals.len());
        self.goals.push(Arc::new(goal));
        true
    }

    /// Number of goals in the set, available or not.
    #[inline]
    pub fn size(&self) -> usize {
        self.goals.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }

    pub fn available_count(&self) -> usize {
        sync::read(&self.ledger).available.len()
    }

    pub fn is_available(&self, id: GoalId) -> bool {
        sync::read(&self.ledger).available.contains(&id)
    }

    pub fn total_weight(&self) -> f32 {
        sync::read(&self.ledger).total_weight
    }

    // ── Lookup ────────────────────────────────────────────────────────────

    #[inline]
    pub fn get_goal_by_id(&self, id: GoalId) -> Option<&Arc<Goal>> {
        self.index.get(&id).map(|&i| &self.goals[i])
    }

    /// The `i`-th goal in insertion order.
    #[inline]
    pub fn get_ith_goal(&self, i: usize) -> Option<&Arc<Goal>> {
        self.goals.get(i)
    }

    /// Like [`get_goal_by_id`](Self::get_goal_by_id), but waits for any
    /// in-flight capacity transition to finish first.
    pub fn get_goal_by_id_concurrent(&self, id: GoalId) -> Option<Arc<Goal>> {
        let _ledger = sync::read(&self.ledger);
        self.get_goal_by_id(id).cloned()
    }

    pub fn get_ith_goal_concurrent(&self, i: usize) -> Option<Arc<Goal>> {
        let _ledger = sync::read(&self.ledger);
        self.get_ith_goal(i).cloned()
    }

    pub fn try_goal(&self, id: GoalId) -> GoalResult<Arc<Goal>> {
        self.get_goal_by_id(id)
            .cloned()
            .ok_or(GoalError::UnknownGoal { set: self.id, goal: id })
    }

    // ── Selection over available goals ────────────────────────────────────

    /// Visit every available goal, in ledger order, under the read lock.
    pub fn scan_available(&self, mut f: impl FnMut(&Arc<Goal>)) {
        let ledger = sync::read(&self.ledger);
        for id in &ledger.available {
            if let Some(goal) = self.get_goal_by_id(*id) {
                f(goal);
            }
        }
    }

    /// Uniform choice among available goals.
    pub fn random_goal<R: SampleRng + ?Sized>(&self, rng: &mut R) -> Option<Arc<Goal>> {
        let ledger = sync::read(&self.ledger);
        let i = rng.index(ledger.available.len())?;
        self.get_goal_by_id(ledger.available[i]).cloned()
    }

    /// Weighted choice among available goals.
    ///
    /// Walks the available list accumulating weight until it exceeds
    /// `total_weight * U(0, 1)`.  Rounding can leave the threshold unreached;
    /// the last available goal is returned then.
    pub fn random_weighted_goal<R: SampleRng + ?Sized>(&self, rng: &mut R) -> Option<Arc<Goal>> {
        let ledger = sync::read(&self.ledger);
        let last = *ledger.available.last()?;
        let threshold = ledger.total_weight * rng.unit();

        let mut accum = 0.0;
        for &id in &ledger.available {
            if let Some(goal) = self.get_goal_by_id(id) {
                accum += goal.weight();
                if accum > threshold {
                    return Some(Arc::clone(goal));
                }
            }
        }
        self.get_goal_by_id(last).cloned()
    }
}

// ── GoalSets ──────────────────────────────────────────────────────────────────

/// All goal sets of a behavior, keyed by id.
#[derive(Debug, Default)]
pub struct GoalSets {
    sets: BTreeMap<GoalSetId, GoalSet>,
}

impl GoalSets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `set`, replacing nothing: returns the set back if its id is taken.
    pub fn insert(&mut self, set: GoalSet) -> Result<(), GoalSet> {
        if self.sets.contains_key(&set.id()) {
            return Err(set);
        }
        self.sets.insert(set.id(), set);
        Ok(())
    }

    #[inline]
    pub fn get(&self, id: GoalSetId) -> Option<&GoalSet> {
        self.sets.get(&id)
    }

    pub fn try_get(&self, id: GoalSetId) -> GoalResult<&GoalSet> {
        self.sets.get(&id).ok_or(GoalError::UnknownGoalSet(id))
    }

    /// Look up one goal by set and goal id.
    pub fn get_goal(&self, set: GoalSetId, goal: GoalId) -> GoalResult<Arc<Goal>> {
        self.try_get(set)?.try_goal(goal)
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GoalSet> {
        self.sets.values()
    }
}
