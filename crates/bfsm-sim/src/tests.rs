//! Integration tests for bfsm-sim.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bfsm_agent::{AgentRngs, AgentStore, AgentStoreBuilder};
use bfsm_behavior::{
    AutoCondition, BehaviorDescription, BuildError, FsmError, GoalReachedCondition,
    GoalVelComponent, SingleTarget, StateDescription, StateError, Task, TaskContext, TaskError,
    Transition,
};
use bfsm_core::{AgentId, GoalId, GoalSetId, RunConfig, Shape, StateId};
use bfsm_goals::{Goal, GoalSelectorError, GoalSet, NearestSelector};
use glam::Vec2;

use crate::{
    IntegratorBuilder, IntegratorError, KinematicSimulator, NoopObserver, Phase, SimError, Simulator,
    StepObserver,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn config(max_duration: Option<f32>) -> RunConfig {
    RunConfig { time_step: 0.1, max_duration, seed: 42, ..RunConfig::default() }
}

fn store(n: usize) -> (AgentStore, AgentRngs) {
    AgentStoreBuilder::new(n, 42)
        .place(|i| (Vec2::new(0.0, i as f32), 0))
        .build()
}

fn transition(to: &str) -> Transition {
    Transition::new(Box::new(AutoCondition), Box::new(SingleTarget::new(to)))
}

/// A → B on `auto`, B final.
fn auto_chain() -> BehaviorDescription {
    let mut desc = BehaviorDescription::new();
    desc.add_state(StateDescription::new("a"));
    desc.add_state(StateDescription::new("b").final_state(true));
    desc.add_transition(["a"], transition("b"));
    desc
}

/// One non-final state and nothing else.
fn idle() -> BehaviorDescription {
    let mut desc = BehaviorDescription::new();
    desc.add_state(StateDescription::new("idle"));
    desc
}

/// Goal set 0 with one point goal at `pos`.
fn one_goal(pos: Vec2, capacity: usize) -> GoalSet {
    let mut set = GoalSet::new(GoalSetId(0));
    set.add_goal(GoalId(0), Goal::new(GoalId(0), Shape::point(pos)).with_capacity(capacity));
    set
}

struct FailingTask {
    runs: Arc<AtomicUsize>,
}

impl fmt::Display for FailingTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("failing task")
    }
}

impl Task for FailingTask {
    fn do_work(&self, _: &TaskContext<'_>) -> Result<(), TaskError> {
        self.runs.fetch_add(1, Ordering::Relaxed);
        Err(TaskError::Fatal("disk full".into()))
    }

    fn is_equivalent(&self, other: &dyn Task) -> bool {
        other.as_any().is::<FailingTask>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use super::*;

    #[test]
    fn builds_and_places_agents() {
        let (agents, rngs) = store(3);
        let integrator = IntegratorBuilder::new(config(None), agents, rngs, auto_chain()).build().unwrap();
        assert_eq!(integrator.phase(), Phase::Constructing);
        assert_eq!(integrator.simulator().agents().count, 3);
        assert_eq!(integrator.fsm().state_population(StateId(0)), 3);
        assert_eq!(integrator.clock().time, 0.0);
    }

    #[test]
    fn sub_steps_reach_the_simulator() {
        let (agents, rngs) = store(1);
        let cfg = RunConfig { sub_steps: 3, ..config(None) };
        let mut integrator = IntegratorBuilder::new(cfg, agents, rngs, idle()).build().unwrap();
        assert_eq!(integrator.simulator().sub_steps(), 3);
        integrator.step(0.1).unwrap();
        assert_eq!(integrator.phase(), Phase::Running);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let (agents, rngs) = store(1);
        let bad = RunConfig { time_step: 0.0, ..RunConfig::default() };
        let err = IntegratorBuilder::new(bad, agents, rngs, idle()).build().err().unwrap();
        assert!(matches!(err, IntegratorError::Config(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn rng_count_mismatch_is_a_build_error() {
        let (agents, _) = store(3);
        let rngs = AgentRngs::new(2, 0);
        let err = IntegratorBuilder::new(config(None), agents, rngs, idle()).build().err().unwrap();
        assert!(matches!(err, IntegratorError::Build(BuildError::AgentCountMismatch { store: 3, rngs: 2 })));
    }

    #[test]
    fn bad_behavior_is_a_build_error() {
        let (agents, rngs) = store(1);
        let err = IntegratorBuilder::new(config(None), agents, rngs, BehaviorDescription::new())
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, IntegratorError::Build(BuildError::NoStates)));
    }
}

// ── Stepping ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod step_tests {
    use super::*;

    #[test]
    fn auto_chain_finishes_on_first_step() {
        let (agents, rngs) = store(4);
        let mut integrator = IntegratorBuilder::new(config(None), agents, rngs, auto_chain()).build().unwrap();
        let err = integrator.step(0.1).unwrap_err();
        assert!(matches!(err, IntegratorError::Finished));
        assert!(!err.is_fatal());
        assert!(integrator.is_finished());
        assert!(integrator.fsm().all_final());
        assert_eq!(integrator.clock().steps, 1);

        // Later calls do no work.
        assert!(matches!(integrator.step(0.1), Err(IntegratorError::Finished)));
        assert_eq!(integrator.clock().steps, 1);
    }

    #[test]
    fn max_duration_ends_the_run() {
        let (agents, rngs) = store(2);
        let mut integrator = IntegratorBuilder::new(config(Some(1.0)), agents, rngs, idle()).build().unwrap();
        for _ in 0..9 {
            integrator.step(0.1).unwrap();
            assert_eq!(integrator.phase(), Phase::Running);
        }
        assert!(matches!(integrator.step(0.1), Err(IntegratorError::Finished)));
        assert_eq!(integrator.clock().steps, 10);
        assert!(!integrator.fsm().all_final());
    }

    #[test]
    fn mixed_step_lengths_never_rewind_time() {
        let (agents, rngs) = store(1);
        let mut integrator = IntegratorBuilder::new(config(Some(1.0)), agents, rngs, idle()).build().unwrap();
        let mut last = integrator.clock().time;
        for dt in [0.5, 0.1, 0.1, 0.05, 0.1] {
            integrator.step(dt).unwrap();
            let now = integrator.clock().time;
            assert!(now > last, "time went from {last} to {now}");
            last = now;
        }
        assert!((last - 0.85).abs() < 1e-5, "got {last}");

        // 0.85 + 0.1 is still short of the limit; the next long step is not.
        integrator.step(0.1).unwrap();
        assert!(matches!(integrator.step(0.5), Err(IntegratorError::Finished)));
    }

    #[test]
    fn agent_failure_is_fatal() {
        let mut desc = BehaviorDescription::new();
        desc.add_goal_set(one_goal(Vec2::new(5.0, 0.0), 1)).unwrap();
        desc.add_state(StateDescription::new("start"));
        desc.add_state(
            StateDescription::new("seek").selector(Box::new(NearestSelector { goal_set: GoalSetId(0) })),
        );
        desc.add_transition(["start"], transition("seek"));
        let (agents, rngs) = store(3);
        let mut integrator = IntegratorBuilder::new(config(None), agents, rngs, desc).build().unwrap();

        let err = integrator.step(0.1).unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, IntegratorError::Fatal(FsmError::AgentsFailed { failed: 2 })));
    }

    #[test]
    fn fatal_task_is_fatal() {
        let runs = Arc::new(AtomicUsize::new(0));
        let (agents, rngs) = store(1);
        let mut integrator = IntegratorBuilder::new(config(None), agents, rngs, idle())
            .task(Box::new(FailingTask { runs: Arc::clone(&runs) }))
            .task(Box::new(FailingTask { runs: Arc::clone(&runs) }))
            .build()
            .unwrap();
        assert_eq!(integrator.fsm().task_count(), 1);

        let err = integrator.step(0.1).unwrap_err();
        assert!(matches!(err, IntegratorError::Fatal(FsmError::TaskFatal { .. })));
        assert_eq!(runs.load(Ordering::Relaxed), 1);
        // Motion ran before the task phase.
        assert_eq!(integrator.clock().steps, 1);
    }

    #[test]
    fn walkers_reach_their_goal() {
        let mut desc = BehaviorDescription::new();
        desc.add_goal_set(one_goal(Vec2::new(2.0, 0.0), usize::MAX)).unwrap();
        desc.add_state(
            StateDescription::new("walk")
                .velocity(Box::new(GoalVelComponent))
                .selector(Box::new(NearestSelector { goal_set: GoalSetId(0) })),
        );
        desc.add_state(StateDescription::new("arrived").final_state(true));
        desc.add_transition(
            ["walk"],
            Transition::new(
                Box::new(GoalReachedCondition { distance: 0.2 }),
                Box::new(SingleTarget::new("arrived")),
            ),
        );
        let (agents, rngs) = AgentStoreBuilder::new(1, 1).build();
        let mut integrator = IntegratorBuilder::new(config(Some(30.0)), agents, rngs, desc).build().unwrap();
        integrator.run(&mut NoopObserver).unwrap();

        assert!(integrator.fsm().all_final());
        assert!(integrator.clock().time < 30.0);
        let pos = integrator.simulator().agents().bodies[0].pos;
        assert!(pos.distance(Vec2::new(2.0, 0.0)) < 0.2, "ended at {pos}");
    }
}

// ── Shared goal capacity ──────────────────────────────────────────────────────

#[cfg(test)]
mod capacity_tests {
    use super::*;

    #[test]
    fn second_agent_waits_for_the_goal_to_be_freed() {
        let mut desc = BehaviorDescription::new();
        desc.add_goal_set(one_goal(Vec2::new(5.0, 0.0), 1)).unwrap();
        desc.add_state(StateDescription::new("wait"));
        desc.add_state(
            StateDescription::new("seek").selector(Box::new(NearestSelector { goal_set: GoalSetId(0) })),
        );
        let (mut agents, mut rngs) = store(2);
        let clock = config(None).make_clock();
        let mut fsm = bfsm_behavior::build_fsm(desc, &mut agents, &mut rngs, &clock).unwrap();
        let seek = StateId(1);

        assert!(fsm.force_state(AgentId(0), seek, false, &mut agents, &mut rngs, &clock).unwrap());
        let err = fsm.force_state(AgentId(1), seek, false, &mut agents, &mut rngs, &clock).unwrap_err();
        assert!(matches!(
            err,
            FsmError::State(StateError::Goal { source: GoalSelectorError::NoGoal { .. }, .. })
        ));

        fsm.force_state(AgentId(0), StateId(0), false, &mut agents, &mut rngs, &clock).unwrap();
        assert!(fsm.force_state(AgentId(1), seek, false, &mut agents, &mut rngs, &clock).unwrap());
        let goal = fsm.get_goal(GoalSetId(0), GoalId(0)).unwrap();
        assert_eq!(goal.population(), 1);
        assert_eq!(fsm.agent_goal(AgentId(1)).map(|g| g.id()), Some(GoalId(0)));
    }
}

// ── Simulator ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod simulator_tests {
    use super::*;

    fn pushed(vel: Vec2, sub_steps: u32) -> KinematicSimulator {
        let (mut agents, _) = AgentStoreBuilder::new(1, 0).build();
        let dir = vel.normalize_or_zero();
        agents.pref_velocity[0].set_single(dir);
        agents.pref_velocity[0].speed = vel.length();
        KinematicSimulator::new(agents, config(None).make_clock(), sub_steps)
    }

    #[test]
    fn acceleration_is_limited() {
        let mut sim = pushed(Vec2::new(1.5, 0.0), 0);
        let max_accel = sim.agents().props[0].max_accel;
        sim.do_step(0.05).unwrap();
        let vel = sim.agents().bodies[0].vel;
        assert!((vel.x - max_accel * 0.05).abs() < 1e-5);
        assert_eq!(sim.agents().bodies[0].orient, Vec2::X);
    }

    #[test]
    fn speed_is_capped() {
        let mut sim = pushed(Vec2::new(0.0, 50.0), 3);
        for _ in 0..20 {
            sim.do_step(0.1).unwrap();
        }
        let max_speed = sim.agents().props[0].max_speed;
        let vel = sim.agents().bodies[0].vel;
        assert!((vel.length() - max_speed).abs() < 1e-4);
        assert!(sim.agents().bodies[0].pos.y > 0.0);
        assert_eq!(sim.clock().steps, 20);
        assert!((sim.global_time() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn zero_preference_brakes_to_rest() {
        let mut sim = pushed(Vec2::ZERO, 0);
        sim.agents_mut().bodies[0].vel = Vec2::new(0.5, 0.0);
        sim.do_step(0.1).unwrap();
        assert_eq!(sim.agents().bodies[0].vel, Vec2::ZERO);
    }

    #[test]
    fn bad_time_step_is_rejected() {
        let mut sim = pushed(Vec2::X, 0);
        assert!(matches!(sim.do_step(0.0), Err(SimError::InvalidTimeStep(_))));
        assert!(matches!(sim.do_step(f32::NAN), Err(SimError::InvalidTimeStep(_))));
        assert_eq!(sim.clock().steps, 0);
    }
}

// ── Observer ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod observer_tests {
    use bfsm_behavior::Fsm;
    use bfsm_core::SimClock;

    use super::*;

    #[derive(Default)]
    struct Counter {
        starts:   usize,
        ends:     usize,
        finished: usize,
        last_end: f32,
    }

    impl StepObserver for Counter {
        fn on_step_start(&mut self, _: &SimClock) {
            self.starts += 1;
        }

        fn on_step_end(&mut self, clock: &SimClock, _: &Fsm, _: &AgentStore) {
            self.ends += 1;
            self.last_end = clock.time;
        }

        fn on_finished(&mut self, _: &SimClock) {
            self.finished += 1;
        }
    }

    #[test]
    fn run_reports_every_step_once() {
        let (agents, rngs) = store(2);
        let mut integrator = IntegratorBuilder::new(config(Some(0.5)), agents, rngs, idle()).build().unwrap();
        let mut counter = Counter::default();
        integrator.run(&mut counter).unwrap();
        assert_eq!(counter.starts, 5);
        assert_eq!(counter.ends, 5);
        assert_eq!(counter.finished, 1);
        assert!((counter.last_end - 0.5).abs() < 1e-5);

        // A finished integrator is not run again.
        integrator.run(&mut counter).unwrap();
        assert_eq!(counter.starts, 5);
    }
}
