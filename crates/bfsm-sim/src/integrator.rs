//! The `Integrator`: one behavior step, one motion step, then tasks.

use bfsm_agent::AgentRngs;
use bfsm_behavior::Fsm;
use bfsm_core::SimClock;

use crate::{IntegratorError, IntegratorResult, Simulator, StepObserver};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Built, no step taken yet.
    Constructing,
    Running,
    /// Every agent is final or the configured duration elapsed.
    Finished,
}

/// Drives an [`Fsm`] and a [`Simulator`] in lockstep.
///
/// Each [`step`](Self::step):
///
/// 1. **Decide**: `Fsm::do_step` tests transitions and writes preferred
///    velocities (parallel with the `parallel` feature).
/// 2. **Move**: `Simulator::do_step` integrates motion and advances the clock.
/// 3. **Tasks**: `Fsm::do_tasks` runs every registered task once.
///
/// Create via [`IntegratorBuilder`][crate::IntegratorBuilder].
pub struct Integrator<S: Simulator> {
    fsm:          Fsm,
    sim:          S,
    rngs:         AgentRngs,
    max_duration: Option<f32>,
    phase:        Phase,
}

impl<S: Simulator> Integrator<S> {
    /// Wrap an already-built FSM.  `rngs` must hold one stream per agent.
    pub fn new(fsm: Fsm, sim: S, rngs: AgentRngs, max_duration: Option<f32>) -> Self {
        Self { fsm, sim, rngs, max_duration, phase: Phase::Constructing }
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    pub fn fsm(&self) -> &Fsm {
        &self.fsm
    }

    /// Mutable FSM access, e.g. to register extra tasks between steps.
    pub fn fsm_mut(&mut self) -> &mut Fsm {
        &mut self.fsm
    }

    pub fn simulator(&self) -> &S {
        &self.sim
    }

    pub fn clock(&self) -> &SimClock {
        self.sim.clock()
    }

    /// Advance the whole simulation by `time_step` seconds.
    ///
    /// # Errors
    ///
    /// `IntegratorError::Finished` once the run is over: returned by the
    /// step that finished it and by every later call.  Any other error is
    /// fatal.
    pub fn step(&mut self, time_step: f32) -> IntegratorResult<()> {
        match self.phase {
            Phase::Finished => return Err(IntegratorError::Finished),
            Phase::Constructing => {
                tracing::info!(
                    agents = self.fsm.agent_count(),
                    time_step,
                    sub_steps = self.sim.sub_steps(),
                    max_duration = ?self.max_duration,
                    "simulation started"
                );
                self.phase = Phase::Running;
            }
            Phase::Running => {}
        }

        let mut clock = *self.sim.clock();
        clock.time_step = time_step;

        let all_final = self
            .fsm
            .do_step(self.sim.agents_mut(), &mut self.rngs, &clock)
            .inspect_err(|e| tracing::error!(error = %e, time = clock.time, "behavior step failed"))?;

        self.sim.do_step(time_step)?;

        let now = self.sim.global_time();
        self.fsm
            .do_tasks(self.sim.agents(), now)
            .inspect_err(|e| tracing::error!(error = %e, time = now, "task phase failed"))?;

        let timed_out = self.max_duration.is_some_and(|max| now >= max);
        if all_final || timed_out {
            self.phase = Phase::Finished;
            tracing::info!(time = now, steps = self.sim.clock().steps, all_final, "simulation finished");
            return Err(IntegratorError::Finished);
        }
        Ok(())
    }

    /// Step with the simulator's own time step until the run finishes.
    ///
    /// Without a `max_duration` this only returns once every agent reaches
    /// a final state.
    pub fn run<O: StepObserver>(&mut self, observer: &mut O) -> IntegratorResult<()> {
        if self.is_finished() {
            return Ok(());
        }
        loop {
            observer.on_step_start(self.sim.clock());
            let dt = self.sim.time_step();
            let result = self.step(dt);
            match result {
                Ok(()) => observer.on_step_end(self.sim.clock(), &self.fsm, self.sim.agents()),
                Err(IntegratorError::Finished) => {
                    observer.on_step_end(self.sim.clock(), &self.fsm, self.sim.agents());
                    observer.on_finished(self.sim.clock());
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }
    }
}
