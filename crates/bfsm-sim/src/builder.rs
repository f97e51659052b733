//! Fluent builder for constructing an [`Integrator`].

use bfsm_agent::{AgentRngs, AgentStore};
use bfsm_behavior::{BehaviorDescription, Task, build_fsm};
use bfsm_core::{RunConfig, SimClock};

use crate::{Integrator, IntegratorResult, KinematicSimulator, Simulator};

/// Fluent builder for [`Integrator<S>`].
///
/// # Required inputs
///
/// - [`RunConfig`]: step length, sub-steps, max duration, seed
/// - [`AgentStore`] + [`AgentRngs`]: from [`bfsm_agent::AgentStoreBuilder`]
/// - [`BehaviorDescription`]: loaded from TOML or assembled in code
///
/// # Optional inputs
///
/// | Method        | Default        |
/// |---------------|----------------|
/// | `.task(t)`    | no extra tasks |
///
/// # Example
///
/// ```rust,ignore
/// let (store, rngs) = AgentStoreBuilder::new(n, config.seed).build();
/// let mut integrator = IntegratorBuilder::new(config, store, rngs, behavior).build()?;
/// integrator.run(&mut NoopObserver)?;
/// ```
pub struct IntegratorBuilder {
    config:   RunConfig,
    agents:   AgentStore,
    rngs:     AgentRngs,
    behavior: BehaviorDescription,
}

impl IntegratorBuilder {
    pub fn new(
        config:   RunConfig,
        agents:   AgentStore,
        rngs:     AgentRngs,
        behavior: BehaviorDescription,
    ) -> Self {
        Self { config, agents, rngs, behavior }
    }

    /// Register an extra task alongside the ones the behavior elements ask
    /// for.  Equivalent tasks are still only run once.
    pub fn task(mut self, task: Box<dyn Task>) -> Self {
        self.behavior.add_task(task);
        self
    }

    /// Build with the reference [`KinematicSimulator`].
    pub fn build(self) -> IntegratorResult<Integrator<KinematicSimulator>> {
        self.build_with(KinematicSimulator::new)
    }

    /// Validate the config, build the FSM (placing every agent in its
    /// initial state), and hand the agents to the simulator `make` returns.
    pub fn build_with<S, F>(self, make: F) -> IntegratorResult<Integrator<S>>
    where
        S: Simulator,
        F: FnOnce(AgentStore, SimClock, u32) -> S,
    {
        self.config.validate()?;
        let Self { config, mut agents, mut rngs, behavior } = self;

        let clock = config.make_clock();
        let fsm = build_fsm(behavior, &mut agents, &mut rngs, &clock)?;
        let sim = make(agents, clock, config.sub_steps);
        Ok(Integrator::new(fsm, sim, rngs, config.max_duration))
    }
}
