//! `bfsm-sim`: drives a behavior FSM against a motion simulator.
//!
//! # Step loop
//!
//! ```text
//! loop:
//!   ① Decide   Fsm::do_step: events, then every agent advances through its
//!              transitions and writes a preferred velocity
//!              (parallel with the `parallel` feature).
//!   ② Move     Simulator::do_step: motion integration, clock advance.
//!   ③ Tasks    Fsm::do_tasks: each registered task runs once.
//!   ④ Finish?  every agent final, or global time ≥ max_duration
//!              → IntegratorError::Finished.
//! ```
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                        |
//! |------------|---------------------------------------------------------------|
//! | `parallel` | Runs the decision phase and the kinematic motion on Rayon.    |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use bfsm_agent::AgentStoreBuilder;
//! use bfsm_behavior::{Registry, Resources, load_behavior_file};
//! use bfsm_core::RunConfig;
//! use bfsm_sim::{IntegratorBuilder, NoopObserver};
//!
//! let behavior = load_behavior_file(path, &Registry::default(), &Resources::new())?;
//! let (store, rngs) = AgentStoreBuilder::new(100, config.seed).build();
//! let mut integrator = IntegratorBuilder::new(config, store, rngs, behavior).build()?;
//! integrator.run(&mut NoopObserver)?;
//! ```

pub mod builder;
pub mod error;
pub mod integrator;
pub mod observer;
pub mod simulator;

#[cfg(test)]
mod tests;

pub use builder::IntegratorBuilder;
pub use error::{IntegratorError, IntegratorResult, SimError, SimResult};
pub use integrator::{Integrator, Phase};
pub use observer::{NoopObserver, StepObserver};
pub use simulator::{KinematicSimulator, Simulator};
