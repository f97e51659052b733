//! Step observer trait for progress reporting and data collection.

use bfsm_agent::AgentStore;
use bfsm_behavior::Fsm;
use bfsm_core::SimClock;

/// Callbacks invoked by [`Integrator::run`][crate::Integrator::run] around
/// every step.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example: progress printer
///
/// ```rust,ignore
/// struct Progress { every: u64 }
///
/// impl StepObserver for Progress {
///     fn on_step_end(&mut self, clock: &SimClock, fsm: &Fsm, _: &AgentStore) {
///         if clock.steps % self.every == 0 {
///             let done = fsm.states().iter().filter(|s| s.is_final()).map(|s| s.population()).sum::<usize>();
///             println!("{clock}: {done} agents done");
///         }
///     }
/// }
/// ```
pub trait StepObserver {
    /// Called before the step runs; `clock` is the time the step starts at.
    fn on_step_start(&mut self, _clock: &SimClock) {}

    /// Called after the step; `clock` has already advanced.
    fn on_step_end(&mut self, _clock: &SimClock, _fsm: &Fsm, _agents: &AgentStore) {}

    /// Called once, after the final step.
    fn on_finished(&mut self, _clock: &SimClock) {}
}

/// A [`StepObserver`] that does nothing.
pub struct NoopObserver;

impl StepObserver for NoopObserver {}
