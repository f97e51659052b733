use bfsm_behavior::{BuildError, FsmError};
use bfsm_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("time step must be positive and finite, got {0}")]
    InvalidTimeStep(f32),
}

pub type SimResult<T> = Result<T, SimError>;

/// Everything [`Integrator::step`](crate::Integrator::step) can report.
///
/// `Finished` is a control signal, not a failure: the run reached its end
/// and the driving loop should stop.  Every other variant leaves the
/// simulation unusable.
#[derive(Debug, Error)]
pub enum IntegratorError {
    #[error("simulation finished")]
    Finished,

    #[error("fatal behavior error: {0}")]
    Fatal(#[from] FsmError),

    #[error("simulator error: {0}")]
    Simulator(#[from] SimError),

    #[error("building the behavior failed: {0}")]
    Build(#[from] BuildError),

    #[error("invalid run configuration: {0}")]
    Config(#[from] CoreError),
}

impl IntegratorError {
    #[inline]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, IntegratorError::Finished)
    }
}

pub type IntegratorResult<T> = Result<T, IntegratorError>;
