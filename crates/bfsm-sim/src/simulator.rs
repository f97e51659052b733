//! The simulator collaborator and a reference kinematic implementation.

use bfsm_agent::{AgentBody, AgentProperties, AgentStore, PrefVelocity};
use bfsm_core::SimClock;
use glam::Vec2;

use crate::{SimError, SimResult};

/// What the integrator needs from a motion simulator.
///
/// The simulator owns the agent store and the clock.  The FSM writes each
/// agent's preferred velocity during the decision phase; `do_step` turns
/// those into motion and advances the clock.
pub trait Simulator: Send {
    fn agents(&self) -> &AgentStore;

    fn agents_mut(&mut self) -> &mut AgentStore;

    fn clock(&self) -> &SimClock;

    #[inline]
    fn global_time(&self) -> f32 {
        self.clock().time
    }

    #[inline]
    fn time_step(&self) -> f32 {
        self.clock().time_step
    }

    /// Extra motion sub-steps taken inside each step.
    fn sub_steps(&self) -> u32;

    /// Integrate motion over `dt` seconds and advance the clock.
    fn do_step(&mut self, dt: f32) -> SimResult<()>;
}

// ── KinematicSimulator ────────────────────────────────────────────────────────

/// Moves every agent toward its preferred velocity with no collision
/// avoidance.  Speed is capped at `max_speed` and the velocity change per
/// sub-step at `max_accel * sub_dt`.
pub struct KinematicSimulator {
    agents:    AgentStore,
    clock:     SimClock,
    sub_steps: u32,
}

impl KinematicSimulator {
    pub fn new(agents: AgentStore, clock: SimClock, sub_steps: u32) -> Self {
        Self { agents, clock, sub_steps }
    }

    pub fn into_agents(self) -> AgentStore {
        self.agents
    }

    fn integrate(&mut self, sub_dt: f32) {
        let AgentStore { bodies, props, pref_velocity, .. } = &mut self.agents;

        #[cfg(not(feature = "parallel"))]
        {
            bodies
                .iter_mut()
                .zip(props.iter())
                .zip(pref_velocity.iter())
                .for_each(|((body, props), pref)| move_body(body, props, pref, sub_dt));
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            bodies
                .par_iter_mut()
                .zip(props.par_iter())
                .zip(pref_velocity.par_iter())
                .for_each(|((body, props), pref)| move_body(body, props, pref, sub_dt));
        }
    }
}

impl Simulator for KinematicSimulator {
    fn agents(&self) -> &AgentStore {
        &self.agents
    }

    fn agents_mut(&mut self) -> &mut AgentStore {
        &mut self.agents
    }

    fn clock(&self) -> &SimClock {
        &self.clock
    }

    fn sub_steps(&self) -> u32 {
        self.sub_steps
    }

    fn do_step(&mut self, dt: f32) -> SimResult<()> {
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(SimError::InvalidTimeStep(dt));
        }
        let parts = self.sub_steps + 1;
        let sub_dt = dt / parts as f32;
        for _ in 0..parts {
            self.integrate(sub_dt);
        }
        self.clock.advance_by(dt);
        Ok(())
    }
}

fn move_body(body: &mut AgentBody, props: &AgentProperties, pref: &PrefVelocity, dt: f32) {
    let desired = pref.velocity().clamp_length_max(props.max_speed.max(0.0));
    let max_dv = props.max_accel.max(0.0) * dt;
    let dv = (desired - body.vel).clamp_length_max(max_dv);
    body.vel += dv;
    body.pos += body.vel * dt;
    if body.vel != Vec2::ZERO {
        body.orient = body.vel.normalize();
    }
}
