//! Fluent builder for constructing `AgentStore` + `AgentRngs` in one step.
//!
//! # Usage
//!
//! ```rust
//! use bfsm_agent::{AgentProperties, AgentStoreBuilder};
//! use glam::Vec2;
//!
//! let (store, rngs) = AgentStoreBuilder::new(100, /*seed=*/ 42)
//!     .properties(AgentProperties { pref_speed: 1.2, ..Default::default() })
//!     .place(|i| (Vec2::new(i as f32, 0.0), 0))
//!     .build();
//!
//! assert_eq!(store.count, 100);
//! assert_eq!(rngs.len(),  100);
//! ```

use glam::Vec2;

use crate::{AgentBody, AgentProperties, AgentRngs, AgentStore, PrefVelocity};

type Placement = Box<dyn Fn(usize) -> (Vec2, u32)>;

pub struct AgentStoreBuilder {
    count: usize,
    seed:  u64,
    props: AgentProperties,
    place: Option<Placement>,
}

impl AgentStoreBuilder {
    /// Create a builder for `count` agents using `seed` as the global RNG seed.
    pub fn new(count: usize, seed: u64) -> Self {
        Self { count, seed, props: AgentProperties::default(), place: None }
    }

    /// Properties every agent starts with.
    pub fn properties(mut self, props: AgentProperties) -> Self {
        self.props = props;
        self
    }

    /// Initial position and class for agent `i`.  Without it every agent
    /// starts at the origin in class 0.
    pub fn place(mut self, f: impl Fn(usize) -> (Vec2, u32) + 'static) -> Self {
        self.place = Some(Box::new(f));
        self
    }

    pub fn build(self) -> (AgentStore, AgentRngs) {
        let bodies: Vec<AgentBody> = (0..self.count)
            .map(|i| match &self.place {
                Some(f) => {
                    let (pos, class) = f(i);
                    AgentBody { pos, class, ..AgentBody::default() }
                }
                None => AgentBody::default(),
            })
            .collect();

        let store = AgentStore {
            count: self.count,
            bodies,
            props: vec![self.props; self.count],
            pref_velocity: vec![PrefVelocity::default(); self.count],
        };
        let rngs = AgentRngs::new(self.count, self.seed);

        (store, rngs)
    }
}
