//! Unit tests for bfsm-agent.

#[cfg(test)]
mod props {
    use crate::{AgentProperties, AgentProperty};

    #[test]
    fn names_roundtrip() {
        for p in AgentProperty::ALL {
            assert_eq!(p.name().parse::<AgentProperty>().unwrap(), p);
        }
        assert_eq!("r".parse::<AgentProperty>().unwrap(), AgentProperty::Radius);
    }

    #[test]
    fn unknown_name_is_error() {
        assert!("radius".parse::<AgentProperty>().is_err());
    }

    #[test]
    fn get_set_each_property() {
        let mut props = AgentProperties::default();
        for (i, p) in AgentProperty::ALL.into_iter().enumerate() {
            props.set(p, i as f32 + 0.5);
        }
        for (i, p) in AgentProperty::ALL.into_iter().enumerate() {
            assert_eq!(props.get(p), i as f32 + 0.5, "{p}");
        }
    }
}

#[cfg(test)]
mod pref_velocity {
    use crate::PrefVelocity;
    use glam::Vec2;

    #[test]
    fn single_direction_is_normalised() {
        let mut pv = PrefVelocity::default();
        pv.set_single(Vec2::new(3.0, 4.0));
        pv.speed = 2.0;
        assert!(pv.is_single());
        assert!((pv.velocity() - Vec2::new(1.2, 1.6)).length() < 1e-5);
    }

    #[test]
    fn idle_has_zero_velocity() {
        let mut pv = PrefVelocity::default();
        pv.set_single(Vec2::X);
        pv.speed = 1.0;
        pv.set_idle(Vec2::new(2.0, 2.0));
        assert_eq!(pv.velocity(), Vec2::ZERO);
        assert_eq!(pv.target, Vec2::new(2.0, 2.0));
    }

    #[test]
    fn arc_membership() {
        let mut pv = PrefVelocity::default();
        pv.set_arc(Vec2::Y, Vec2::X, Vec2::new(1.0, 1.0));
        assert!(pv.arc_contains(Vec2::new(1.0, 0.5)));
        assert!(!pv.arc_contains(Vec2::new(-1.0, 0.5)));
    }
}

#[cfg(test)]
mod builder {
    use crate::{AgentProperties, AgentStoreBuilder};
    use glam::Vec2;

    #[test]
    fn correct_count() {
        let (store, rngs) = AgentStoreBuilder::new(500, 1).build();
        assert_eq!(store.count, 500);
        assert_eq!(store.bodies.len(), 500);
        assert_eq!(store.props.len(), 500);
        assert_eq!(store.pref_velocity.len(), 500);
        assert_eq!(rngs.len(), 500);
    }

    #[test]
    fn zero_agents() {
        let (store, rngs) = AgentStoreBuilder::new(0, 0).build();
        assert!(store.is_empty());
        assert!(rngs.is_empty());
    }

    #[test]
    fn placement_and_properties_applied() {
        let (store, _) = AgentStoreBuilder::new(3, 0)
            .properties(AgentProperties { pref_speed: 0.7, ..Default::default() })
            .place(|i| (Vec2::new(i as f32, 1.0), (i % 2) as u32))
            .build();
        assert_eq!(store.bodies[2].pos, Vec2::new(2.0, 1.0));
        assert_eq!(store.bodies[1].class, 1);
        assert!(store.props.iter().all(|p| p.pref_speed == 0.7));
    }
}

#[cfg(test)]
mod store {
    use crate::{AgentBody, AgentProperties, AgentStore, AgentStoreBuilder};
    use bfsm_core::AgentId;
    use glam::Vec2;

    #[test]
    fn agent_ids_iterator() {
        let (store, _) = AgentStoreBuilder::new(3, 0).build();
        let ids: Vec<AgentId> = store.agent_ids().collect();
        assert_eq!(ids, vec![AgentId(0), AgentId(1), AgentId(2)]);
    }

    #[test]
    fn push_assigns_dense_ids() {
        let mut store = AgentStore::default();
        let a = store.push(AgentBody::at(Vec2::ONE), AgentProperties::default());
        let b = store.push(AgentBody::default(), AgentProperties::default());
        assert_eq!((a, b), (AgentId(0), AgentId(1)));
        assert_eq!(store.count, 2);
        assert_eq!(store.pref_velocity.len(), 2);
    }

    #[test]
    fn agent_mut_writes_properties() {
        let (mut store, _) = AgentStoreBuilder::new(2, 0).build();
        {
            let agent = store.agent_mut(AgentId(1)).unwrap();
            agent.props.max_speed = 9.0;
        }
        assert_eq!(store.props[1].max_speed, 9.0);
        assert!(store.agent_mut(AgentId(2)).is_none());
    }
}

#[cfg(test)]
mod rngs {
    use crate::{AgentRngs, AgentStoreBuilder};
    use bfsm_core::AgentId;

    #[test]
    fn per_agent_determinism() {
        let (_, mut rngs1) = AgentStoreBuilder::new(10, 999).build();
        let (_, mut rngs2) = AgentStoreBuilder::new(10, 999).build();
        for i in 0..10u32 {
            let a: f32 = rngs1.get_mut(AgentId(i)).unwrap().random();
            let b: f32 = rngs2.get_mut(AgentId(i)).unwrap().random();
            assert_eq!(a, b, "agent {i} RNG should be deterministic");
        }
    }

    #[test]
    fn resize_keeps_new_streams_deterministic() {
        let mut grown = AgentRngs::new(2, 5);
        grown.resize(4);
        let mut fresh = AgentRngs::new(4, 5);
        let a: u64 = grown.get_mut(AgentId(3)).unwrap().random();
        let b: u64 = fresh.get_mut(AgentId(3)).unwrap().random();
        assert_eq!(a, b);
        grown.resize(1);
        assert_eq!(grown.len(), 1);
        assert!(grown.get_mut(AgentId(3)).is_none());
    }
}
