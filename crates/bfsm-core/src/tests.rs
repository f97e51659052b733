//! Unit tests for bfsm-core primitives.

#[cfg(test)]
mod ids {
    use crate::{AgentId, GoalId, StateId};

    #[test]
    fn index_roundtrip() {
        let id = AgentId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(AgentId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn default_is_invalid() {
        assert_eq!(StateId::default(), StateId::INVALID);
        assert!(!GoalId::default().is_valid());
        assert!(GoalId(0).is_valid());
    }

    #[test]
    fn display() {
        assert_eq!(StateId(7).to_string(), "StateId(7)");
    }
}

#[cfg(test)]
mod geo {
    use crate::{Shape, Vec2};

    #[test]
    fn circle_contains_and_distance() {
        let c = Shape::circle(Vec2::ZERO, 2.0);
        assert!(c.contains(Vec2::new(1.0, 1.0)));
        assert!(!c.contains(Vec2::new(3.0, 0.0)));
        assert_eq!(c.squared_distance(Vec2::new(1.0, 0.0)), 0.0);
        assert!((c.squared_distance(Vec2::new(5.0, 0.0)) - 9.0).abs() < 1e-5);
    }

    #[test]
    fn aabb_normalises_corners() {
        let b = Shape::aabb(Vec2::new(2.0, 2.0), Vec2::new(-1.0, 0.0));
        assert!(b.contains(Vec2::new(0.0, 1.0)));
        assert_eq!(b.nearest_point(Vec2::new(5.0, 1.0)), Vec2::new(2.0, 1.0));
        assert_eq!(b.centroid(), Vec2::new(0.5, 1.0));
    }

    #[test]
    fn obb_rotated_quarter_turn() {
        // 2x1 box rotated 90 degrees about the origin covers x in [-1, 0], y in [0, 2].
        let o = Shape::obb_degrees(Vec2::ZERO, Vec2::new(2.0, 1.0), 90.0);
        assert!(o.contains(Vec2::new(-0.5, 1.5)));
        assert!(!o.contains(Vec2::new(0.5, 1.5)));
        let c = o.centroid();
        assert!((c - Vec2::new(-0.5, 1.0)).length() < 1e-5, "got {c}");
    }

    #[test]
    fn point_distance() {
        let p = Shape::point(Vec2::new(3.0, 4.0));
        assert!((p.squared_distance(Vec2::ZERO) - 25.0).abs() < 1e-5);
    }
}

#[cfg(test)]
mod dist {
    use crate::{AgentId, AgentRng, FloatGenerator, Vec2, Vec2Generator};

    #[test]
    fn constant_is_constant() {
        let mut rng = AgentRng::new(1, AgentId(0));
        let g = FloatGenerator::constant(2.5);
        assert!((0..10).all(|_| g.sample(&mut rng) == 2.5));
    }

    #[test]
    fn uniform_stays_in_range() {
        let mut rng = AgentRng::new(9, AgentId(3));
        let g = FloatGenerator::uniform(1.0, 2.0).unwrap();
        for _ in 0..1000 {
            let v = g.sample(&mut rng);
            assert!((1.0..2.0).contains(&v), "got {v}");
        }
    }

    #[test]
    fn uniform_rejects_inverted_range() {
        assert!(FloatGenerator::uniform(2.0, 1.0).is_err());
    }

    #[test]
    fn normal_is_clamped_and_centred() {
        let mut rng = AgentRng::new(5, AgentId(0));
        let g = FloatGenerator::normal(1.0, 0.5, 0.0, 2.0).unwrap();
        let n = 4000;
        let mut sum = 0.0;
        for _ in 0..n {
            let v = g.sample(&mut rng);
            assert!((0.0..=2.0).contains(&v));
            sum += v;
        }
        let mean = sum / n as f32;
        assert!((mean - 1.0).abs() < 0.05, "mean {mean}");
    }

    #[test]
    fn disk_samples_inside() {
        let mut rng = AgentRng::new(2, AgentId(1));
        let g = Vec2Generator::disk(Vec2::new(1.0, 1.0), 0.5).unwrap();
        for _ in 0..500 {
            assert!(g.sample(&mut rng).distance(Vec2::new(1.0, 1.0)) <= 0.5 + 1e-5);
        }
    }
}

#[cfg(test)]
mod rng {
    use crate::{AgentId, AgentRng, SampleRng};

    #[test]
    fn same_seed_same_stream() {
        let mut a = AgentRng::new(77, AgentId(4));
        let mut b = AgentRng::new(77, AgentId(4));
        let xs: Vec<u64> = (0..8).map(|_| a.random()).collect();
        let ys: Vec<u64> = (0..8).map(|_| b.random()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn agents_get_distinct_streams() {
        let mut a = AgentRng::new(77, AgentId(0));
        let mut b = AgentRng::new(77, AgentId(1));
        assert_ne!(a.random::<u64>(), b.random::<u64>());
    }

    #[test]
    fn index_of_empty_is_none() {
        let mut a = AgentRng::new(0, AgentId(0));
        assert_eq!(a.index(0), None);
        assert!(a.index(3).unwrap() < 3);
    }
}

#[cfg(test)]
mod time {
    use crate::{RunConfig, SimClock};

    #[test]
    fn clock_advances_without_drift() {
        let mut clock = SimClock::new(0.1);
        for _ in 0..1000 {
            clock.advance();
        }
        assert_eq!(clock.steps, 1000);
        assert!((clock.time - 100.0).abs() < 1e-4, "got {}", clock.time);
    }

    #[test]
    fn mixed_step_lengths_keep_time_monotonic() {
        let mut clock = SimClock::new(0.1);
        clock.advance_by(0.5);
        assert!((clock.time - 0.5).abs() < 1e-6);
        clock.advance();
        assert!((clock.time - 0.6).abs() < 1e-6, "got {}", clock.time);
        clock.advance_by(0.1);
        assert!((clock.time - 0.7).abs() < 1e-6, "got {}", clock.time);
        clock.advance_by(0.05);
        clock.advance();
        assert!((clock.time - 0.85).abs() < 1e-6, "got {}", clock.time);
        assert_eq!(clock.steps, 5);
    }

    #[test]
    fn config_validation() {
        assert!(RunConfig::default().validate().is_ok());
        let bad = RunConfig { time_step: 0.0, ..RunConfig::default() };
        assert!(bad.validate().is_err());
        let bad = RunConfig { max_duration: Some(-1.0), ..RunConfig::default() };
        assert!(bad.validate().is_err());
    }
}
