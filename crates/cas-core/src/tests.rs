//! Unit tests for cas-core primitives.

#[cfg(test)]
mod ids {
    use crate::{ActionId, BehaviorId, ReplicaId};

    #[test]
    fn index_roundtrip() {
        let id = BehaviorId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(BehaviorId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn ordering() {
        assert!(BehaviorId(0) < BehaviorId(1));
        assert!(ActionId(100) > ActionId(99));
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(BehaviorId::INVALID.0, u32::MAX);
        assert_eq!(ActionId::INVALID.0, u32::MAX);
        assert_eq!(ReplicaId::INVALID.0, u64::MAX);
        assert_eq!(BehaviorId::default(), BehaviorId::INVALID);
    }

    #[test]
    fn display() {
        assert_eq!(BehaviorId(7).to_string(), "BehaviorId(7)");
        assert_eq!(ReplicaId(3).to_string(), "ReplicaId(3)");
    }
}

#[cfg(test)]
mod rng {
    use rand::Rng;

    use crate::{replica_seed, ReplicaId, SimRng};

    #[test]
    fn deterministic_same_seed() {
        let mut r1 = SimRng::new(12345);
        let mut r2 = SimRng::new(12345);
        for _ in 0..100 {
            assert_eq!(r1.r#gen::<f64>(), r2.r#gen::<f64>());
        }
    }

    #[test]
    fn replicas_get_distinct_seeds() {
        let a = replica_seed(1, ReplicaId(0));
        let b = replica_seed(1, ReplicaId(1));
        assert_ne!(a, b);
        // Replica 0 keeps the job seed unchanged.
        assert_eq!(a, 1);
    }

    #[test]
    fn replica_rng_is_reproducible() {
        let mut r1 = SimRng::for_replica(9, ReplicaId(4));
        let mut r2 = SimRng::for_replica(9, ReplicaId(4));
        let a: Vec<f64> = (0..10).map(|_| r1.r#gen::<f64>()).collect();
        let b: Vec<f64> = (0..10).map(|_| r2.r#gen::<f64>()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn unit_draws_in_bounds() {
        let mut rng = SimRng::new(0);
        for _ in 0..1000 {
            let v = rng.r#gen::<f64>();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn neighbouring_replicas_diverge() {
        let mut r0 = SimRng::for_replica(5, ReplicaId(0));
        let mut r1 = SimRng::for_replica(5, ReplicaId(1));
        assert_ne!(r0.r#gen::<f64>(), r1.r#gen::<f64>());
    }
}

#[cfg(test)]
mod config {
    use crate::SimConfig;

    #[test]
    fn default_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_sample_interval_rejected() {
        let cfg = SimConfig { sample_interval: 0, ..SimConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn samples_include_initial_state() {
        let cfg = SimConfig { steps: 10, sample_interval: 5, ..SimConfig::default() };
        assert_eq!(cfg.samples_per_trajectory(), 3);
    }
}
