//! Unit tests for cas-state.

use std::sync::Arc;

use cas_agent::{AgentRegistry, PopulationView};
use cas_core::BehaviorId;

use crate::*;

// ── Models ────────────────────────────────────────────────────────────────────

const A: BehaviorId = BehaviorId(0);
const B: BehaviorId = BehaviorId(1);

/// A flips to B with probability 0.5; B is absorbing.
fn coin() -> Arc<AgentRegistry> {
    let mut reg = AgentRegistry::new();
    let a = reg.add_agent("A", &[]).unwrap();
    let b = reg.add_agent("B", &[]).unwrap();
    let flip = reg.add_action("flip", |_| 0.5);
    reg.add_transition(a, flip, b).unwrap();
    Arc::new(reg)
}

/// A and B always swap.
fn swap() -> Arc<AgentRegistry> {
    let mut reg = AgentRegistry::new();
    let a = reg.add_agent("A", &[]).unwrap();
    let b = reg.add_agent("B", &[]).unwrap();
    let go = reg.add_action("go", |_| 1.0);
    reg.add_transition(a, go, b).unwrap();
    reg.add_transition(b, go, a).unwrap();
    Arc::new(reg)
}

/// S → I with 0.8·fraction(I), I → R with 0.25.
fn sir() -> Arc<AgentRegistry> {
    let mut reg = AgentRegistry::new();
    let s = reg.add_agent("S", &[]).unwrap();
    let i = reg.add_agent("I", &[]).unwrap();
    let r = reg.add_agent("R", &[]).unwrap();
    let infect = reg.add_action("infect", move |v: &dyn PopulationView| 0.8 * v.fraction_of(i));
    let recover = reg.add_action("recover", |_| 0.25);
    reg.add_transition(s, infect, i).unwrap();
    reg.add_transition(i, recover, r).unwrap();
    Arc::new(reg)
}

fn total<T: Eq + std::hash::Hash + Clone>(v: &cas_prob::ProbabilityVector<T>) -> f64 {
    v.iter().map(|(_, p)| p).sum()
}

// ── IndividualState ───────────────────────────────────────────────────────────

#[cfg(test)]
mod individual_tests {
    use approx::assert_abs_diff_eq;
    use cas_core::SimRng;
    use rustc_hash::FxHashSet;

    use super::*;

    #[test]
    fn rejects_unknown_behavior() {
        let err = IndividualState::new(coin(), vec![A, BehaviorId(7)]).unwrap_err();
        assert!(matches!(err, StateError::Registry(_)));
    }

    #[test]
    fn multiplicity_tracks_agents() {
        let s = IndividualState::new(coin(), vec![A, B, A]).unwrap();
        assert_eq!(s.multiplicity(), &[2, 1]);
        assert_eq!(s.size(), 3.0);
        assert_eq!(s.number_of(A), 2.0);
        assert_abs_diff_eq!(s.fraction_of(B), 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn pushed_and_built_states_are_the_same_key() {
        let reg = coin();
        let built = IndividualState::new(Arc::clone(&reg), vec![A, B]).unwrap();
        let pushed = IndividualState::empty(reg).push(A).push(B);
        let mut set = FxHashSet::default();
        set.insert(built.clone());
        set.insert(pushed.clone());
        assert_eq!(built, pushed);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn agent_order_is_identity() {
        let reg = coin();
        let ab = IndividualState::new(Arc::clone(&reg), vec![A, B]).unwrap();
        let ba = IndividualState::new(reg, vec![B, A]).unwrap();
        assert_ne!(ab, ba);
        assert_eq!(ab.to_counting(), ba.to_counting());
    }

    #[test]
    fn next_enumerates_joint_outcomes() {
        let reg = coin();
        let s = IndividualState::new(Arc::clone(&reg), vec![A, A]).unwrap();
        let next = s.next_default().unwrap();
        assert_eq!(next.len(), 4);
        for agents in [[A, A], [A, B], [B, A], [B, B]] {
            let target = IndividualState::new(Arc::clone(&reg), agents.to_vec()).unwrap();
            assert_abs_diff_eq!(next.probability(&target), 0.25, epsilon = 1e-12);
        }
    }

    #[test]
    fn next_is_complete_for_any_population() {
        let reg = sir();
        let agents = vec![BehaviorId(0), BehaviorId(0), BehaviorId(1), BehaviorId(2), BehaviorId(1)];
        let s = IndividualState::new(reg, agents).unwrap();
        let next = s.next_default().unwrap();
        assert_abs_diff_eq!(total(&next), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(next.total_probability(), 1.0, epsilon = 1e-9);
        // two S, two I, one absorbing R
        assert_eq!(next.len(), 16);
    }

    #[test]
    fn step_samples_every_agent() {
        let s = IndividualState::new(swap(), vec![A, B, B]).unwrap();
        let mut rng = SimRng::new(3);
        let next = s.step_default(&mut rng).unwrap();
        assert_eq!(next.agents(), &[B, A, A]);
    }

    #[test]
    fn step_preserves_population_size() {
        let reg = sir();
        let s = IndividualState::new(reg, vec![BehaviorId(0); 20].into_iter().chain([BehaviorId(1)]).collect()).unwrap();
        let mut rng = SimRng::new(11);
        let mut cur = s;
        for _ in 0..10 {
            cur = cur.step_default(&mut rng).unwrap();
            assert_eq!(cur.len(), 21);
            assert_eq!(cur.multiplicity().iter().sum::<u32>(), 21);
        }
    }
}

// ── CountingState ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod counting_tests {
    use approx::assert_abs_diff_eq;
    use cas_core::SimRng;

    use super::*;

    #[test]
    fn occupancy_length_is_checked() {
        let err = CountingState::new(coin(), &[1, 2, 3]).unwrap_err();
        assert_eq!(err, StateError::OccupancyLength { expected: 2, found: 3 });
    }

    #[test]
    fn negative_occupancy_is_rejected() {
        let err = CountingState::new(coin(), &[-4, 2]).unwrap_err();
        assert!(matches!(err, StateError::InvalidArgument(_)));
        let err = CountingState::new(coin(), &[i64::from(u32::MAX) + 1, 0]).unwrap_err();
        assert!(matches!(err, StateError::InvalidArgument(_)));
    }

    #[test]
    fn add_and_remove() {
        let s = CountingState::empty(coin()).add(A).add(A).add(B);
        assert_eq!(s.occupancy(), &[2, 1]);
        let s = s.remove(B);
        assert_eq!(s.occupancy(), &[2, 0]);
        assert_eq!(s.remove(B), s);
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn from_map_accumulates() {
        let s = CountingState::from_map(coin(), [(A, 2), (B, 1), (A, 1)]).unwrap();
        assert_eq!(s.occupancy(), &[3, 1]);
        assert!(CountingState::from_map(coin(), [(BehaviorId(5), 1)]).is_err());
    }

    #[test]
    fn from_map_rejects_overflowing_counts() {
        let err = CountingState::from_map(coin(), [(A, u32::MAX), (A, 1)]).unwrap_err();
        assert!(matches!(err, StateError::InvalidArgument(_)));
        let full = CountingState::from_map(coin(), [(A, u32::MAX), (B, 0)]).unwrap();
        assert_eq!(full.occupancy(), &[u32::MAX, 0]);
    }

    #[test]
    fn next_is_binomial() {
        let reg = coin();
        let s = CountingState::new(Arc::clone(&reg), &[2, 0]).unwrap();
        let next = s.next_default().unwrap();
        let at = |a, b| next.probability(&CountingState::new(Arc::clone(&reg), &[a, b]).unwrap());
        assert_abs_diff_eq!(at(2, 0), 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(at(1, 1), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(at(0, 2), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn next_is_complete_under_state_dependent_rates() {
        let s = CountingState::new(sir(), &[3, 2, 1]).unwrap();
        let next = s.next_default().unwrap();
        assert_abs_diff_eq!(total(&next), 1.0, epsilon = 1e-9);
        assert!(next.iter().all(|(c, _)| c.len() == 6));
    }

    #[test]
    fn agrees_with_individual_marginal() {
        let reg = sir();
        let ind = IndividualState::new(
            Arc::clone(&reg),
            vec![BehaviorId(0), BehaviorId(1), BehaviorId(0)],
        )
        .unwrap();
        let counted = ind.to_counting().next_default().unwrap();
        let projected = ind.next_default().unwrap().map(|s| s.to_counting());
        assert_eq!(counted.len(), projected.len());
        for (state, p) in counted.iter() {
            assert_abs_diff_eq!(projected.probability(state), p, epsilon = 1e-12);
        }
    }

    #[test]
    fn step_keeps_size() {
        let mut rng = SimRng::new(5);
        let mut cur = CountingState::new(sir(), &[40, 5, 0]).unwrap();
        for _ in 0..20 {
            cur = cur.step_default(&mut rng).unwrap();
            assert_eq!(cur.len(), 45);
        }
    }
}

// ── PopulationFraction ────────────────────────────────────────────────────────

#[cfg(test)]
mod fraction_tests {
    use approx::assert_abs_diff_eq;
    use rand::rngs::mock::StepRng;

    use super::*;

    #[test]
    fn validation() {
        assert!(PopulationFraction::new(coin(), vec![1.0]).is_err());
        assert!(PopulationFraction::new(coin(), vec![-0.1, 1.1]).is_err());
        assert!(PopulationFraction::new(coin(), vec![f64::NAN, 1.0]).is_err());
    }

    #[test]
    fn infinite_population_view() {
        let f = PopulationFraction::new(coin(), vec![0.3, 0.7]).unwrap();
        assert!(f.size().is_infinite());
        assert!(f.number_of(A).is_infinite());
        assert_eq!(f.fraction_of(B), 0.7);
        let g = PopulationFraction::new(coin(), vec![0.0, 1.0]).unwrap();
        assert_eq!(g.number_of(A), 0.0);
    }

    #[test]
    fn successor_multiplies_by_matrix() {
        let f = PopulationFraction::new(coin(), vec![1.0, 0.0]).unwrap();
        let g = f.successor_default().unwrap();
        assert_abs_diff_eq!(g.fraction_of(A), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(g.fraction_of(B), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn successor_conserves_mass() {
        let f = PopulationFraction::new(sir(), vec![0.9, 0.1, 0.0]).unwrap();
        let mut cur = f;
        for _ in 0..30 {
            cur = cur.successor_default().unwrap();
            assert_abs_diff_eq!(cur.fractions().iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn step_and_next_are_deterministic() {
        let f = PopulationFraction::new(coin(), vec![1.0, 0.0]).unwrap();
        let expected = f.successor_default().unwrap();
        let mut rng = StepRng::new(0, 1);
        assert_eq!(f.step_default(&mut rng).unwrap(), expected);
        let next = f.next_default().unwrap();
        assert_eq!(next.len(), 1);
        assert_eq!(next.probability(&expected), 1.0);
    }

    #[test]
    fn signed_zero_is_one_key() {
        let reg = coin();
        let pos = PopulationFraction::new(Arc::clone(&reg), vec![0.0, 1.0]).unwrap();
        let neg = PopulationFraction::new(reg, vec![-0.0, 1.0]).unwrap();
        assert_eq!(pos, neg);
    }

    #[test]
    fn of_view() {
        let reg = coin();
        let c = CountingState::new(Arc::clone(&reg), &[1, 3]).unwrap();
        let f = PopulationFraction::of(reg, &c).unwrap();
        assert_eq!(f.fractions(), &[0.25, 0.75]);
    }
}

// ── MixedState ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod mixed_tests {
    use approx::assert_abs_diff_eq;
    use cas_core::SimRng;

    use super::*;

    #[test]
    fn finite_rest_counts_tagged_agent() {
        let rest = CountingState::new(coin(), &[1, 1]).unwrap();
        let m = MixedState::new(A, rest).unwrap();
        assert_eq!(m.size(), 3.0);
        assert_eq!(m.number_of(A), 2.0);
        assert_abs_diff_eq!(m.fraction_of(A), 2.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn infinite_rest_dominates() {
        let rest = PopulationFraction::new(coin(), vec![0.2, 0.8]).unwrap();
        let m = MixedState::new(A, rest).unwrap();
        assert!(m.size().is_infinite());
        assert_eq!(m.fraction_of(A), 0.2);
    }

    #[test]
    fn rejects_unknown_agent() {
        let rest = CountingState::empty(coin());
        assert!(MixedState::new(BehaviorId(9), rest).is_err());
    }

    #[test]
    fn next_in_mean_field() {
        let reg = coin();
        let rest = PopulationFraction::new(Arc::clone(&reg), vec![1.0, 0.0]).unwrap();
        let m = MixedState::new(A, rest).unwrap();
        let next = m.next_default().unwrap();
        assert_eq!(next.len(), 2);
        assert_abs_diff_eq!(next.total_probability(), 1.0, epsilon = 1e-12);
        let moved = next.mass_where(|s| s.agent() == B);
        assert_abs_diff_eq!(moved, 0.5, epsilon = 1e-12);
        assert!(next.iter().all(|(s, _)| s.rest().fraction_of(B) == 0.5));
    }

    #[test]
    fn next_with_finite_rest_is_complete() {
        let rest = CountingState::new(sir(), &[2, 1, 0]).unwrap();
        let m = MixedState::new(BehaviorId(0), rest).unwrap();
        let next = m.next_default().unwrap();
        assert_abs_diff_eq!(total(&next), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn step_moves_agent_and_rest() {
        let rest = CountingState::new(swap(), &[0, 2]).unwrap();
        let m = MixedState::new(A, rest).unwrap();
        let next = m.step_default(&mut SimRng::new(1)).unwrap();
        assert_eq!(next.agent(), B);
        assert_eq!(next.rest().occupancy(), &[2, 0]);
    }
}

// ── Mean field ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod mean_field_tests {
    use approx::assert_abs_diff_eq;
    use cas_core::SimRng;

    use super::*;

    fn trajectory() -> Arc<MeanFieldTrajectory> {
        let initial = PopulationFraction::new(coin(), vec![1.0, 0.0]).unwrap();
        Arc::new(MeanFieldTrajectory::new(initial))
    }

    #[test]
    fn step_zero_is_initial() {
        let t = trajectory();
        assert_eq!(t.len(), 1);
        assert_eq!(t.get(0).unwrap(), t.initial());
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn extends_on_demand() {
        let t = trajectory();
        let f = t.get(4).unwrap();
        assert_eq!(t.len(), 5);
        assert_abs_diff_eq!(f.fraction_of(A), 0.0625, epsilon = 1e-12);
    }

    #[test]
    fn earlier_steps_are_never_recomputed() {
        let t = trajectory();
        let late = t.get(6).unwrap();
        let early = t.get(2).unwrap();
        assert_eq!(t.len(), 7);
        assert_eq!(t.get(6).unwrap(), late);
        assert_eq!(t.get(2).unwrap(), early);
        assert_eq!(t.len(), 7);
    }

    #[test]
    fn matches_repeated_successor() {
        let initial = PopulationFraction::new(sir(), vec![0.95, 0.05, 0.0]).unwrap();
        let t = MeanFieldTrajectory::new(initial.clone());
        let mut cur = initial;
        for k in 1..=10 {
            cur = cur.successor_default().unwrap();
            assert_eq!(t.get(k).unwrap(), cur);
        }
    }

    #[test]
    fn state_advances_along_trajectory() {
        let t = trajectory();
        let s0 = MeanFieldState::start(Arc::clone(&t));
        let s1 = s0.step_default(&mut SimRng::new(0)).unwrap();
        assert_eq!(s1.time(), 1);
        assert_abs_diff_eq!(s1.fraction_of(A), 0.5, epsilon = 1e-12);
        assert_eq!(s1, MeanFieldState::new(Arc::clone(&t), 1).unwrap());
        let next = s1.next_default().unwrap();
        assert_eq!(next.probability(&MeanFieldState::new(t, 2).unwrap()), 1.0);
    }

    #[test]
    fn states_of_distinct_trajectories_differ() {
        let s = MeanFieldState::start(trajectory());
        let t = MeanFieldState::start(trajectory());
        assert_ne!(s, t);
        assert_eq!(s.fraction(), t.fraction());
    }
}
