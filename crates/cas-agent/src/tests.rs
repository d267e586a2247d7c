//! Unit tests for cas-agent.

use cas_core::BehaviorId;

use crate::{AgentName, AgentRegistry, PopulationView, RegistryError};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Plain occupancy vector standing in for a collective state.
struct Occupancy(Vec<f64>);

impl PopulationView for Occupancy {
    fn behavior_count(&self) -> usize {
        self.0.len()
    }

    fn size(&self) -> f64 {
        self.0.iter().sum()
    }

    fn number_of(&self, behavior: BehaviorId) -> f64 {
        self.0.get(behavior.index()).copied().unwrap_or(0.0)
    }
}

/// S → I with probability 0.5·fraction(I), I → R with fixed 0.1.
fn sir() -> (AgentRegistry, [BehaviorId; 3]) {
    let mut reg = AgentRegistry::new();
    let s = reg.add_agent("S", &[]).unwrap();
    let i = reg.add_agent("I", &[]).unwrap();
    let r = reg.add_agent("R", &[]).unwrap();
    let infect = reg.add_action("infect", move |v: &dyn PopulationView| 0.5 * v.fraction_of(i));
    let recover = reg.add_action("recover", |_: &dyn PopulationView| 0.1);
    reg.add_transition(s, infect, i).unwrap();
    reg.add_transition(i, recover, r).unwrap();
    (reg, [s, i, r])
}

// ── Names ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod name_tests {
    use super::*;

    #[test]
    fn display_with_and_without_indexes() {
        assert_eq!(AgentName::plain("A").to_string(), "A");
        assert_eq!(AgentName::new("Cell", &[1, 2]).to_string(), "Cell[1,2]");
    }

    #[test]
    fn arity_is_index_count() {
        assert_eq!(AgentName::new("A", &[4, 5, 6]).arity(), 3);
    }
}

// ── Registration ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod registration_tests {
    use super::*;

    #[test]
    fn ids_are_dense_and_sequential() {
        let (reg, [s, i, r]) = sir();
        assert_eq!((s, i, r), (BehaviorId(0), BehaviorId(1), BehaviorId(2)));
        assert_eq!(reg.behavior_count(), 3);
        assert_eq!(reg.behavior(i).unwrap().name, AgentName::plain("I"));
    }

    #[test]
    fn add_agent_is_idempotent() {
        let mut reg = AgentRegistry::new();
        let a = reg.add_agent("A", &[1]).unwrap();
        let again = reg.add_agent("A", &[1]).unwrap();
        assert_eq!(a, again);
        assert_eq!(reg.behavior_count(), 1);
        let b = reg.add_agent("A", &[2]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn arity_conflict_is_rejected_without_side_effects() {
        let mut reg = AgentRegistry::new();
        reg.add_agent("A", &[0, 1]).unwrap();
        let err = reg.add_agent("A", &[0, 1, 2]).unwrap_err();
        assert_eq!(
            err,
            RegistryError::InconsistentArity { family: "A".into(), expected: 2, found: 3 }
        );
        assert_eq!(reg.behavior_count(), 1);
        assert_eq!(reg.arity("A"), Some(2));
        assert!(reg.agent_index("A", &[0, 1, 2]).is_none());
    }

    #[test]
    fn lookups_by_name() {
        let (reg, [_, i, _]) = sir();
        assert_eq!(reg.agent_index("I", &[]), Some(i));
        assert_eq!(reg.agent(&AgentName::plain("I")).unwrap().id, i);
        assert!(reg.agent_index("Z", &[]).is_none());
        assert_eq!(reg.arity("Z"), None);
    }

    #[test]
    fn add_action_is_idempotent_by_name() {
        let mut reg = AgentRegistry::new();
        let a = reg.add_action("go", |_| 0.3);
        let b = reg.add_action("go", |_| 0.9);
        assert_eq!(a, b);
        assert_eq!(reg.action_count(), 1);
        // The first function is kept.
        let probs = reg.action_probabilities(&Occupancy(vec![]));
        assert_eq!(probs, vec![0.3]);
    }

    #[test]
    fn set_action_probability_replaces_function() {
        let mut reg = AgentRegistry::new();
        reg.declare_action("go");
        assert_eq!(reg.action_probabilities(&Occupancy(vec![])), vec![0.0]);
        reg.set_action_probability("go", |_| 0.4).unwrap();
        assert_eq!(reg.action_probabilities(&Occupancy(vec![])), vec![0.4]);
        assert!(matches!(
            reg.set_action_probability("stop", |_| 0.1),
            Err(RegistryError::UnknownAction(_))
        ));
    }

    #[test]
    fn transition_to_unknown_agent_fails() {
        let (mut reg, [s, _, _]) = sir();
        let infect = reg.action("infect").unwrap().id;
        assert!(reg.add_transition(s, infect, BehaviorId(99)).is_err());
    }

    #[test]
    fn agent_step_over_parametrised_family() {
        let mut reg = AgentRegistry::new();
        for k in 0..4 {
            reg.add_agent("N", &[k]).unwrap();
        }
        let hop = reg.add_action("hop", |_| 1.0);
        // N[k] -> N[k+1] for k < 3.
        let added = reg
            .add_agent_step("N", |idx| idx[0] < 3, hop, |idx| AgentName::new("N", &[idx[0] + 1]))
            .unwrap();
        assert_eq!(added, 3);
        let n0 = reg.agent_index("N", &[0]).unwrap();
        let n1 = reg.agent_index("N", &[1]).unwrap();
        assert_eq!(reg.behavior(n0).unwrap().transitions, vec![(hop, n1)]);
    }

    #[test]
    fn agent_step_with_unknown_target_changes_nothing() {
        let mut reg = AgentRegistry::new();
        reg.add_agent("N", &[0]).unwrap();
        reg.add_agent("N", &[1]).unwrap();
        let hop = reg.add_action("hop", |_| 1.0);
        let r = reg.add_agent_step("N", |_| true, hop, |idx| AgentName::new("N", &[idx[0] + 1]));
        assert!(r.is_err());
        assert!(reg.behaviors().iter().all(|b| b.transitions.is_empty()));
    }

    #[test]
    fn behaviors_where_filters_by_name() {
        let mut reg = AgentRegistry::new();
        reg.add_agent("A", &[]).unwrap();
        let b = reg.add_agent("B", &[]).unwrap();
        assert_eq!(reg.behaviors_where(|n| n.family == "B"), vec![b]);
    }
}

// ── Probabilities ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod probability_tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn action_probabilities_follow_state() {
        let (reg, _) = sir();
        let probs = reg.action_probabilities(&Occupancy(vec![5.0, 5.0, 0.0]));
        assert_abs_diff_eq!(probs[0], 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(probs[1], 0.1, epsilon = 1e-12);
    }

    #[test]
    fn matrix_rows_complete_with_self_loop() {
        let (reg, [s, i, r]) = sir();
        let state = Occupancy(vec![5.0, 5.0, 0.0]);
        let mut m = reg.agent_probability_matrix(&state);
        let row_s = m.row_of(&s).unwrap();
        assert_abs_diff_eq!(row_s.probability(&i), 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(row_s.probability(&s), 0.75, epsilon = 1e-12);
        let row_r = m.row_of(&r).unwrap();
        assert_abs_diff_eq!(row_r.probability(&r), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_probability_actions_are_skipped() {
        let (reg, [s, i, _]) = sir();
        let state = Occupancy(vec![10.0, 0.0, 0.0]);
        let mut m = reg.agent_probability_matrix(&state);
        let row = m.row_of(&s).unwrap();
        assert_eq!(row.len(), 1);
        assert_eq!(row.probability(&i), 0.0);
    }

    #[test]
    fn outgoing_mass_above_one_is_an_error() {
        let mut reg = AgentRegistry::new();
        let a = reg.add_agent("A", &[]).unwrap();
        let b = reg.add_agent("B", &[]).unwrap();
        let x = reg.add_action("x", |_| 0.7);
        let y = reg.add_action("y", |_| 0.7);
        reg.add_transition(a, x, b).unwrap();
        reg.add_transition(a, y, b).unwrap();
        let mut m = reg.agent_probability_matrix(&Occupancy(vec![1.0, 0.0]));
        assert!(m.row_of(&a).is_err());
    }

    #[test]
    fn functions_are_reevaluated_per_state() {
        let (reg, [s, i, _]) = sir();
        let mut early = reg.agent_probability_matrix(&Occupancy(vec![9.0, 1.0, 0.0]));
        let mut late = reg.agent_probability_matrix(&Occupancy(vec![1.0, 9.0, 0.0]));
        let p_early = early.row_of(&s).unwrap().probability(&i);
        let p_late = late.row_of(&s).unwrap().probability(&i);
        assert!(p_late > p_early);
    }

    #[test]
    fn unknown_behavior_row_is_self_loop() {
        let (reg, _) = sir();
        let mut m = reg.agent_probability_matrix(&Occupancy(vec![1.0, 0.0, 0.0]));
        let ghost = BehaviorId(42);
        assert_eq!(m.row_of(&ghost).unwrap().probability(&ghost), 1.0);
    }
}

// ── Population helpers ────────────────────────────────────────────────────────

#[cfg(test)]
mod population_tests {
    use super::*;

    #[test]
    fn multiplicity_counts_each_behavior() {
        let (reg, [s, i, _]) = sir();
        assert_eq!(reg.multiplicity(&[s, i, s, s]), vec![3, 1, 0]);
    }

    #[test]
    fn fractions_and_measures() {
        let (reg, [_, i, _]) = sir();
        let state = Occupancy(vec![2.0, 6.0, 2.0]);
        assert_eq!(reg.fractions_of(&state), vec![0.2, 0.6, 0.2]);
        let measures = reg.measures();
        assert_eq!(measures.len(), 3);
        assert_eq!(measures[1].name, "%I");
        assert_eq!(measures[1].evaluate(&state), state.fraction_of(i));
    }

    #[test]
    fn view_predicates() {
        let state = Occupancy(vec![2.0, 6.0, 2.0]);
        assert_eq!(state.number_where(&|b| b.0 != 1), 4.0);
        assert!((state.fraction_where(&|b| b.0 >= 1) - 0.8).abs() < 1e-12);
        assert_eq!(Occupancy(vec![0.0]).fraction_of(BehaviorId(0)), 0.0);
    }
}
