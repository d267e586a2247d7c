//! `PopulationFraction` — the infinite-population limit.
//!
//! Only the fraction of agents per behavior is kept.  Evolution is
//! deterministic: the successor of `f` under `P` is `f × P`, so `step`
//! ignores its generator and `next` is a Dirac.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use cas_agent::{AgentRegistry, PopulationView};
use cas_core::BehaviorId;
use cas_prob::{ProbabilityMatrix, ProbabilityVector};
use rand::Rng;

use crate::{CollectiveState, StateError, StateResult};

#[derive(Clone, Debug)]
pub struct PopulationFraction {
    registry:  Arc<AgentRegistry>,
    fractions: Vec<f64>,
}

impl PopulationFraction {
    /// One non-negative, finite fraction per registered behavior.
    pub fn new(registry: Arc<AgentRegistry>, fractions: Vec<f64>) -> StateResult<Self> {
        let expected = registry.behavior_count();
        if fractions.len() != expected {
            return Err(StateError::OccupancyLength { expected, found: fractions.len() });
        }
        if let Some(&bad) = fractions.iter().find(|f| !f.is_finite() || **f < 0.0) {
            return Err(StateError::InvalidArgument(format!("fraction {bad} is not in [0, +inf)")));
        }
        // Fold -0.0 into 0.0 so bitwise equality agrees with numeric equality.
        let fractions = fractions.into_iter().map(|f| f + 0.0).collect();
        Ok(Self { registry, fractions })
    }

    /// Fractions observed in `view`.
    pub fn of(registry: Arc<AgentRegistry>, view: &dyn PopulationView) -> StateResult<Self> {
        let fractions = registry.fractions_of(view);
        Self::new(registry, fractions)
    }

    #[inline]
    pub fn fractions(&self) -> &[f64] {
        &self.fractions
    }

    /// `self × P`: the fraction of each behavior after one step.
    pub fn successor(&self, matrix: &mut ProbabilityMatrix<'_, BehaviorId>) -> StateResult<Self> {
        let mut next = vec![0.0; self.fractions.len()];
        for (i, &f) in self.fractions.iter().enumerate() {
            if f <= 0.0 {
                continue;
            }
            let row = matrix.row_of(&BehaviorId(i as u32))?;
            for (target, p) in row.iter() {
                if let Some(slot) = next.get_mut(target.index()) {
                    *slot += f * p;
                }
            }
        }
        Self::new(Arc::clone(&self.registry), next)
    }

    /// [`successor`](Self::successor) under the registry's matrix for `self`.
    pub fn successor_default(&self) -> StateResult<Self> {
        let registry = Arc::clone(&self.registry);
        let mut matrix = registry.agent_probability_matrix(self);
        self.successor(&mut matrix)
    }
}

impl PartialEq for PopulationFraction {
    fn eq(&self, other: &Self) -> bool {
        self.fractions.len() == other.fractions.len()
            && self.fractions.iter().zip(&other.fractions).all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

impl Eq for PopulationFraction {}

impl Hash for PopulationFraction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for f in &self.fractions {
            state.write_u64(f.to_bits());
        }
    }
}

impl PopulationView for PopulationFraction {
    fn behavior_count(&self) -> usize {
        self.fractions.len()
    }

    fn size(&self) -> f64 {
        f64::INFINITY
    }

    fn number_of(&self, behavior: BehaviorId) -> f64 {
        if self.fraction_of(behavior) > 0.0 { f64::INFINITY } else { 0.0 }
    }

    fn fraction_of(&self, behavior: BehaviorId) -> f64 {
        self.fractions.get(behavior.index()).copied().unwrap_or(0.0)
    }
}

impl CollectiveState for PopulationFraction {
    fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    fn step<R: Rng>(
        &self,
        _rng:   &mut R,
        matrix: &mut ProbabilityMatrix<'_, BehaviorId>,
    ) -> StateResult<Self> {
        self.successor(matrix)
    }

    fn next(&self, matrix: &mut ProbabilityMatrix<'_, BehaviorId>) -> StateResult<ProbabilityVector<Self>> {
        Ok(ProbabilityVector::dirac(self.successor(matrix)?))
    }
}
