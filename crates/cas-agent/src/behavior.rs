//! Behaviors (agent states) and actions.

use cas_core::{ActionId, BehaviorId};
use cas_prob::{ProbResult, ProbabilityVector};

use crate::AgentName;

/// One discrete state an agent can occupy, with its outgoing transitions.
#[derive(Clone, Debug)]
pub struct Behavior {
    pub name:        AgentName,
    pub id:          BehaviorId,
    /// `(action, next behavior)` pairs in registration order.
    pub transitions: Vec<(ActionId, BehaviorId)>,
}

impl Behavior {
    pub(crate) fn new(name: AgentName, id: BehaviorId) -> Self {
        Self {
            name,
            id,
            transitions: Vec::new(),
        }
    }

    /// Successor distribution of this behavior given the per-action
    /// probabilities of the current step.
    ///
    /// Actions with non-positive probability are skipped; the residual mass
    /// stays on `self` (self-loop).
    pub fn probability_vector(&self, action_probabilities: &[f64]) -> ProbResult<ProbabilityVector<BehaviorId>> {
        let mut row = ProbabilityVector::new();
        for &(action, target) in &self.transitions {
            let p = action_probabilities.get(action.index()).copied().unwrap_or(0.0);
            if p > 0.0 {
                row.add(target, p)?;
            }
        }
        Ok(row.complete(self.id))
    }
}

/// A labelled transition.  Its probability function lives in the registry,
/// at offset `id`.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Action {
    pub name: String,
    pub id:   ActionId,
}
