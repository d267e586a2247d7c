//! `CollectiveState` — the step/next contract shared by every state
//! representation.

use std::hash::Hash;
use std::sync::Arc;

use cas_agent::{AgentRegistry, PopulationView};
use cas_core::BehaviorId;
use cas_prob::{ProbabilityMatrix, ProbabilityVector};
use rand::Rng;

use crate::StateResult;

/// A snapshot of how agents are distributed over behaviors.
///
/// States are immutable values: `step` and `next` build successors and never
/// touch the receiver.  The matrix passed in is the agent transition matrix
/// of the current step; rows are materialised on demand.
pub trait CollectiveState: PopulationView + Clone + Eq + Hash + Sized {
    fn registry(&self) -> &Arc<AgentRegistry>;

    /// Draw one successor by sampling every agent's row independently.
    fn step<R: Rng>(
        &self,
        rng:    &mut R,
        matrix: &mut ProbabilityMatrix<'_, BehaviorId>,
    ) -> StateResult<Self>;

    /// Exact one-step distribution over successor states.
    fn next(&self, matrix: &mut ProbabilityMatrix<'_, BehaviorId>) -> StateResult<ProbabilityVector<Self>>;

    /// [`step`](Self::step) under the registry's own matrix for this state.
    fn step_default<R: Rng>(&self, rng: &mut R) -> StateResult<Self> {
        let registry = Arc::clone(self.registry());
        let mut matrix = registry.agent_probability_matrix(self);
        self.step(rng, &mut matrix)
    }

    /// [`next`](Self::next) under the registry's own matrix for this state.
    fn next_default(&self) -> StateResult<ProbabilityVector<Self>> {
        let registry = Arc::clone(self.registry());
        let mut matrix = registry.agent_probability_matrix(self);
        self.next(&mut matrix)
    }
}
