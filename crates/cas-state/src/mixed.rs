//! `MixedState` — one tagged agent followed inside a population.
//!
//! With a [`PopulationFraction`](crate::PopulationFraction) as the rest this
//! is the classic "one agent in the mean field" model: the rest evolves
//! deterministically while the tagged agent is sampled.

use std::sync::Arc;

use cas_agent::{AgentRegistry, PopulationView};
use cas_core::BehaviorId;
use cas_prob::{ProbabilityMatrix, ProbabilityVector};
use rand::Rng;

use crate::error::check_behavior;
use crate::{CollectiveState, StateResult};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MixedState<S> {
    agent: BehaviorId,
    rest:  S,
}

impl<S: CollectiveState> MixedState<S> {
    pub fn new(agent: BehaviorId, rest: S) -> StateResult<Self> {
        check_behavior(rest.registry(), agent)?;
        Ok(Self { agent, rest })
    }

    /// Behavior of the tagged agent.
    #[inline]
    pub fn agent(&self) -> BehaviorId {
        self.agent
    }

    #[inline]
    pub fn rest(&self) -> &S {
        &self.rest
    }
}

impl<S: CollectiveState> PopulationView for MixedState<S> {
    fn behavior_count(&self) -> usize {
        self.rest.behavior_count()
    }

    fn size(&self) -> f64 {
        self.rest.size() + 1.0
    }

    fn number_of(&self, behavior: BehaviorId) -> f64 {
        let tagged = if behavior == self.agent { 1.0 } else { 0.0 };
        self.rest.number_of(behavior) + tagged
    }

    /// A single agent is negligible against an infinite rest.
    fn fraction_of(&self, behavior: BehaviorId) -> f64 {
        if self.rest.size().is_infinite() {
            self.rest.fraction_of(behavior)
        } else {
            self.number_of(behavior) / self.size()
        }
    }
}

impl<S: CollectiveState> CollectiveState for MixedState<S> {
    fn registry(&self) -> &Arc<AgentRegistry> {
        self.rest.registry()
    }

    fn step<R: Rng>(
        &self,
        rng:    &mut R,
        matrix: &mut ProbabilityMatrix<'_, BehaviorId>,
    ) -> StateResult<Self> {
        let agent = matrix.sample(rng, &self.agent)?;
        let rest = self.rest.step(rng, matrix)?;
        Ok(Self { agent, rest })
    }

    fn next(&self, matrix: &mut ProbabilityMatrix<'_, BehaviorId>) -> StateResult<ProbabilityVector<Self>> {
        let rest = self.rest.next(matrix)?;
        let row = matrix.row_of(&self.agent)?;
        Ok(row.product(&rest, |&agent, r| Self { agent, rest: r.clone() })?)
    }
}
