//! `IndividualState` — an ordered population where every agent keeps its
//! identity.
//!
//! The exact `next` distribution is exponential in the number of agents;
//! use [`CountingState`](crate::CountingState) when identities don't matter.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use cas_agent::{AgentRegistry, PopulationView};
use cas_core::BehaviorId;
use cas_prob::{ProbResult, ProbabilityMatrix, ProbabilityVector};
use rand::Rng;
use rustc_hash::FxHasher;

use crate::error::check_behavior;
use crate::{CollectiveState, CountingState, StateResult};

#[derive(Clone, Debug)]
pub struct IndividualState {
    registry:     Arc<AgentRegistry>,
    agents:       Vec<BehaviorId>,
    /// Count per behavior; length == registry behavior count.
    multiplicity: Vec<u32>,
    hash:         u64,
}

impl IndividualState {
    /// State holding `agents` in order.  Every id must be registered.
    pub fn new(registry: Arc<AgentRegistry>, agents: Vec<BehaviorId>) -> StateResult<Self> {
        for &a in &agents {
            check_behavior(&registry, a)?;
        }
        let multiplicity = registry.multiplicity(&agents);
        let hash = agents.iter().fold(0, |h, &a| extend_hash(h, a));
        Ok(Self { registry, agents, multiplicity, hash })
    }

    /// Population with no agents.
    pub fn empty(registry: Arc<AgentRegistry>) -> Self {
        let multiplicity = vec![0; registry.behavior_count()];
        Self { registry, agents: Vec::new(), multiplicity, hash: 0 }
    }

    /// Copy of `self` with `agent` appended.
    pub fn push(&self, agent: BehaviorId) -> Self {
        let mut next = self.clone();
        next.agents.push(agent);
        if let Some(m) = next.multiplicity.get_mut(agent.index()) {
            *m += 1;
        }
        next.hash = extend_hash(self.hash, agent);
        next
    }

    #[inline]
    pub fn agents(&self) -> &[BehaviorId] {
        &self.agents
    }

    #[inline]
    pub fn multiplicity(&self) -> &[u32] {
        &self.multiplicity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Forget identities.
    pub fn to_counting(&self) -> CountingState {
        CountingState::from_counts(Arc::clone(&self.registry), self.multiplicity.clone())
    }
}

fn extend_hash(seed: u64, agent: BehaviorId) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write_u64(seed);
    hasher.write_u32(agent.0);
    hasher.finish()
}

impl PartialEq for IndividualState {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.agents == other.agents
    }
}

impl Eq for IndividualState {}

impl Hash for IndividualState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl PopulationView for IndividualState {
    fn behavior_count(&self) -> usize {
        self.multiplicity.len()
    }

    fn size(&self) -> f64 {
        self.agents.len() as f64
    }

    fn number_of(&self, behavior: BehaviorId) -> f64 {
        self.multiplicity.get(behavior.index()).copied().unwrap_or(0) as f64
    }
}

impl CollectiveState for IndividualState {
    fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    fn step<R: Rng>(
        &self,
        rng:    &mut R,
        matrix: &mut ProbabilityMatrix<'_, BehaviorId>,
    ) -> StateResult<Self> {
        let agents = self
            .agents
            .iter()
            .map(|a| matrix.sample(rng, a))
            .collect::<ProbResult<Vec<_>>>()?;
        Self::new(Arc::clone(&self.registry), agents)
    }

    fn next(&self, matrix: &mut ProbabilityMatrix<'_, BehaviorId>) -> StateResult<ProbabilityVector<Self>> {
        let mut current = ProbabilityVector::dirac(Self::empty(Arc::clone(&self.registry)));
        for a in &self.agents {
            let row = matrix.row_of(a)?;
            current = current.product(row, |s, &b| s.push(b))?;
        }
        Ok(current)
    }
}
