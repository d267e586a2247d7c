//! `CountingState` — occupancy counts per behavior, no agent identity.

use std::sync::Arc;

use cas_agent::{AgentRegistry, PopulationView};
use cas_core::BehaviorId;
use cas_prob::{ProbabilityMatrix, ProbabilityVector};
use rand::Rng;

use crate::error::check_behavior;
use crate::{CollectiveState, StateError, StateResult};

#[derive(Clone, Debug)]
pub struct CountingState {
    registry:  Arc<AgentRegistry>,
    occupancy: Vec<u32>,
    size:      u64,
}

impl CountingState {
    /// State with the given occupancy, one entry per registered behavior.
    /// Every entry must fit in `0..=u32::MAX`.
    pub fn new(registry: Arc<AgentRegistry>, occupancy: &[i64]) -> StateResult<Self> {
        let expected = registry.behavior_count();
        if occupancy.len() != expected {
            return Err(StateError::OccupancyLength { expected, found: occupancy.len() });
        }
        let counts = occupancy
            .iter()
            .enumerate()
            .map(|(i, &n)| {
                u32::try_from(n).map_err(|_| {
                    StateError::InvalidArgument(format!("occupancy of behavior {i} is {n}"))
                })
            })
            .collect::<StateResult<Vec<_>>>()?;
        Ok(Self::from_counts(registry, counts))
    }

    /// State from `(behavior, count)` pairs; unlisted behaviors are empty.
    pub fn from_map<I>(registry: Arc<AgentRegistry>, counts: I) -> StateResult<Self>
    where
        I: IntoIterator<Item = (BehaviorId, u32)>,
    {
        let mut occupancy = vec![0u32; registry.behavior_count()];
        for (b, n) in counts {
            check_behavior(&registry, b)?;
            let slot = &mut occupancy[b.index()];
            *slot = slot.checked_add(n).ok_or_else(|| {
                StateError::InvalidArgument(format!("occupancy of {b} overflows u32"))
            })?;
        }
        Ok(Self::from_counts(registry, occupancy))
    }

    pub(crate) fn from_counts(registry: Arc<AgentRegistry>, occupancy: Vec<u32>) -> Self {
        let size = occupancy.iter().map(|&n| n as u64).sum();
        Self { registry, occupancy, size }
    }

    /// Population with no agents.
    pub fn empty(registry: Arc<AgentRegistry>) -> Self {
        let occupancy = vec![0; registry.behavior_count()];
        Self { registry, occupancy, size: 0 }
    }

    /// Copy of `self` with one more agent in `behavior`.
    pub fn add(&self, behavior: BehaviorId) -> Self {
        let mut next = self.clone();
        if let Some(n) = next.occupancy.get_mut(behavior.index()) {
            *n += 1;
            next.size += 1;
        }
        next
    }

    /// Copy of `self` with one agent fewer in `behavior`; unchanged when
    /// `behavior` is empty.
    pub fn remove(&self, behavior: BehaviorId) -> Self {
        let mut next = self.clone();
        if let Some(n) = next.occupancy.get_mut(behavior.index()) {
            if *n > 0 {
                *n -= 1;
                next.size -= 1;
            }
        }
        next
    }

    #[inline]
    pub fn occupancy(&self) -> &[u32] {
        &self.occupancy
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// `(behavior, count)` for every non-empty behavior.
    fn occupied(&self) -> impl Iterator<Item = (BehaviorId, u32)> + '_ {
        self.occupancy
            .iter()
            .enumerate()
            .filter(|&(_, &n)| n > 0)
            .map(|(i, &n)| (BehaviorId(i as u32), n))
    }
}

impl PartialEq for CountingState {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size && self.occupancy == other.occupancy
    }
}

impl Eq for CountingState {}

impl std::hash::Hash for CountingState {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.size.hash(state);
        self.occupancy.hash(state);
    }
}

impl PopulationView for CountingState {
    fn behavior_count(&self) -> usize {
        self.occupancy.len()
    }

    fn size(&self) -> f64 {
        self.size as f64
    }

    fn number_of(&self, behavior: BehaviorId) -> f64 {
        self.occupancy.get(behavior.index()).copied().unwrap_or(0) as f64
    }
}

impl CollectiveState for CountingState {
    fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    fn step<R: Rng>(
        &self,
        rng:    &mut R,
        matrix: &mut ProbabilityMatrix<'_, BehaviorId>,
    ) -> StateResult<Self> {
        let mut occupancy = vec![0u32; self.occupancy.len()];
        for (b, n) in self.occupied() {
            for _ in 0..n {
                let target = matrix.sample(rng, &b)?;
                if let Some(slot) = occupancy.get_mut(target.index()) {
                    *slot += 1;
                }
            }
        }
        Ok(Self::from_counts(Arc::clone(&self.registry), occupancy))
    }

    fn next(&self, matrix: &mut ProbabilityMatrix<'_, BehaviorId>) -> StateResult<ProbabilityVector<Self>> {
        let mut current = ProbabilityVector::dirac(Self::empty(Arc::clone(&self.registry)));
        for (b, n) in self.occupied() {
            let row = matrix.row_of(&b)?;
            for _ in 0..n {
                current = current.product(row, |s, &t| s.add(t))?;
            }
        }
        Ok(current)
    }
}
