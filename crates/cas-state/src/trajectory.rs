//! `MeanFieldTrajectory` — lazily extended fluid trajectory.
//!
//! Entry `k + 1` is entry `k` multiplied by the agent matrix evaluated at
//! entry `k`.  Entries are appended on demand and never recomputed; the
//! cache is shared between [`MeanFieldState`]s through an `Arc`.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use cas_agent::{AgentRegistry, PopulationView};
use cas_core::BehaviorId;
use cas_prob::{ProbabilityMatrix, ProbabilityVector};
use parking_lot::Mutex;
use rand::Rng;

use crate::{CollectiveState, PopulationFraction, StateResult};

#[derive(Debug)]
pub struct MeanFieldTrajectory {
    registry: Arc<AgentRegistry>,
    /// Never empty: index 0 is the initial fraction.
    steps:    Mutex<Vec<PopulationFraction>>,
}

impl MeanFieldTrajectory {
    pub fn new(initial: PopulationFraction) -> Self {
        Self {
            registry: Arc::clone(initial.registry()),
            steps:    Mutex::new(vec![initial]),
        }
    }

    #[inline]
    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    /// Fraction at time `step`, extending the cache as needed.
    pub fn get(&self, step: usize) -> StateResult<PopulationFraction> {
        // The lock is held while the registry's probability functions run;
        // they must not read this trajectory or `get` deadlocks.
        let mut steps = self.steps.lock();
        if step < steps.len() {
            return Ok(steps[step].clone());
        }
        let mut last = steps[steps.len() - 1].clone();
        while steps.len() <= step {
            last = last.successor_default()?;
            steps.push(last.clone());
        }
        Ok(last)
    }

    /// Number of cached steps.
    pub fn len(&self) -> usize {
        self.steps.lock().len()
    }

    /// Always false: the initial fraction is cached at construction.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn initial(&self) -> PopulationFraction {
        self.steps.lock()[0].clone()
    }
}

/// A time index into a shared [`MeanFieldTrajectory`].
///
/// Two states are equal when they point into the same trajectory at the
/// same step.
#[derive(Clone, Debug)]
pub struct MeanFieldState {
    trajectory: Arc<MeanFieldTrajectory>,
    step:       usize,
    fraction:   PopulationFraction,
}

impl MeanFieldState {
    pub fn new(trajectory: Arc<MeanFieldTrajectory>, step: usize) -> StateResult<Self> {
        let fraction = trajectory.get(step)?;
        Ok(Self { trajectory, step, fraction })
    }

    /// State at time 0 of `trajectory`.
    pub fn start(trajectory: Arc<MeanFieldTrajectory>) -> Self {
        let fraction = trajectory.initial();
        Self { trajectory, step: 0, fraction }
    }

    #[inline]
    pub fn time(&self) -> usize {
        self.step
    }

    #[inline]
    pub fn fraction(&self) -> &PopulationFraction {
        &self.fraction
    }

    #[inline]
    pub fn trajectory(&self) -> &Arc<MeanFieldTrajectory> {
        &self.trajectory
    }

    fn advance(&self) -> StateResult<Self> {
        Self::new(Arc::clone(&self.trajectory), self.step + 1)
    }
}

impl PartialEq for MeanFieldState {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.trajectory, &other.trajectory) && self.step == other.step
    }
}

impl Eq for MeanFieldState {}

impl Hash for MeanFieldState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.trajectory) as usize).hash(state);
        self.step.hash(state);
    }
}

impl PopulationView for MeanFieldState {
    fn behavior_count(&self) -> usize {
        self.fraction.behavior_count()
    }

    fn size(&self) -> f64 {
        self.fraction.size()
    }

    fn number_of(&self, behavior: BehaviorId) -> f64 {
        self.fraction.number_of(behavior)
    }

    fn fraction_of(&self, behavior: BehaviorId) -> f64 {
        self.fraction.fraction_of(behavior)
    }
}

/// The trajectory fixes the dynamics, so the matrix argument is not read.
impl CollectiveState for MeanFieldState {
    fn registry(&self) -> &Arc<AgentRegistry> {
        self.trajectory.registry()
    }

    fn step<R: Rng>(
        &self,
        _rng:    &mut R,
        _matrix: &mut ProbabilityMatrix<'_, BehaviorId>,
    ) -> StateResult<Self> {
        self.advance()
    }

    fn next(&self, _matrix: &mut ProbabilityMatrix<'_, BehaviorId>) -> StateResult<ProbabilityVector<Self>> {
        Ok(ProbabilityVector::dirac(self.advance()?))
    }
}
