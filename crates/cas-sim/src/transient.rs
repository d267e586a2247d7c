//! Exact transient analysis by repeated `next`.

use cas_agent::Measure;
use cas_prob::ProbabilityVector;
use cas_state::{CollectiveState, StateError};

use crate::SimResult;

/// Exact distribution of the state after `steps` steps from `initial`.
///
/// The support can grow exponentially with the population for individual
/// states; prefer counting or fraction states for anything but small models.
pub fn transient_distribution<S: CollectiveState>(
    initial: &S,
    steps:   usize,
) -> SimResult<ProbabilityVector<S>> {
    let mut current = ProbabilityVector::dirac(initial.clone());
    for _ in 0..steps {
        current = current.apply::<S, StateError, _>(|s| s.next_default())?;
    }
    Ok(current)
}

/// Expected value of `measure` under `distribution`.
pub fn expected_measure<S: CollectiveState>(distribution: &ProbabilityVector<S>, measure: &Measure) -> f64 {
    distribution.expected(|s| measure.evaluate(s))
}
