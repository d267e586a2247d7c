use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProbError {
    #[error("probability {0} is outside [0, 1]")]
    InvalidProbability(f64),

    /// A mutation would push an entry or the whole vector above 1.0.  Always
    /// a modelling error in the supplied probability functions.
    #[error("probability mass {total} exceeds 1.0")]
    Overflow { total: f64 },
}

pub type ProbResult<T> = Result<T, ProbError>;

/// Reject values that are not a probability (NaN included).
#[inline]
pub(crate) fn check_probability(p: f64) -> ProbResult<()> {
    if (0.0..=1.0 + cas_core::PROBABILITY_EPSILON).contains(&p) {
        Ok(())
    } else {
        Err(ProbError::InvalidProbability(p))
    }
}
