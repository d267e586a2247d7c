//! `ProbabilityFunction` — per-element probabilities with no constraint on
//! their sum.
//!
//! Where a [`ProbabilityVector`] is a distribution over *exclusive* outcomes,
//! a probability function assigns each element an independent probability
//! (e.g. "the chance that behavior `b` is occupied after k steps").  Only the
//! per-element bound `p ≤ 1` is enforced.

use std::hash::Hash;

use cas_core::PROBABILITY_EPSILON;
use rustc_hash::FxHashMap;

use crate::error::check_probability;
use crate::{ProbError, ProbResult, ProbabilityVector};

#[derive(Clone, Debug, PartialEq)]
pub struct ProbabilityFunction<T: Eq + Hash> {
    values: FxHashMap<T, f64>,
}

impl<T: Eq + Hash> Default for ProbabilityFunction<T> {
    fn default() -> Self {
        Self { values: FxHashMap::default() }
    }
}

impl<T: Eq + Hash + Clone> ProbabilityFunction<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of(element: T, p: f64) -> ProbResult<Self> {
        let mut f = Self::new();
        f.add(element, p)?;
        Ok(f)
    }

    #[inline]
    pub fn probability(&self, element: &T) -> f64 {
        self.values.get(element).copied().unwrap_or(0.0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&T, f64)> + '_ {
        self.values.iter().map(|(t, &p)| (t, p))
    }

    /// Increase the probability of `element` by `p`; the result must stay a
    /// probability.
    pub fn add(&mut self, element: T, p: f64) -> ProbResult<()> {
        let value = self.probability(&element) + p;
        if value < 0.0 || value.is_nan() {
            return Err(ProbError::InvalidProbability(value));
        }
        if value > 1.0 + PROBABILITY_EPSILON {
            return Err(ProbError::Overflow { total: value });
        }
        self.values.insert(element, value);
        Ok(())
    }

    /// Pointwise sum.  Stops at the first element that would exceed 1.
    pub fn add_function(&mut self, other: &ProbabilityFunction<T>) -> ProbResult<()> {
        for (t, p) in other.iter() {
            self.add(t.clone(), p)?;
        }
        Ok(())
    }

    pub fn scale(&self, p: f64) -> ProbResult<Self> {
        check_probability(p)?;
        Ok(Self {
            values: self.values.iter().map(|(t, &v)| (t.clone(), v * p)).collect(),
        })
    }

    /// `Σ_t f(t) · g(t)` accumulated pointwise.
    pub fn apply<U, E, G>(&self, mut g: G) -> Result<ProbabilityFunction<U>, E>
    where
        U: Eq + Hash + Clone,
        E: From<ProbError>,
        G: FnMut(&T) -> Result<ProbabilityFunction<U>, E>,
    {
        let mut result = ProbabilityFunction::new();
        for (t, p) in self.iter() {
            result.add_function(&g(t)?.scale(p)?)?;
        }
        Ok(result)
    }

    /// Push the values through `f` into a distribution.  Fails when the
    /// values do not form a sub-probability.
    pub fn map<U, F>(&self, mut f: F) -> ProbResult<ProbabilityVector<U>>
    where
        U: Eq + Hash + Clone,
        F: FnMut(&T) -> U,
    {
        let mut result = ProbabilityVector::new();
        for (t, p) in self.iter() {
            result.add(f(t), p)?;
        }
        Ok(result)
    }

    pub fn filter<F>(&self, mut pred: F) -> ProbResult<ProbabilityVector<T>>
    where
        F: FnMut(&T) -> bool,
    {
        let mut result = ProbabilityVector::new();
        for (t, p) in self.iter().filter(|&(t, _)| pred(t)) {
            result.add(t.clone(), p)?;
        }
        Ok(result)
    }

    pub fn mass_where<F>(&self, mut pred: F) -> f64
    where
        F: FnMut(&T) -> bool,
    {
        self.iter().filter(|&(t, _)| pred(t)).map(|(_, p)| p).sum()
    }

    pub fn expected<F>(&self, mut f: F) -> f64
    where
        F: FnMut(&T) -> f64,
    {
        self.iter().map(|(t, p)| f(t) * p).sum()
    }
}
