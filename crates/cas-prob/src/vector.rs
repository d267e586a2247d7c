//! `ProbabilityVector` — a sub-probability distribution over hashable
//! elements.
//!
//! The total mass is tracked incrementally and never exceeds
//! `1 + PROBABILITY_EPSILON`.  Vectors are treated as values once built:
//! `scale`, `complete`, `map`, `filter`, `apply` and `product` all return a
//! fresh vector and leave the receiver untouched.

use std::hash::Hash;

use cas_core::PROBABILITY_EPSILON;
use rand::Rng;
use rustc_hash::FxHashMap;

use crate::error::check_probability;
use crate::{ProbError, ProbResult};

#[derive(Clone, Debug)]
pub struct ProbabilityVector<T: Eq + Hash> {
    masses: FxHashMap<T, f64>,
    total:  f64,
}

impl<T: Eq + Hash> Default for ProbabilityVector<T> {
    fn default() -> Self {
        Self {
            masses: FxHashMap::default(),
            total:  0.0,
        }
    }
}

impl<T: Eq + Hash + Clone> ProbabilityVector<T> {
    /// Empty vector (total mass 0).
    pub fn new() -> Self {
        Self::default()
    }

    /// All the mass on `element`.
    pub fn dirac(element: T) -> Self {
        let mut masses = FxHashMap::default();
        masses.insert(element, 1.0);
        Self { masses, total: 1.0 }
    }

    /// Single entry vector with mass `p`.
    pub fn of(element: T, p: f64) -> ProbResult<Self> {
        let mut v = Self::new();
        v.add(element, p)?;
        Ok(v)
    }

    /// Build a vector from `(element, mass)` pairs, accumulating duplicates.
    pub fn from_entries<I>(entries: I) -> ProbResult<Self>
    where
        I: IntoIterator<Item = (T, f64)>,
    {
        let mut v = Self::new();
        for (element, p) in entries {
            v.add(element, p)?;
        }
        Ok(v)
    }

    /// Mass assigned to `element` (0 when absent).
    #[inline]
    pub fn probability(&self, element: &T) -> f64 {
        self.masses.get(element).copied().unwrap_or(0.0)
    }

    #[inline]
    pub fn total_probability(&self) -> f64 {
        self.total
    }

    /// Number of elements in the support.
    #[inline]
    pub fn len(&self) -> usize {
        self.masses.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.masses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&T, f64)> + '_ {
        self.masses.iter().map(|(t, &p)| (t, p))
    }

    /// Add mass `p` to `element`.
    ///
    /// Fails with [`ProbError::Overflow`] when either the element's mass or
    /// the vector total would exceed 1.0; the vector is unchanged on failure.
    pub fn add(&mut self, element: T, p: f64) -> ProbResult<()> {
        check_probability(p)?;
        let mass = self.probability(&element) + p;
        if mass > 1.0 + PROBABILITY_EPSILON {
            return Err(ProbError::Overflow { total: mass });
        }
        let total = self.total + p;
        if total > 1.0 + PROBABILITY_EPSILON {
            return Err(ProbError::Overflow { total });
        }
        if p > 0.0 {
            self.masses.insert(element, mass);
            self.total = total;
        }
        Ok(())
    }

    /// Add every entry of `other`.  Checked up front, so a failing call does
    /// not leave a half-merged vector behind.
    pub fn add_vector(&mut self, other: &ProbabilityVector<T>) -> ProbResult<()> {
        let total = self.total + other.total;
        if total > 1.0 + PROBABILITY_EPSILON {
            return Err(ProbError::Overflow { total });
        }
        for (t, p) in other.iter() {
            self.accumulate(t.clone(), p);
        }
        Ok(())
    }

    /// Every mass multiplied by `p`.
    pub fn scale(&self, p: f64) -> ProbResult<Self> {
        check_probability(p)?;
        Ok(Self {
            masses: self.masses.iter().map(|(t, &m)| (t.clone(), m * p)).collect(),
            total:  self.total * p,
        })
    }

    /// Close an incomplete vector by giving the residual mass `1 - total` to
    /// `default`.
    pub fn complete(&self, default: T) -> Self {
        if self.total >= 1.0 {
            return self.clone();
        }
        let mut completed = self.clone();
        let residual = 1.0 - self.total;
        *completed.masses.entry(default).or_insert(0.0) += residual;
        completed.total = 1.0;
        completed
    }

    /// Draw an element.
    ///
    /// Walks the entries in iteration order accumulating mass; if the uniform
    /// draw falls beyond the total mass (incomplete vector or rounding gap)
    /// `default` is returned.
    pub fn sample<R: Rng>(&self, rng: &mut R, default: &T) -> T {
        let mut d: f64 = rng.r#gen();
        if d < self.total {
            for (t, p) in self.iter() {
                if d < p {
                    return t.clone();
                }
                d -= p;
            }
        }
        default.clone()
    }

    /// Monadic bind: `Σ_t p(t) · f(t)`.
    ///
    /// Advances a whole distribution one step given a per-element transition
    /// function.
    pub fn apply<U, E, F>(&self, mut f: F) -> Result<ProbabilityVector<U>, E>
    where
        U: Eq + Hash + Clone,
        E: From<ProbError>,
        F: FnMut(&T) -> Result<ProbabilityVector<U>, E>,
    {
        let mut result = ProbabilityVector::new();
        for (t, p) in self.iter() {
            let image = f(t)?.scale(p)?;
            result.add_vector(&image)?;
        }
        Ok(result)
    }

    /// Joint distribution of two independent vectors, combined through `op`.
    ///
    /// Masses are multiplied as plain floating-point products; nothing is
    /// re-normalised.
    pub fn product<U, R, F>(
        &self,
        other: &ProbabilityVector<U>,
        mut op: F,
    ) -> ProbResult<ProbabilityVector<R>>
    where
        U: Eq + Hash + Clone,
        R: Eq + Hash + Clone,
        F: FnMut(&T, &U) -> R,
    {
        let mut result = ProbabilityVector::new();
        for (s, p1) in self.iter() {
            for (t, p2) in other.iter() {
                result.add(op(s, t), p1 * p2)?;
            }
        }
        Ok(result)
    }

    /// Push the distribution through `f`.  Total mass is preserved.
    pub fn map<U, F>(&self, mut f: F) -> ProbabilityVector<U>
    where
        U: Eq + Hash + Clone,
        F: FnMut(&T) -> U,
    {
        let mut result = ProbabilityVector::new();
        for (t, p) in self.iter() {
            result.accumulate(f(t), p);
        }
        result
    }

    /// Sub-vector restricted to elements satisfying `pred`.
    pub fn filter<F>(&self, mut pred: F) -> Self
    where
        F: FnMut(&T) -> bool,
    {
        let mut result = Self::new();
        for (t, p) in self.iter().filter(|&(t, _)| pred(t)) {
            result.accumulate(t.clone(), p);
        }
        result
    }

    /// Total mass of the elements satisfying `pred`.
    pub fn mass_where<F>(&self, mut pred: F) -> f64
    where
        F: FnMut(&T) -> bool,
    {
        self.iter().filter(|&(t, _)| pred(t)).map(|(_, p)| p).sum()
    }

    /// Expected value `Σ_t p(t) · f(t)`.
    pub fn expected<F>(&self, mut f: F) -> f64
    where
        F: FnMut(&T) -> f64,
    {
        self.iter().map(|(t, p)| f(t) * p).sum()
    }

    /// Unchecked insert for operations that cannot raise the total.
    fn accumulate(&mut self, element: T, p: f64) {
        if p > 0.0 {
            *self.masses.entry(element).or_insert(0.0) += p;
            self.total += p;
        }
    }
}
