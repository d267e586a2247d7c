//! `ProbabilityMatrix` — a transition matrix materialised row by row.
//!
//! A simulation step usually touches only the rows of behaviors that are
//! currently occupied, so rows are computed on first access by a supplier
//! closure and memoised for the lifetime of the matrix.
//!
//! # Threading
//!
//! Row access takes `&mut self`: a matrix has a single owner.  Build one
//! matrix per simulation step per thread (no row is computed until it is
//! requested), or call [`prefetch`](ProbabilityMatrix::prefetch)
//! and share the populated matrix read-only through [`cached_row`].
//!
//! [`cached_row`]: ProbabilityMatrix::cached_row

use std::hash::Hash;

use rand::Rng;
use rustc_hash::FxHashMap;

use crate::{ProbResult, ProbabilityVector};

type RowSupplier<'a, T> = Box<dyn Fn(&T) -> ProbResult<ProbabilityVector<T>> + 'a>;

pub struct ProbabilityMatrix<'a, T: Eq + Hash> {
    rows:     FxHashMap<T, ProbabilityVector<T>>,
    supplier: RowSupplier<'a, T>,
}

impl<'a, T: Eq + Hash + Clone> ProbabilityMatrix<'a, T> {
    pub fn new<F>(supplier: F) -> Self
    where
        F: Fn(&T) -> ProbResult<ProbabilityVector<T>> + 'a,
    {
        Self {
            rows:     FxHashMap::default(),
            supplier: Box::new(supplier),
        }
    }

    /// Row of `source`, computing it on first access.
    pub fn row_of(&mut self, source: &T) -> ProbResult<&ProbabilityVector<T>> {
        if !self.rows.contains_key(source) {
            let row = (self.supplier)(source)?;
            self.rows.insert(source.clone(), row);
        }
        Ok(&self.rows[source])
    }

    /// Row of `source` if it has already been materialised.
    pub fn cached_row(&self, source: &T) -> Option<&ProbabilityVector<T>> {
        self.rows.get(source)
    }

    /// Materialise the rows of every key in `sources`.
    pub fn prefetch<'k, I>(&mut self, sources: I) -> ProbResult<()>
    where
        I: IntoIterator<Item = &'k T>,
        T: 'k,
    {
        for source in sources {
            self.row_of(source)?;
        }
        Ok(())
    }

    /// Successor of `source`; falls back to `source` itself when the row's
    /// mass does not cover the draw.
    pub fn sample<R: Rng>(&mut self, rng: &mut R, source: &T) -> ProbResult<T> {
        Ok(self.row_of(source)?.sample(rng, source))
    }

    /// Number of rows computed so far.
    pub fn materialized_rows(&self) -> usize {
        self.rows.len()
    }
}
