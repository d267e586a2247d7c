//! Named scalar observations of a population.

use cas_core::BehaviorId;

use crate::PopulationView;

/// What a [`Measure`] reads from the population.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeasureKind {
    Fraction(BehaviorId),
    Count(BehaviorId),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Measure {
    pub name: String,
    pub kind: MeasureKind,
}

impl Measure {
    pub fn fraction(name: impl Into<String>, behavior: BehaviorId) -> Self {
        Self { name: name.into(), kind: MeasureKind::Fraction(behavior) }
    }

    pub fn count(name: impl Into<String>, behavior: BehaviorId) -> Self {
        Self { name: name.into(), kind: MeasureKind::Count(behavior) }
    }

    pub fn evaluate(&self, view: &dyn PopulationView) -> f64 {
        match self.kind {
            MeasureKind::Fraction(b) => view.fraction_of(b),
            MeasureKind::Count(b) => view.number_of(b),
        }
    }
}
