//! `PopulationView` — the read contract every collective state exposes.
//!
//! Action probability functions only ever see a state through this trait, so
//! one model definition drives every state representation.

use cas_core::BehaviorId;

pub trait PopulationView {
    /// Number of behaviors the view is indexed by (the registry size).
    fn behavior_count(&self) -> usize;

    /// Population size.  `f64::INFINITY` for fluid (fraction) states.
    fn size(&self) -> f64;

    /// Number of agents currently showing `behavior`.
    fn number_of(&self, behavior: BehaviorId) -> f64;

    /// Fraction of the population showing `behavior`; 0 for an empty population.
    fn fraction_of(&self, behavior: BehaviorId) -> f64 {
        let size = self.size();
        if size == 0.0 {
            0.0
        } else {
            self.number_of(behavior) / size
        }
    }

    fn number_where(&self, pred: &dyn Fn(BehaviorId) -> bool) -> f64 {
        behavior_ids(self.behavior_count())
            .filter(|&b| pred(b))
            .map(|b| self.number_of(b))
            .sum()
    }

    fn fraction_where(&self, pred: &dyn Fn(BehaviorId) -> bool) -> f64 {
        behavior_ids(self.behavior_count())
            .filter(|&b| pred(b))
            .map(|b| self.fraction_of(b))
            .sum()
    }
}

/// Every `BehaviorId` below `count`.
pub fn behavior_ids(count: usize) -> impl Iterator<Item = BehaviorId> {
    (0..count as u32).map(BehaviorId)
}
