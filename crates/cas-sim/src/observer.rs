//! Simulation observer trait for progress reporting and data collection.

/// Callbacks invoked by [`Simulation::run`][crate::Simulation::run] around
/// every step.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example: infection peak tracker
///
/// ```rust,ignore
/// struct Peak { infected: BehaviorId, max: f64 }
///
/// impl<S: PopulationView> SimObserver<S> for Peak {
///     fn on_step_end(&mut self, _time: u64, state: &S) {
///         self.max = self.max.max(state.fraction_of(self.infected));
///     }
/// }
/// ```
pub trait SimObserver<S> {
    /// Called before step `time` is taken; `state` is the state at `time`.
    fn on_step_start(&mut self, _time: u64, _state: &S) {}

    /// Called after the step; `state` is the state at `time + 1`.
    fn on_step_end(&mut self, _time: u64, _state: &S) {}

    /// Called once after the final step.
    fn on_sim_end(&mut self, _final_time: u64, _state: &S) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl<S> SimObserver<S> for NoopObserver {}
