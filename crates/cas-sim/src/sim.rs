//! The `Simulation` struct and its step loop.

use cas_agent::Measure;
use cas_core::{ReplicaId, SimConfig, SimRng};
use cas_state::CollectiveState;
use tracing::debug;

use crate::{SimObserver, SimResult, Trajectory};

/// One replica of a stochastic run.
///
/// Each step builds the registry's agent matrix for the current state and
/// draws a successor with [`CollectiveState::step`].  Measures are recorded
/// at time 0 and every `config.sample_interval` steps.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Simulation<S: CollectiveState> {
    pub config:   SimConfig,
    pub state:    S,
    /// Steps taken so far.
    pub time:     u64,
    pub rng:      SimRng,
    pub measures: Vec<Measure>,
    pub replica:  ReplicaId,
}

impl<S: CollectiveState> Simulation<S> {
    // ── Public API ────────────────────────────────────────────────────────

    /// Run from the current time to `config.steps` and return the recorded
    /// trajectory.
    pub fn run<O: SimObserver<S>>(&mut self, observer: &mut O) -> SimResult<Trajectory> {
        debug!(replica = %self.replica, steps = self.config.steps, "simulation started");
        let names = self.measures.iter().map(|m| m.name.clone()).collect();
        let mut trajectory = Trajectory::new(self.replica, names);
        trajectory.push(self.time, self.observe());

        while self.time < self.config.steps {
            let now = self.time;
            observer.on_step_start(now, &self.state);
            self.step()?;
            observer.on_step_end(now, &self.state);
            if self.time.is_multiple_of(self.config.sample_interval) {
                trajectory.push(self.time, self.observe());
            }
        }

        observer.on_sim_end(self.time, &self.state);
        debug!(replica = %self.replica, samples = trajectory.len(), "simulation finished");
        Ok(trajectory)
    }

    /// Advance exactly one step (ignores `config.steps`).
    pub fn step(&mut self) -> SimResult<()> {
        self.state = self.state.step_default(&mut self.rng)?;
        self.time += 1;
        Ok(())
    }

    /// Current value of every measure.
    pub fn observe(&self) -> Vec<f64> {
        self.measures.iter().map(|m| m.evaluate(&self.state)).collect()
    }
}
