//! `MasterState` — what one master process knows.

use std::collections::BTreeMap;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::{JobId, SimulationEvent, SimulationState};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MasterState {
    pub address:     String,
    pub started:     SystemTime,
    /// Known workers and whether they announced themselves since the last
    /// keep-alive reset.
    workers:         BTreeMap<String, bool>,
    simulations:     BTreeMap<JobId, SimulationState>,
    executed:        u64,
}

impl MasterState {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address:     address.into(),
            started:     SystemTime::now(),
            workers:     BTreeMap::new(),
            simulations: BTreeMap::new(),
            executed:    0,
        }
    }

    // ── Workers ───────────────────────────────────────────────────────────

    /// Register (or refresh) `worker`.  Returns true if it was unknown.
    pub fn add_worker(&mut self, worker: impl Into<String>) -> bool {
        self.workers.insert(worker.into(), true).is_none()
    }

    pub fn remove_worker(&mut self, worker: &str) -> bool {
        self.workers.remove(worker).is_some()
    }

    /// Known workers, in address order.
    pub fn workers(&self) -> Vec<String> {
        self.workers.keys().cloned().collect()
    }

    pub fn connected_workers(&self) -> usize {
        self.workers.len()
    }

    /// Start a keep-alive round: every worker must announce itself again.
    pub fn reset_keep_alive(&mut self) {
        self.workers.values_mut().for_each(|alive| *alive = false);
    }

    /// Drop workers silent since the last reset; returns them.
    pub fn clean_keep_alive(&mut self) -> Vec<String> {
        let silent: Vec<String> = self
            .workers
            .iter()
            .filter(|&(_, &alive)| !alive)
            .map(|(w, _)| w.clone())
            .collect();
        for w in &silent {
            self.workers.remove(w);
        }
        silent
    }

    // ── Simulations ───────────────────────────────────────────────────────

    pub fn simulations(&self) -> impl Iterator<Item = &SimulationState> {
        self.simulations.values()
    }

    pub fn simulation(&self, job: JobId) -> Option<&SimulationState> {
        self.simulations.get(&job)
    }

    #[inline]
    pub fn executed(&self) -> u64 {
        self.executed
    }

    /// Fold in one event from a running job.
    pub fn apply(&mut self, event: SimulationEvent) {
        match event {
            SimulationEvent::Updated(state) => {
                if !state.concluded {
                    self.simulations.insert(state.job, state);
                }
            }
            SimulationEvent::WorkerRemoved { worker, .. } => {
                self.remove_worker(&worker);
            }
            SimulationEvent::Concluded(job) => {
                self.simulations.remove(&job);
                self.executed += 1;
            }
        }
    }
}
