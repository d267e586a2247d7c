//! `SimulationState` — progress of one distributed job.
//!
//! The scheduler owns a [`SimulationTracker`] and is the only writer.  Every
//! mutation publishes a fresh snapshot on a `watch` channel and, when the
//! job belongs to a master, an event on the master's queue.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};

use crate::{JobId, SlaveState};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    pub job:             JobId,
    pub model:           String,
    pub started:         SystemTime,
    pub slaves:          Vec<SlaveState>,
    /// Workers with a batch in flight.
    pub running_workers: usize,
    pub pending_tasks:   usize,
    pub total_tasks:     usize,
    pub completed_tasks: usize,
    pub concluded:       bool,
}

impl SimulationState {
    pub fn new(job: JobId, model: impl Into<String>, workers: &[String], total_tasks: usize, config: &crate::ManagerConfig) -> Self {
        Self {
            job,
            model: model.into(),
            started: SystemTime::now(),
            slaves: workers
                .iter()
                .map(|w| SlaveState::new(w.clone(), config.max_running_time))
                .collect(),
            running_workers: 0,
            pending_tasks: total_tasks,
            total_tasks,
            completed_tasks: 0,
            concluded: false,
        }
    }

    /// Slaves not yet removed.
    pub fn live_slaves(&self) -> usize {
        self.slaves.iter().filter(|s| !s.is_removed()).count()
    }
}

/// What a job reports up to its master.
#[derive(Clone, Debug, PartialEq)]
pub enum SimulationEvent {
    Updated(SimulationState),
    WorkerRemoved { job: JobId, worker: String },
    Concluded(JobId),
}

pub struct SimulationTracker {
    state:     SimulationState,
    snapshots: watch::Sender<SimulationState>,
    events:    Option<mpsc::UnboundedSender<SimulationEvent>>,
}

impl SimulationTracker {
    pub fn new(state: SimulationState, events: Option<mpsc::UnboundedSender<SimulationEvent>>) -> Self {
        let (snapshots, _) = watch::channel(state.clone());
        let tracker = Self { state, snapshots, events };
        tracker.notify(SimulationEvent::Updated(tracker.state.clone()));
        tracker
    }

    #[inline]
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn subscribe(&self) -> watch::Receiver<SimulationState> {
        self.snapshots.subscribe()
    }

    pub fn slave(&self, slot: usize) -> Option<&SlaveState> {
        self.state.slaves.get(slot)
    }

    /// Apply `f` to slave `slot` and publish.
    pub fn update_slave<R>(&mut self, slot: usize, f: impl FnOnce(&mut SlaveState) -> R) -> Option<R> {
        let result = self.state.slaves.get_mut(slot).map(f);
        self.publish();
        result
    }

    /// Evict slave `slot` and tell the master.
    pub fn remove_slave(&mut self, slot: usize) {
        let Some(slave) = self.state.slaves.get_mut(slot) else { return };
        slave.remove();
        let worker = slave.worker.clone();
        self.notify(SimulationEvent::WorkerRemoved { job: self.state.job, worker });
        self.publish();
    }

    pub fn increase_running(&mut self) {
        self.state.running_workers += 1;
        self.publish();
    }

    pub fn decrease_running(&mut self) {
        self.state.running_workers = self.state.running_workers.saturating_sub(1);
        self.publish();
    }

    pub fn set_pending(&mut self, pending: usize) {
        self.state.pending_tasks = pending;
        self.publish();
    }

    pub fn add_completed(&mut self, tasks: usize) {
        self.state.completed_tasks += tasks;
        self.publish();
    }

    /// Mark the job concluded.  Returns false if it already was.
    pub fn conclude(&mut self) -> bool {
        if self.state.concluded {
            return false;
        }
        self.state.concluded = true;
        self.publish();
        self.notify(SimulationEvent::Concluded(self.state.job));
        true
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.state.clone());
        self.notify(SimulationEvent::Updated(self.state.clone()));
    }

    fn notify(&self, event: SimulationEvent) {
        if let Some(events) = &self.events {
            // Master gone: snapshots still go out on the watch channel.
            let _ = events.send(event);
        }
    }
}
