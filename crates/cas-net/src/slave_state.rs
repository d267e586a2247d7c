//! `SlaveState` — per-worker adaptive task window and RTT estimate.
//!
//! The window grows multiplicatively up to [`WINDOW_THRESHOLD`] and
//! additively after that; it is halved whenever a batch overruns the time
//! limit.  Round-trip times are smoothed the way TCP does (RFC 6298).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ManagerConfig;

/// Weight of a new sample in the smoothed RTT.
pub const RTT_ALPHA: f64 = 0.125;
/// Weight of a new deviation in the RTT variance.
pub const RTT_BETA: f64 = 0.25;
/// Above this window the growth is additive.
pub const WINDOW_THRESHOLD: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlaveStatus {
    Active,
    /// Missed a deadline; the liveness check has not concluded yet.
    TimedOut,
    /// Evicted for the rest of the job.
    Removed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlaveState {
    /// Address currently used to reach the worker.
    pub worker:       String,
    expected_tasks:   usize,
    actual_tasks:     usize,
    /// Seconds per task.
    sample_rtt:       f64,
    estimated_rtt:    f64,
    dev_rtt:          f64,
    running_time:     Duration,
    max_running_time: Duration,
    status:           SlaveStatus,
}

impl SlaveState {
    pub fn new(worker: impl Into<String>, max_running_time: Duration) -> Self {
        Self::with_expected_tasks(worker, 1, max_running_time)
    }

    /// State with a preset window; no round trip measured yet.
    pub fn with_expected_tasks(worker: impl Into<String>, window: usize, max_running_time: Duration) -> Self {
        Self {
            worker: worker.into(),
            expected_tasks: window.max(1),
            actual_tasks: 0,
            sample_rtt: 0.0,
            estimated_rtt: 0.0,
            dev_rtt: 0.0,
            running_time: Duration::ZERO,
            max_running_time,
            status: SlaveStatus::Active,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn expected_tasks(&self) -> usize {
        self.expected_tasks
    }

    #[inline]
    pub fn status(&self) -> SlaveStatus {
        self.status
    }

    #[inline]
    pub fn is_removed(&self) -> bool {
        self.status == SlaveStatus::Removed
    }

    #[inline]
    pub fn is_timed_out(&self) -> bool {
        self.status == SlaveStatus::TimedOut
    }

    /// Smoothed seconds per task.
    #[inline]
    pub fn estimated_rtt(&self) -> f64 {
        self.estimated_rtt
    }

    #[inline]
    pub fn dev_rtt(&self) -> f64 {
        self.dev_rtt
    }

    /// Duration of the last completed batch.
    #[inline]
    pub fn running_time(&self) -> Duration {
        self.running_time
    }

    /// True once a batch has completed.
    #[inline]
    pub fn has_sample(&self) -> bool {
        self.dev_rtt != 0.0
    }

    // ── Window ────────────────────────────────────────────────────────────

    /// Fold in a completed batch of `tasks` tasks that took `elapsed`.
    pub fn update(&mut self, elapsed: Duration, tasks: usize) {
        self.actual_tasks = tasks;
        self.running_time = elapsed;

        if self.has_sample() {
            if elapsed.as_secs_f64() >= self.time_limit_secs(self.expected_tasks) {
                self.halve_window();
            } else if self.expected_tasks < WINDOW_THRESHOLD {
                self.expected_tasks *= 2;
            } else {
                self.expected_tasks += 1;
            }
        } else {
            self.expected_tasks = 2;
        }

        if tasks == 0 {
            return;
        }
        self.sample_rtt = elapsed.as_secs_f64() / tasks as f64;
        self.estimated_rtt = RTT_ALPHA * self.sample_rtt + (1.0 - RTT_ALPHA) * self.estimated_rtt;
        self.dev_rtt = if self.dev_rtt == 0.0 {
            self.sample_rtt * 2.0
        } else {
            RTT_BETA * (self.sample_rtt - self.estimated_rtt).abs() + (1.0 - RTT_BETA) * self.dev_rtt
        };
    }

    /// Halve the window (floor 1).
    pub fn force_expired_time_limit(&mut self) {
        self.halve_window();
    }

    fn halve_window(&mut self) {
        self.expected_tasks = (self.expected_tasks / 2).max(1);
    }

    /// Estimated time to run the current window; past it the window is halved.
    pub fn time_limit(&self) -> Duration {
        secs_to_duration(self.time_limit_secs(self.expected_tasks))
    }

    fn time_limit_secs(&self, tasks: usize) -> f64 {
        tasks as f64 * (self.estimated_rtt + self.dev_rtt)
    }

    /// Whether `tasks` tasks are expected to finish within the running-time cap.
    pub fn can_complete(&self, tasks: usize) -> bool {
        self.time_limit_secs(tasks) < self.max_running_time.as_secs_f64()
    }

    /// How long to wait for the current window's results.
    ///
    /// Before the first sample this is `config.first_batch_timeout`; after
    /// that `w·estRTT + 4·w·devRTT`, never below `config.min_task_timeout`.
    pub fn timeout(&self, config: &ManagerConfig) -> Duration {
        if !self.has_sample() {
            return config.first_batch_timeout.max(config.min_task_timeout);
        }
        let w = self.expected_tasks as f64;
        let secs = w * self.estimated_rtt + w * 4.0 * self.dev_rtt;
        secs_to_duration(secs).max(config.min_task_timeout)
    }

    // ── Status ────────────────────────────────────────────────────────────

    pub fn timed_out(&mut self) {
        self.status = SlaveStatus::TimedOut;
    }

    /// The worker answered the liveness check at `worker`; it is active again.
    pub fn migrate(&mut self, worker: impl Into<String>) {
        self.worker = worker.into();
        self.status = SlaveStatus::Active;
    }

    pub fn remove(&mut self) {
        self.status = SlaveStatus::Removed;
    }
}

fn secs_to_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}
