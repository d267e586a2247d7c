//! Manager tuning knobs.

use std::time::Duration;

/// Timeouts and limits of the distributed manager.
#[derive(Clone, Debug, PartialEq)]
pub struct ManagerConfig {
    /// Timeout of a worker's first batch, before any round-trip sample exists.
    pub first_batch_timeout: Duration,

    /// Lower bound of every computed batch timeout.
    pub min_task_timeout: Duration,

    /// Budget for the liveness-check connection (connect + INIT + PING) after a timeout.
    pub ping_timeout: Duration,

    /// A window whose estimated completion time exceeds this is halved
    /// before dispatch.
    pub max_running_time: Duration,

    /// Largest accepted frame, in bytes.
    pub max_frame_len: usize,

    /// Dispatches a replica may use up before the job fails.
    pub max_task_attempts: u32,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            first_batch_timeout: Duration::from_secs(60),
            min_task_timeout:    Duration::from_secs(1),
            ping_timeout:        Duration::from_secs(5),
            max_running_time:    Duration::from_secs(3600),
            max_frame_len:       64 * 1024 * 1024,
            max_task_attempts:   3,
        }
    }
}
