//! Simulation run configuration.

use crate::{CasError, CasResult};

/// Top-level configuration for a batch of stochastic simulation runs.
///
/// Typically built by the application crate (or decoded from a client
/// request) and handed to the simulation driver or the network manager.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Discrete steps per trajectory.
    pub steps: u64,

    /// Job RNG seed.  The same seed always produces identical replicas.
    pub seed: u64,

    /// Number of independent replicas to run.
    pub replicas: u64,

    /// Record a sample every N steps.  1 = every step.
    pub sample_interval: u64,

    /// Worker thread count passed to Rayon.  `None` uses all logical cores.
    pub num_threads: Option<usize>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            steps:           100,
            seed:            0,
            replicas:        1,
            sample_interval: 1,
            num_threads:     None,
        }
    }
}

impl SimConfig {
    /// Reject configurations the driver cannot execute.
    pub fn validate(&self) -> CasResult<()> {
        if self.sample_interval == 0 {
            return Err(CasError::Config("sample_interval must be at least 1".into()));
        }
        if self.num_threads == Some(0) {
            return Err(CasError::Config("num_threads must be at least 1 when set".into()));
        }
        Ok(())
    }

    /// Number of samples a full trajectory records (step 0 included).
    pub fn samples_per_trajectory(&self) -> u64 {
        self.steps / self.sample_interval.max(1) + 1
    }
}
