//! Recorded measure values of one simulation run.

use cas_core::ReplicaId;
use serde::{Deserialize, Serialize};

/// Measure values observed at one time step, in `Trajectory::measures` order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time:   u64,
    pub values: Vec<f64>,
}

/// One sampled run.  Serializable so workers can ship it back to the master.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub replica:  ReplicaId,
    /// Measure names, one per column of every sample.
    pub measures: Vec<String>,
    pub samples:  Vec<Sample>,
}

impl Trajectory {
    pub fn new(replica: ReplicaId, measures: Vec<String>) -> Self {
        Self { replica, measures, samples: Vec::new() }
    }

    pub fn push(&mut self, time: u64, values: Vec<f64>) {
        self.samples.push(Sample { time, values });
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Values of measure `name` over time.
    pub fn series(&self, name: &str) -> Option<Vec<f64>> {
        let column = self.measures.iter().position(|m| m == name)?;
        Some(self.samples.iter().map(|s| s.values.get(column).copied().unwrap_or(f64::NAN)).collect())
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }
}

/// Point-wise mean of trajectories that share measures and sample times.
///
/// Returns `None` for an empty slice or when the trajectories don't line up.
pub fn mean_trajectory(trajectories: &[Trajectory]) -> Option<Vec<Sample>> {
    let first = trajectories.first()?;
    let aligned = trajectories.iter().all(|t| {
        t.measures == first.measures
            && t.samples.len() == first.samples.len()
            && t.samples.iter().zip(&first.samples).all(|(a, b)| a.time == b.time)
    });
    if !aligned {
        return None;
    }

    let n = trajectories.len() as f64;
    let mean = first
        .samples
        .iter()
        .enumerate()
        .map(|(k, sample)| {
            let mut values = vec![0.0; sample.values.len()];
            for t in trajectories {
                for (acc, v) in values.iter_mut().zip(&t.samples[k].values) {
                    *acc += v;
                }
            }
            values.iter_mut().for_each(|v| *v /= n);
            Sample { time: sample.time, values }
        })
        .collect();
    Some(mean)
}
