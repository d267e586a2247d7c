//! Independent replicas of one configuration.

use cas_core::{ReplicaId, SimConfig};
use cas_state::CollectiveState;
use tracing::info;

use crate::{NoopObserver, SimBuilder, SimResult, Trajectory};

/// Run replica `replica` of `config` from `initial`.
///
/// Deterministic in `(config.seed, replica)`: the network manager relies on
/// this to reschedule lost replicas on another worker.
pub fn run_replica<S: CollectiveState>(
    config:  &SimConfig,
    initial: &S,
    replica: ReplicaId,
) -> SimResult<Trajectory> {
    SimBuilder::new(config.clone(), initial.clone())
        .replica(replica)
        .build()?
        .run(&mut NoopObserver)
}

/// Run `config.replicas` replicas, returned in replica order.
///
/// With the `parallel` feature replicas run on Rayon, on a dedicated pool
/// when `config.num_threads` is set.
pub fn run_replicas<S>(config: &SimConfig, initial: &S) -> SimResult<Vec<Trajectory>>
where
    S: CollectiveState + Send + Sync,
{
    config.validate()?;
    info!(replicas = config.replicas, steps = config.steps, "running replicas");
    run_ids(config, initial, (0..config.replicas).map(ReplicaId).collect())
}

/// Run the given replica ids, in order.
pub fn run_ids<S>(config: &SimConfig, initial: &S, ids: Vec<ReplicaId>) -> SimResult<Vec<Trajectory>>
where
    S: CollectiveState + Send + Sync,
{
    #[cfg(not(feature = "parallel"))]
    {
        ids.into_iter().map(|id| run_replica(config, initial, id)).collect()
    }

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        let run = || -> SimResult<Vec<Trajectory>> {
            ids.into_par_iter().map(|id| run_replica(config, initial, id)).collect()
        };
        match config.num_threads {
            Some(n) => rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| crate::SimError::Config(format!("thread pool: {e}")))?
                .install(run),
            None => run(),
        }
    }
}
