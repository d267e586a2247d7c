//! Fluent builder for constructing a [`Simulation`].

use cas_agent::{Measure, MeasureKind};
use cas_core::{ReplicaId, SimConfig, SimRng};
use cas_state::CollectiveState;

use crate::{SimError, SimResult, Simulation};

/// Fluent builder for [`Simulation<S>`].
///
/// # Optional inputs (have defaults)
///
/// | Method          | Default                                        |
/// |-----------------|------------------------------------------------|
/// | `.measures(v)`  | one `%name` fraction per registered behavior   |
/// | `.replica(id)`  | `ReplicaId(0)`                                 |
///
/// The RNG is derived from `config.seed` and the replica id, so a replica
/// produces the same trajectory wherever it runs.
pub struct SimBuilder<S: CollectiveState> {
    config:   SimConfig,
    initial:  S,
    measures: Option<Vec<Measure>>,
    replica:  ReplicaId,
}

impl<S: CollectiveState> SimBuilder<S> {
    pub fn new(config: SimConfig, initial: S) -> Self {
        Self {
            config,
            initial,
            measures: None,
            replica:  ReplicaId(0),
        }
    }

    /// Measures recorded at every sample.
    pub fn measures(mut self, measures: Vec<Measure>) -> Self {
        self.measures = Some(measures);
        self
    }

    pub fn replica(mut self, replica: ReplicaId) -> Self {
        self.replica = replica;
        self
    }

    /// Validate inputs and return a ready-to-run [`Simulation`].
    pub fn build(self) -> SimResult<Simulation<S>> {
        self.config.validate()?;

        let behaviors = self.initial.registry().behavior_count();
        let measures = match self.measures {
            Some(m) => {
                for measure in &m {
                    let (MeasureKind::Fraction(b) | MeasureKind::Count(b)) = measure.kind;
                    if b.index() >= behaviors {
                        return Err(SimError::Config(format!(
                            "measure {} reads unknown behavior {b}",
                            measure.name
                        )));
                    }
                }
                m
            }
            None => self.initial.registry().measures(),
        };

        Ok(Simulation {
            rng:     SimRng::for_replica(self.config.seed, self.replica),
            config:  self.config,
            state:   self.initial,
            time:    0,
            measures,
            replica: self.replica,
        })
    }
}
