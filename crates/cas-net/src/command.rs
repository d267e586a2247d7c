//! Wire vocabulary and the payloads that follow some commands.
//!
//! ```text
//! master → worker   INIT  JobSpec            ← INIT_RESPONSE
//! master → worker   TASK  TaskBatch          ← RESULTS  TaskOutcome
//! master → worker   PING                     ← PONG
//! master → worker   CLOSE_CONNECTION         ← CLOSE_CONNECTION
//! client → master   INIT  JobSpec            ← INIT_RESPONSE … DATA_RESPONSE  JobOutcome
//! ```

use std::fmt;

use cas_core::{ReplicaId, SimConfig};
use cas_sim::Trajectory;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    Init,
    Task,
    Results,
    Ping,
    Pong,
    InitResponse,
    DataResponse,
    CloseConnection,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init            => "INIT",
            Self::Task            => "TASK",
            Self::Results         => "RESULTS",
            Self::Ping            => "PING",
            Self::Pong            => "PONG",
            Self::InitResponse    => "INIT_RESPONSE",
            Self::DataResponse    => "DATA_RESPONSE",
            Self::CloseConnection => "CLOSE_CONNECTION",
        };
        f.write_str(name)
    }
}

/// Opaque model description.  Workers map `name` (and optionally
/// `payload`) to a compiled model; the master never looks inside.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub name:    String,
    pub payload: Vec<u8>,
}

impl ModelSpec {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), payload: Vec::new() }
    }
}

/// Everything a worker needs to run any replica of a job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    pub model:  ModelSpec,
    pub config: SimConfig,
}

/// Replicas assigned to one worker in one round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskBatch {
    pub replicas: Vec<ReplicaId>,
}

/// Payload following RESULTS.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TaskOutcome {
    /// One trajectory per replica of the batch.
    Completed(Vec<Trajectory>),
    /// The executor rejected the batch.  Running it again gives the same error.
    Failed(String),
}

/// Master-assigned job number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JobId({})", self.0)
    }
}
