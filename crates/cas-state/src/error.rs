use cas_agent::RegistryError;
use cas_prob::ProbError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StateError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Probability(#[from] ProbError),

    #[error("occupancy has {found} entries but the registry defines {expected} behaviors")]
    OccupancyLength { expected: usize, found: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type StateResult<T> = Result<T, StateError>;

/// `UnknownAgent` unless `id` is registered.
pub(crate) fn check_behavior(registry: &cas_agent::AgentRegistry, id: cas_core::BehaviorId) -> StateResult<()> {
    if id.index() < registry.behavior_count() {
        Ok(())
    } else {
        Err(RegistryError::UnknownAgent(id.to_string()).into())
    }
}
