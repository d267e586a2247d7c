use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegistryError {
    /// The same agent family was used with a different number of indexes.
    #[error("inconsistent number of indexes for agent {family}: expected {expected}, found {found}")]
    InconsistentArity {
        family:   String,
        expected: usize,
        found:    usize,
    },

    #[error("unknown agent {0}")]
    UnknownAgent(String),

    #[error("unknown action {0}")]
    UnknownAction(String),
}

pub type RegistryResult<T> = Result<T, RegistryError>;
