use cas_core::CasError;
use cas_state::StateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] CasError),

    #[error("state error: {0}")]
    State(#[from] StateError),
}

pub type SimResult<T> = Result<T, SimError>;
