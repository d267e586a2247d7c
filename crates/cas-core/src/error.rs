//! Framework error type.
//!
//! Sub-crates define their own error enums (`ProbError`, `RegistryError`,
//! `StateError`, `SimError`, `NetError`); `CasError` covers the few failures
//! that belong to no particular layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CasError {
    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for `cas-core`.
pub type CasResult<T> = Result<T, CasError>;
