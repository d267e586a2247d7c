//! `cas-prob` — probability containers.
//!
//! | Module       | Contents                                                   |
//! |--------------|------------------------------------------------------------|
//! | [`vector`]   | `ProbabilityVector<T>` — sub-distribution over outcomes    |
//! | [`function`] | `ProbabilityFunction<T>` — independent per-element values  |
//! | [`matrix`]   | `ProbabilityMatrix<T>` — lazily populated transition rows  |
//! | [`error`]    | `ProbError`, `ProbResult<T>`                               |
//!
//! Containers are single-writer values.  They are `Send` when their element
//! type is, but none of them synchronises internally.

pub mod error;
pub mod function;
pub mod matrix;
pub mod vector;


pub use error::{ProbError, ProbResult};
pub use function::ProbabilityFunction;
pub use matrix::ProbabilityMatrix;
pub use vector::ProbabilityVector;
