//! `cas-state` — collective state representations.
//!
//! | Module          | Contents                                                   |
//! |-----------------|------------------------------------------------------------|
//! | [`state`]       | `CollectiveState` — step / next contract                   |
//! | [`individual`]  | `IndividualState` — ordered agents with identity           |
//! | [`counting`]    | `CountingState` — occupancy per behavior                   |
//! | [`fraction`]    | `PopulationFraction` — infinite-population fractions       |
//! | [`mixed`]       | `MixedState<S>` — tagged agent + rest of population        |
//! | [`trajectory`]  | `MeanFieldTrajectory`, `MeanFieldState`                    |
//! | [`error`]       | `StateError`, `StateResult<T>`                             |
//!
//! Every state holds an `Arc<AgentRegistry>` and reads action probabilities
//! through the registry's `PopulationView` contract, so one model definition
//! drives all representations.

pub mod counting;
pub mod error;
pub mod fraction;
pub mod individual;
pub mod mixed;
pub mod state;
pub mod trajectory;

#[cfg(test)]
mod tests;

pub use counting::CountingState;
pub use error::{StateError, StateResult};
pub use fraction::PopulationFraction;
pub use individual::IndividualState;
pub use mixed::MixedState;
pub use state::CollectiveState;
pub use trajectory::{MeanFieldState, MeanFieldTrajectory};
