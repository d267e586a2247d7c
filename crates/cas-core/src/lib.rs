//! `cas-core` — foundational types for the `rust_cas` framework.
//!
//! This crate is a dependency of every other `cas-*` crate.  It has no
//! `cas-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! | Module     | Contents                                        |
//! |------------|-------------------------------------------------|
//! | [`ids`]    | `BehaviorId`, `ActionId`, `ReplicaId`           |
//! | [`rng`]    | `SimRng`, `replica_seed`                        |
//! | [`config`] | `SimConfig`                                     |
//! | [`error`]  | `CasError`, `CasResult`                         |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                              |
//! |---------|-----------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to the id types.     |

pub mod config;
pub mod error;
pub mod ids;
pub mod rng;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::SimConfig;
pub use error::{CasError, CasResult};
pub use ids::{ActionId, BehaviorId, ReplicaId};
pub use rng::{replica_seed, SimRng};

/// Slack allowed on total probability mass before a container reports
/// overflow.  Products of floats summing to 1 land within a few ULPs of 1.0.
pub const PROBABILITY_EPSILON: f64 = 1e-9;
