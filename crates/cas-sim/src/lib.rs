//! `cas-sim` — local simulation driver for the rust_cas framework.
//!
//! # Step loop
//!
//! ```text
//! record measures at t = 0
//! for t in 0..config.steps:
//!   ① Matrix  — evaluate every action probability on the current state and
//!               build the lazy agent transition matrix.
//!   ② Step    — CollectiveState::step samples one successor per agent.
//!   ③ Record  — every `sample_interval` steps, evaluate the measures.
//! ```
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Runs replicas on Rayon's thread pool.                  |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use cas_core::SimConfig;
//! use cas_sim::{NoopObserver, SimBuilder};
//!
//! let initial = CountingState::new(registry, &[99, 1, 0])?;
//! let mut sim = SimBuilder::new(config, initial).build()?;
//! let trajectory = sim.run(&mut NoopObserver)?;
//! ```

pub mod builder;
pub mod error;
pub mod observer;
pub mod replicas;
pub mod sim;
pub mod trajectory;
pub mod transient;


pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver};
pub use replicas::{run_ids, run_replica, run_replicas};
pub use sim::Simulation;
pub use trajectory::{mean_trajectory, Sample, Trajectory};
pub use transient::{expected_measure, transient_distribution};
