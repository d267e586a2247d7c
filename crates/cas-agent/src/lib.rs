//! `cas-agent` — the agent registry.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                 |
//! |----------------|----------------------------------------------------------|
//! | [`name`]       | `AgentName` — family + integer indexes                   |
//! | [`behavior`]   | `Behavior`, `Action`                                     |
//! | [`registry`]   | `AgentRegistry`, `ActionProbabilityFn`                   |
//! | [`view`]       | `PopulationView` — read contract of every state          |
//! | [`measure`]    | `Measure` — named fraction / count observations          |
//! | [`error`]      | `RegistryError`, `RegistryResult<T>`                     |
//!
//! # Usage
//!
//! ```rust
//! use cas_agent::{AgentRegistry, PopulationView};
//!
//! let mut reg = AgentRegistry::new();
//! let s = reg.add_agent("S", &[]).unwrap();
//! let i = reg.add_agent("I", &[]).unwrap();
//! let infect = reg.add_action("infect", move |v: &dyn PopulationView| 0.5 * v.fraction_of(i));
//! reg.add_transition(s, infect, i).unwrap();
//! assert_eq!(reg.behavior_count(), 2);
//! ```

pub mod behavior;
pub mod error;
pub mod measure;
pub mod name;
pub mod registry;
pub mod view;

#[cfg(test)]
mod tests;

pub use behavior::{Action, Behavior};
pub use error::{RegistryError, RegistryResult};
pub use measure::{Measure, MeasureKind};
pub use name::AgentName;
pub use registry::{ActionProbabilityFn, AgentRegistry};
pub use view::{behavior_ids, PopulationView};
